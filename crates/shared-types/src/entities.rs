//! # Core Domain Entities
//!
//! Identifiers shared by the announcer and the node runtime.
//!
//! ## Clusters
//!
//! - **Blocks**: `BlockIndex`, `ModuleUid`
//! - **Peers**: `NodeId`
//! - **Time**: `Timestamp` (registry time)

use std::fmt;
use std::ops::Add;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// CLUSTER A: BLOCKS
// =============================================================================

/// Position of a block (layer range) inside the served model.
pub type BlockIndex = u32;

/// Registry key of one hosted block, formatted as `"{prefix}.{index}"`.
///
/// Every peer announcing the same uid claims to serve the same block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleUid(String);

impl ModuleUid {
    /// Separator between the model prefix and the block index.
    pub const SEPARATOR: char = '.';

    /// Wrap an already formatted uid.
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// Build the uid of block `index` of the model identified by `prefix`.
    pub fn for_block(prefix: &str, index: BlockIndex) -> Self {
        Self(format!("{prefix}{}{index}", Self::SEPARATOR))
    }

    /// The raw uid string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Model prefix, if the uid has the `prefix.index` shape.
    pub fn prefix(&self) -> Option<&str> {
        self.0.rsplit_once(Self::SEPARATOR).map(|(prefix, _)| prefix)
    }

    /// Block index, if the uid has the `prefix.index` shape.
    pub fn block_index(&self) -> Option<BlockIndex> {
        self.0
            .rsplit_once(Self::SEPARATOR)
            .and_then(|(_, index)| index.parse().ok())
    }
}

impl fmt::Display for ModuleUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleUid {
    fn from(uid: &str) -> Self {
        Self::new(uid)
    }
}

impl From<String> for ModuleUid {
    fn from(uid: String) -> Self {
        Self(uid)
    }
}

// =============================================================================
// CLUSTER B: PEERS
// =============================================================================

/// Identity under which a node publishes its announcement records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generate a fresh random identity.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

// =============================================================================
// CLUSTER C: TIME
// =============================================================================

/// Registry time in milliseconds since the Unix epoch.
///
/// Peers compare expirations against their own clocks, so a timestamp is only
/// meaningful up to the registry's tolerated clock discrepancy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Create from milliseconds since the epoch.
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Create from whole seconds since the epoch.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Milliseconds since the epoch.
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Seconds since the epoch, with millisecond precision.
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// `self + duration`, clamped at the maximum representable time.
    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later.
    pub fn saturating_duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        self.saturating_add(rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.as_secs_f64())
    }
}
