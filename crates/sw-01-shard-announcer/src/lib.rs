//! # Shard Announcer (Subsystem 1)
//!
//! Makes a node's hosted blocks discoverable by keeping one soft-state
//! record per block in the shared registry.
//!
//! ## Lease Protocol
//!
//! Each record is `(module_uid, node_id, expire_at)`. The announcer writes
//! every record once when it starts and again every `update_period`, each
//! time pushing `expire_at` to `now + expiration`. There is no retraction:
//! when a node stops renewing, its records lapse on their own within one
//! expiration interval.
//!
//! ## Architecture
//!
//! - **Domain Layer:** [`LeasePolicy`], [`AnnouncerState`], error types
//! - **Ports Layer:** [`ShardRegistry`], the registry client contract
//! - **Service Layer:** [`ShardAnnouncer`], the renewal thread
//! - **Adapters Layer:** [`InMemoryRegistry`], an in-process registry with
//!   real expiration semantics
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use shared_types::{ModuleUid, NodeId, SystemTimeSource};
//! use sw_01_shard_announcer::{InMemoryRegistry, LeasePolicy, ShardAnnouncer, ShardRegistry};
//!
//! let registry = InMemoryRegistry::default();
//! let client = Arc::new(registry.client(NodeId::random()));
//! client.start().unwrap();
//!
//! let uids = vec![ModuleUid::for_block("bloom", 0)];
//! let announcer = ShardAnnouncer::new(
//!     uids.clone(),
//!     client.clone(),
//!     Arc::new(SystemTimeSource),
//!     LeasePolicy::default(),
//! );
//! announcer.start().unwrap();
//! assert_eq!(registry.live_nodes(&uids[0]), vec![client.node_id()]);
//!
//! announcer.stop();
//! announcer.join().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryRegistry, InMemoryRegistryClient};
pub use domain::{
    default_expiration, AnnouncerError, AnnouncerState, LeaseError, LeasePolicy, RegistryError,
    DEFAULT_UPDATE_PERIOD, MAX_REGISTRY_TIME_DISCREPANCY,
};
pub use metrics::{AnnouncerMetrics, AnnouncerStats};
pub use ports::ShardRegistry;
pub use service::{ShardAnnouncer, ANNOUNCER_THREAD_NAME};

/// Subsystem identifier
pub const SUBSYSTEM_ID: u8 = 1;
