//! # Node Configuration
//!
//! Everything needed to build a [`crate::ShardNode`].
//!
//! ## Sources
//!
//! Later sources override earlier ones:
//!
//! 1. [`NodeConfig::default`]
//! 2. TOML file ([`NodeConfig::from_toml_file`])
//! 3. `SW_*` environment variables ([`NodeConfig::apply_env`])
//! 4. Command-line flags (binary only)
//!
//! A shard is given either as a block count (`num_blocks = 4` hosts
//! `0..4`) or as a half-open range (`block_indices = "2:6"`). Exactly one
//! form must be present once all sources are merged; a later source that
//! sets either form replaces the shard spec of earlier sources.

use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared_types::{BlockIndex, ModuleUid};
use sw_01_shard_announcer::DEFAULT_UPDATE_PERIOD;

use crate::errors::ConfigError;

/// Default module uid prefix.
pub const DEFAULT_PREFIX: &str = "bloom";

/// Connection handlers per hosted block when `num_handlers` is unset.
pub const HANDLERS_PER_BLOCK: usize = 4;

/// Most blocks one node may host.
pub const MAX_HOSTED_BLOCKS: u32 = 1024;

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// Module uid prefix; uids are `{prefix}.{block_index}`.
    pub prefix: String,
    /// Which blocks to host.
    pub shard: ShardSpec,
    /// Connection handler count (default: 4 per hosted block).
    pub num_handlers: Option<usize>,
    /// Announcement lease timing.
    pub lease: LeaseConfig,
    /// Registry client bootstrap.
    pub registry: RegistryConfig,
    /// Execution engine settings.
    pub engine: EngineConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            shard: ShardSpec::default(),
            num_handlers: None,
            lease: LeaseConfig::default(),
            registry: RegistryConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

/// Hosted block selection. Exactly one field must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShardSpec {
    /// Host blocks `0..num_blocks`.
    pub num_blocks: Option<BlockIndex>,
    /// Host blocks `start..end`, written `"start:end"`.
    pub block_indices: Option<String>,
}

impl ShardSpec {
    /// Host the first `n` blocks.
    pub fn count(n: BlockIndex) -> Self {
        Self {
            num_blocks: Some(n),
            block_indices: None,
        }
    }

    /// Host the blocks in `"start:end"`.
    pub fn range(indices: impl Into<String>) -> Self {
        Self {
            num_blocks: None,
            block_indices: Some(indices.into()),
        }
    }

    fn is_empty(&self) -> bool {
        self.num_blocks.is_none() && self.block_indices.is_none()
    }

    /// Replace `self` with `later` if `later` sets either form.
    pub fn override_with(&mut self, later: ShardSpec) {
        if !later.is_empty() {
            *self = later;
        }
    }

    /// The half-open block range this spec selects.
    pub fn resolve(&self) -> Result<Range<BlockIndex>, ConfigError> {
        let range = match (self.num_blocks, self.block_indices.as_deref()) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingShardSpec),
            (None, None) => return Err(ConfigError::MissingShardSpec),
            (Some(n), None) => 0..n,
            (None, Some(indices)) => parse_block_range(indices)?,
        };
        if range.start >= range.end {
            return Err(ConfigError::EmptyShard {
                start: range.start,
                end: range.end,
            });
        }
        if range.len() > MAX_HOSTED_BLOCKS as usize {
            return Err(ConfigError::ShardTooLarge {
                blocks: range.end - range.start,
                max: MAX_HOSTED_BLOCKS,
            });
        }
        Ok(range)
    }
}

/// Parse `"start:end"` (whitespace around either bound allowed).
pub fn parse_block_range(input: &str) -> Result<Range<BlockIndex>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBlockRange {
        input: input.to_string(),
        reason,
    };
    let (start, end) = input
        .split_once(':')
        .ok_or_else(|| invalid("missing ':'".to_string()))?;
    let parse = |bound: &str| {
        bound
            .trim()
            .parse::<BlockIndex>()
            .map_err(|e| invalid(format!("{:?}: {e}", bound.trim())))
    };
    Ok(parse(start)?..parse(end)?)
}

/// Lease timing, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeaseConfig {
    /// Seconds between renewals.
    pub update_period_secs: f64,
    /// Record lifetime in seconds (default: max(2 × period, registry skew)).
    pub expiration_secs: Option<f64>,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            update_period_secs: DEFAULT_UPDATE_PERIOD.as_secs_f64(),
            expiration_secs: None,
        }
    }
}

/// Registry client bootstrap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Peers to join the registry through; empty starts a new network.
    pub initial_peers: Vec<String>,
}

/// Numeric precision blocks are loaded in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockDtype {
    /// Whatever the checkpoint was saved in
    #[default]
    Auto,
    /// IEEE half precision
    Float16,
    /// Brain floating point
    Bfloat16,
    /// Single precision
    Float32,
}

impl BlockDtype {
    /// Config spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockDtype::Auto => "auto",
            BlockDtype::Float16 => "float16",
            BlockDtype::Bfloat16 => "bfloat16",
            BlockDtype::Float32 => "float32",
        }
    }
}

impl fmt::Display for BlockDtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockDtype {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(BlockDtype::Auto),
            "float16" => Ok(BlockDtype::Float16),
            "bfloat16" => Ok(BlockDtype::Bfloat16),
            "float32" => Ok(BlockDtype::Float32),
            _ => Err(ConfigError::UnknownDtype(s.to_string())),
        }
    }
}

/// Execution engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Smallest batch the engine forms.
    pub min_batch_size: usize,
    /// Largest batch the engine forms.
    pub max_batch_size: usize,
    /// Attention cache budget in bytes (engine default if unset).
    pub cache_size_bytes: Option<u64>,
    /// Compute device, e.g. `cpu` or `cuda:0`.
    pub device: String,
    /// Load precision.
    pub dtype: BlockDtype,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_batch_size: 1,
            max_batch_size: 4096,
            cache_size_bytes: None,
            device: "cpu".to_string(),
            dtype: BlockDtype::Auto,
        }
    }
}

impl EngineConfig {
    /// Check batch bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_batch_size == 0 || self.min_batch_size > self.max_batch_size {
            return Err(ConfigError::InvalidBatchBounds {
                min: self.min_batch_size,
                max: self.max_batch_size,
            });
        }
        Ok(())
    }
}

/// Validated configuration with derived values filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Module uid prefix.
    pub prefix: String,
    /// Hosted block range.
    pub block_range: Range<BlockIndex>,
    /// Uid for each hosted block, in index order.
    pub module_uids: Vec<ModuleUid>,
    /// Connection handler count.
    pub num_handlers: usize,
    /// Renewal period.
    pub update_period: Duration,
    /// Explicit expiration, if configured.
    pub expiration: Option<Duration>,
    /// Registry bootstrap.
    pub registry: RegistryConfig,
    /// Engine settings.
    pub engine: EngineConfig,
}

impl NodeConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply `SW_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `SW_*` overrides from `lookup`.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `SW_PREFIX` | `prefix` |
    /// | `SW_NUM_BLOCKS` | `shard.num_blocks` |
    /// | `SW_BLOCK_INDICES` | `shard.block_indices` |
    /// | `SW_NUM_HANDLERS` | `num_handlers` |
    /// | `SW_UPDATE_PERIOD` | `lease.update_period_secs` |
    /// | `SW_EXPIRATION` | `lease.expiration_secs` |
    /// | `SW_INITIAL_PEERS` | `registry.initial_peers` (comma separated) |
    /// | `SW_MIN_BATCH_SIZE` / `SW_MAX_BATCH_SIZE` | engine batch bounds |
    /// | `SW_CACHE_SIZE_BYTES` | `engine.cache_size_bytes` |
    /// | `SW_DEVICE` | `engine.device` |
    /// | `SW_DTYPE` | `engine.dtype` |
    pub fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        fn parsed<T: FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &'static str,
        ) -> Result<Option<T>, ConfigError> {
            lookup(key)
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidEnv { key, value })
                })
                .transpose()
        }

        if let Some(prefix) = lookup("SW_PREFIX") {
            self.prefix = prefix;
        }
        self.shard.override_with(ShardSpec {
            num_blocks: parsed(&lookup, "SW_NUM_BLOCKS")?,
            block_indices: lookup("SW_BLOCK_INDICES"),
        });
        if let Some(n) = parsed(&lookup, "SW_NUM_HANDLERS")? {
            self.num_handlers = Some(n);
        }
        if let Some(period) = parsed(&lookup, "SW_UPDATE_PERIOD")? {
            self.lease.update_period_secs = period;
        }
        if let Some(expiration) = parsed(&lookup, "SW_EXPIRATION")? {
            self.lease.expiration_secs = Some(expiration);
        }
        if let Some(peers) = lookup("SW_INITIAL_PEERS") {
            self.registry.initial_peers = peers
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(n) = parsed(&lookup, "SW_MIN_BATCH_SIZE")? {
            self.engine.min_batch_size = n;
        }
        if let Some(n) = parsed(&lookup, "SW_MAX_BATCH_SIZE")? {
            self.engine.max_batch_size = n;
        }
        if let Some(bytes) = parsed(&lookup, "SW_CACHE_SIZE_BYTES")? {
            self.engine.cache_size_bytes = Some(bytes);
        }
        if let Some(device) = lookup("SW_DEVICE") {
            self.engine.device = device;
        }
        if let Some(dtype) = lookup("SW_DTYPE") {
            self.engine.dtype = dtype.parse()?;
        }
        Ok(())
    }

    /// Validate and derive hosted uids, handler count and lease durations.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        if self.prefix.trim().is_empty() {
            return Err(ConfigError::InvalidPrefix(self.prefix.clone()));
        }
        let block_range = self.shard.resolve()?;
        let module_uids: Vec<ModuleUid> = block_range
            .clone()
            .map(|index| ModuleUid::for_block(&self.prefix, index))
            .collect();

        let num_handlers = match self.num_handlers {
            Some(0) => return Err(ConfigError::ZeroHandlers),
            Some(n) => n,
            None => module_uids.len() * HANDLERS_PER_BLOCK,
        };

        self.engine.validate()?;

        Ok(ResolvedConfig {
            prefix: self.prefix.clone(),
            block_range,
            module_uids,
            num_handlers,
            update_period: secs_to_duration("lease.update_period_secs", self.lease.update_period_secs)?,
            expiration: self
                .lease
                .expiration_secs
                .map(|secs| secs_to_duration("lease.expiration_secs", secs))
                .transpose()?,
            registry: self.registry.clone(),
            engine: self.engine.clone(),
        })
    }
}

fn secs_to_duration(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidDuration { field, value })
}
