//! # Node Container
//!
//! Configuration and the components built from it.
//!
//! Components are constructed here and handed to the node unstarted; the
//! node alone decides when each one starts and stops.

pub mod components;
pub mod config;

pub use components::{ComponentFactory, HostedBlock, NodeComponents};
pub use config::{
    parse_block_range, BlockDtype, EngineConfig, LeaseConfig, NodeConfig, RegistryConfig,
    ResolvedConfig, ShardSpec, DEFAULT_PREFIX, HANDLERS_PER_BLOCK, MAX_HOSTED_BLOCKS,
};
