//! # Node Runtime Library
//!
//! Lifecycle orchestration for a node that serves a contiguous range of
//! model blocks to a peer-to-peer swarm.
//!
//! A [`ShardNode`] owns a registry client, a lease announcer, a pool of
//! connection handlers and an execution engine. It brings them up in a
//! fixed order, raises a readiness signal once every handler is ready and
//! the engine is serving, and tears everything down in reverse when asked.
//!
//! ## Architectural Patterns
//!
//! - **Hexagonal Architecture**: the engine and handlers sit behind
//!   [`ports`]; the registry port lives in `sw-01-shard-announcer`
//! - **Dependency Injection**: a [`ComponentFactory`] builds every component,
//!   so the node never decides what backs a port
//! - **Soft State**: hosted blocks stay visible only while the announcer
//!   keeps renewing their leases
//!
//! ## Example
//!
//! ```rust,ignore
//! use node_runtime::{adapters::LocalComponents, NodeConfig, ShardNode, ShardSpec};
//!
//! let mut config = NodeConfig::default();
//! config.shard = ShardSpec::range("4:8");
//!
//! let node = ShardNode::create(&config, &LocalComponents::default())?;
//! node.start(true, None)?;
//! // ... serve ...
//! node.shutdown()?;
//! node.join()?;
//! ```

#![warn(missing_docs)]

pub mod adapters;
pub mod container;
pub mod errors;
pub mod node;
pub mod ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use container::{
    parse_block_range, BlockDtype, ComponentFactory, EngineConfig, HostedBlock, LeaseConfig,
    NodeComponents, NodeConfig, RegistryConfig, ResolvedConfig, ShardSpec, DEFAULT_PREFIX,
    HANDLERS_PER_BLOCK, MAX_HOSTED_BLOCKS,
};
pub use errors::{
    ConfigError, EngineFault, HandlerError, NodeError, ShutdownError, ShutdownFailure,
    ShutdownStep, StartupCause, StartupStep,
};
pub use node::{NodeState, ShardNode, NODE_THREAD_NAME, READINESS_THREAD_NAME};
pub use ports::{ConnectionHandler, ExecutionEngine};
