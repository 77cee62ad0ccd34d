//! # Node Components
//!
//! Everything a [`crate::ShardNode`] owns, built but not started.
//!
//! ## Build Order
//!
//! ```text
//! 1. Registry client      (bootstrap peers logged, not started)
//! 2. Hosted blocks        (one load per index, in index order)
//! 3. Execution engine     (over the loaded blocks)
//! 4. Connection handlers  (slots 0..num_handlers)
//! ```

use std::sync::Arc;

use shared_types::{BlockIndex, ModuleUid, SystemTimeSource, TimeSource};
use sw_01_shard_announcer::ShardRegistry;
use tracing::{info, instrument};

use crate::container::config::{EngineConfig, RegistryConfig, ResolvedConfig};
use crate::errors::NodeError;
use crate::ports::{ConnectionHandler, ExecutionEngine};

/// One loaded block, as the node reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedBlock {
    /// Registry key
    pub uid: ModuleUid,
    /// Position in the full model
    pub index: BlockIndex,
    /// Block implementation name, for logs
    pub kind: String,
    /// Trainable parameter count, for logs
    pub num_parameters: u64,
}

/// Builds the node's collaborators.
///
/// Implementations decide what backs each port: a DHT client and a real
/// runtime in production, in-process stand-ins for dry runs and tests.
pub trait ComponentFactory {
    /// Registry client, not yet started.
    fn registry(&self, config: &RegistryConfig) -> Result<Arc<dyn ShardRegistry>, NodeError>;

    /// Clock used to stamp announcement expirations.
    fn time_source(&self) -> Arc<dyn TimeSource> {
        Arc::new(SystemTimeSource)
    }

    /// Load the block at `index`, published as `uid`.
    fn load_block(
        &self,
        uid: &ModuleUid,
        index: BlockIndex,
        config: &EngineConfig,
    ) -> Result<HostedBlock, NodeError>;

    /// Execution engine over `blocks`, not yet running.
    fn engine(
        &self,
        blocks: &[HostedBlock],
        config: &EngineConfig,
    ) -> Result<Arc<dyn ExecutionEngine>, NodeError>;

    /// Connection handler for `slot`, not yet started.
    fn handler(
        &self,
        slot: usize,
        registry: &Arc<dyn ShardRegistry>,
        blocks: &[HostedBlock],
    ) -> Result<Arc<dyn ConnectionHandler>, NodeError>;
}

/// The node's collaborators.
pub struct NodeComponents {
    /// Registry client
    pub registry: Arc<dyn ShardRegistry>,
    /// Clock for lease stamps
    pub time: Arc<dyn TimeSource>,
    /// Hosted blocks in index order
    pub blocks: Vec<HostedBlock>,
    /// Execution engine
    pub engine: Arc<dyn ExecutionEngine>,
    /// Connection handlers in slot order
    pub handlers: Vec<Arc<dyn ConnectionHandler>>,
}

impl NodeComponents {
    /// Build every component for `config` through `factory`.
    #[instrument(name = "node_components", skip_all, fields(blocks = config.module_uids.len()))]
    pub fn build(config: &ResolvedConfig, factory: &dyn ComponentFactory) -> Result<Self, NodeError> {
        let registry = factory.registry(&config.registry)?;
        info!(
            "[registry] Client {} on {:?}, initial peers = {:?}",
            registry.node_id(),
            registry.visible_addresses(),
            config.registry.initial_peers
        );

        let blocks = config
            .block_range
            .clone()
            .zip(&config.module_uids)
            .map(|(index, uid)| factory.load_block(uid, index, &config.engine))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "[node] Engine on {} (dtype {}, batch {}..={}, cache {})",
            config.engine.device,
            config.engine.dtype,
            config.engine.min_batch_size,
            config.engine.max_batch_size,
            config
                .engine
                .cache_size_bytes
                .map_or_else(|| "default".to_string(), |b| format!("{b} bytes"))
        );
        let engine = factory.engine(&blocks, &config.engine)?;

        let handlers = (0..config.num_handlers)
            .map(|slot| factory.handler(slot, &registry, &blocks))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            registry,
            time: factory.time_source(),
            blocks,
            engine,
            handlers,
        })
    }

    /// Uids of the hosted blocks.
    pub fn module_uids(&self) -> Vec<ModuleUid> {
        self.blocks.iter().map(|b| b.uid.clone()).collect()
    }
}
