//! Factory wiring the in-process adapters together.

use std::sync::Arc;

use shared_types::{BlockIndex, ModuleUid, NodeId, TimeSource};
use sw_01_shard_announcer::{InMemoryRegistry, ShardRegistry};
use tracing::{debug, warn};

use super::handler::LocalConnectionHandler;
use super::runtime::LocalRuntime;
use crate::container::{ComponentFactory, EngineConfig, HostedBlock, RegistryConfig};
use crate::errors::NodeError;
use crate::ports::{ConnectionHandler, ExecutionEngine};

/// Block kind reported for blocks that carry no weights.
pub const UNLOADED_BLOCK_KIND: &str = "UnloadedBlock";

/// Builds nodes whose registry clients share one [`InMemoryRegistry`].
#[derive(Clone, Default)]
pub struct LocalComponents {
    registry: InMemoryRegistry,
}

impl LocalComponents {
    /// Factory over `registry`. Every node built from it announces there.
    pub fn new(registry: InMemoryRegistry) -> Self {
        Self { registry }
    }

    /// The shared registry.
    pub fn shared_registry(&self) -> &InMemoryRegistry {
        &self.registry
    }
}

impl ComponentFactory for LocalComponents {
    fn registry(&self, config: &RegistryConfig) -> Result<Arc<dyn ShardRegistry>, NodeError> {
        if !config.initial_peers.is_empty() {
            warn!(
                "[registry] In-memory registry ignores {} initial peer(s)",
                config.initial_peers.len()
            );
        }
        let client: Arc<dyn ShardRegistry> = Arc::new(self.registry.client(NodeId::random()));
        Ok(client)
    }

    fn time_source(&self) -> Arc<dyn TimeSource> {
        self.registry.time_source()
    }

    fn load_block(
        &self,
        uid: &ModuleUid,
        index: BlockIndex,
        config: &EngineConfig,
    ) -> Result<HostedBlock, NodeError> {
        debug!("[node] Placeholder for block {} ({}) on {}", index, uid, config.device);
        Ok(HostedBlock {
            uid: uid.clone(),
            index,
            kind: UNLOADED_BLOCK_KIND.to_string(),
            num_parameters: 0,
        })
    }

    fn engine(
        &self,
        blocks: &[HostedBlock],
        config: &EngineConfig,
    ) -> Result<Arc<dyn ExecutionEngine>, NodeError> {
        let engine: Arc<dyn ExecutionEngine> = Arc::new(LocalRuntime::new(blocks.len(), config.clone()));
        Ok(engine)
    }

    fn handler(
        &self,
        slot: usize,
        _registry: &Arc<dyn ShardRegistry>,
        _blocks: &[HostedBlock],
    ) -> Result<Arc<dyn ConnectionHandler>, NodeError> {
        let handler: Arc<dyn ConnectionHandler> = Arc::new(LocalConnectionHandler::new(slot));
        Ok(handler)
    }
}
