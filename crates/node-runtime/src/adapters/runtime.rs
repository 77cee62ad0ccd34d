//! Idle execution engine.

use shared_types::Signal;
use tracing::info;

use crate::container::EngineConfig;
use crate::errors::EngineFault;
use crate::ports::ExecutionEngine;

/// Engine that reports ready and then idles until shut down.
pub struct LocalRuntime {
    ready: Signal,
    stop: Signal,
    num_blocks: usize,
    config: EngineConfig,
}

impl LocalRuntime {
    /// Runtime over `num_blocks` blocks.
    pub fn new(num_blocks: usize, config: EngineConfig) -> Self {
        Self {
            ready: Signal::new(),
            stop: Signal::new(),
            num_blocks,
            config,
        }
    }
}

impl ExecutionEngine for LocalRuntime {
    fn ready(&self) -> Signal {
        self.ready.clone()
    }

    fn run(&self) -> Result<(), EngineFault> {
        if self.stop.is_set() {
            return Ok(());
        }
        info!(
            "[runtime] Serving {} blocks on {} (batch {}..={})",
            self.num_blocks, self.config.device, self.config.min_batch_size, self.config.max_batch_size
        );
        self.ready.set();
        self.stop.wait(None);
        self.ready.clear();
        Ok(())
    }

    fn shutdown(&self) -> Result<(), EngineFault> {
        self.stop.set();
        Ok(())
    }
}
