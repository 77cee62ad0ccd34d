//! Execution engine port.

use shared_types::Signal;

use crate::errors::EngineFault;

/// Batching and compute loop for the hosted blocks.
///
/// The engine sets its readiness signal once it can process batches. The
/// node follows that signal while serving and stops following it as soon
/// as shutdown is requested.
pub trait ExecutionEngine: Send + Sync {
    /// Readiness signal. Every call returns a handle onto the same flag.
    fn ready(&self) -> Signal;

    /// Run the main loop on the calling thread.
    ///
    /// Blocks until [`ExecutionEngine::shutdown`] is called (returns `Ok`)
    /// or an unrecoverable fault occurs. Must return promptly if shutdown
    /// was requested before `run` was entered.
    fn run(&self) -> Result<(), EngineFault>;

    /// Ask `run` to return. Idempotent.
    fn shutdown(&self) -> Result<(), EngineFault>;
}
