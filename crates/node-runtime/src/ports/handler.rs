//! Connection handler port.

use std::time::Duration;

use crate::errors::HandlerError;

/// One transport worker accepting inference requests.
///
/// The node starts handlers in slot order, waits for each to report ready,
/// and terminates every one of them on shutdown whatever state it is in.
pub trait ConnectionHandler: Send + Sync {
    /// Slot number, for logs and errors.
    fn slot(&self) -> usize;

    /// Whether the worker is running.
    fn is_alive(&self) -> bool;

    /// Launch the worker. Does not wait for readiness.
    fn start(&self) -> Result<(), HandlerError>;

    /// Block until the worker is ready or `timeout` elapses (`None`: no
    /// limit). Returns whether it became ready; fails if the worker died
    /// first.
    fn wait_ready(&self, timeout: Option<Duration>) -> Result<bool, HandlerError>;

    /// Stop the worker. Safe on a never-started or already terminated
    /// handler.
    fn terminate(&self) -> Result<(), HandlerError>;

    /// Wait for the worker to exit after `terminate`.
    fn join(&self) -> Result<(), HandlerError>;
}
