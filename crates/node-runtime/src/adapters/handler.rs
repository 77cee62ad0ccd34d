//! Thread-backed connection handler.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use shared_types::Signal;
use tracing::debug;

use crate::errors::HandlerError;
use crate::ports::ConnectionHandler;

/// Handler whose worker thread reports ready and waits to be terminated.
pub struct LocalConnectionHandler {
    slot: usize,
    ready: Signal,
    stop: Signal,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl LocalConnectionHandler {
    /// Handler for `slot`, not started.
    pub fn new(slot: usize) -> Self {
        Self {
            slot,
            ready: Signal::new(),
            stop: Signal::new(),
            worker: Mutex::new(None),
        }
    }

    fn worker_finished(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|handle| handle.is_finished())
    }
}

impl ConnectionHandler for LocalConnectionHandler {
    fn slot(&self) -> usize {
        self.slot
    }

    fn is_alive(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn start(&self) -> Result<(), HandlerError> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(HandlerError::StartFailed {
                slot: self.slot,
                reason: "already started".to_string(),
            });
        }
        let ready = self.ready.clone();
        let stop = self.stop.clone();
        let slot = self.slot;
        let handle = thread::Builder::new()
            .name(format!("conn-handler-{slot}"))
            .spawn(move || {
                if !stop.is_set() {
                    ready.set();
                    stop.wait(None);
                }
                ready.clear();
                debug!("[node] Connection handler {} exited", slot);
            })
            .map_err(|e| HandlerError::StartFailed {
                slot,
                reason: e.to_string(),
            })?;
        *worker = Some(handle);
        Ok(())
    }

    fn wait_ready(&self, timeout: Option<Duration>) -> Result<bool, HandlerError> {
        if self.ready.wait(timeout) {
            return Ok(true);
        }
        if self.worker_finished() {
            return Err(HandlerError::ExitedBeforeReady { slot: self.slot });
        }
        Ok(false)
    }

    fn terminate(&self) -> Result<(), HandlerError> {
        self.stop.set();
        self.ready.clear();
        Ok(())
    }

    fn join(&self) -> Result<(), HandlerError> {
        let handle = self.worker.lock().take();
        match handle {
            Some(handle) => handle
                .join()
                .map_err(|_| HandlerError::Panicked { slot: self.slot }),
            None => Ok(()),
        }
    }
}
