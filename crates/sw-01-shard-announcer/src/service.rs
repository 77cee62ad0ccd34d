//! # Shard Announcer Service
//!
//! Keeps this node's shard records alive in the registry.
//!
//! `start` announces once on the caller's thread, so the records exist
//! before anything else in the node comes up, then hands renewal to a
//! background thread that re-announces every `update_period` until stopped.
//! The thread waits on a [`Signal`] rather than sleeping, so `stop` takes
//! effect immediately.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Mutex, RwLock};
use shared_types::{ModuleUid, Signal, TimeSource};
use swarm_telemetry::{log_event, metric_inc, metric_set, ANNOUNCED_MODULES, SHARD_ANNOUNCEMENTS};
use tracing::{debug, info, warn};

use crate::domain::{AnnouncerError, AnnouncerState, LeasePolicy, RegistryError};
use crate::metrics::{AnnouncerMetrics, AnnouncerStats};
use crate::ports::ShardRegistry;

/// Name of the renewal thread.
pub const ANNOUNCER_THREAD_NAME: &str = "shard-announcer";

/// Periodic lease renewal for a fixed set of module uids.
pub struct ShardAnnouncer {
    inner: Arc<AnnouncerInner>,
    state: RwLock<AnnouncerState>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct AnnouncerInner {
    uids: Arc<[ModuleUid]>,
    registry: Arc<dyn ShardRegistry>,
    time: Arc<dyn TimeSource>,
    lease: LeasePolicy,
    stop: Signal,
    metrics: AnnouncerMetrics,
}

impl AnnouncerInner {
    fn announce(&self) -> Result<(), RegistryError> {
        let expire_at = self.lease.expire_at(self.time.now());
        match self.registry.announce(&self.uids, expire_at) {
            Ok(()) => {
                self.metrics.record_success(expire_at);
                metric_inc!(SHARD_ANNOUNCEMENTS, &["ok"]);
                metric_set!(ANNOUNCED_MODULES, self.uids.len());
                debug!(
                    "[announcer] Announced {} modules until {}",
                    self.uids.len(),
                    expire_at
                );
                Ok(())
            }
            Err(e) => {
                self.metrics.record_failure();
                metric_inc!(SHARD_ANNOUNCEMENTS, &["failed"]);
                log_event!(
                    warn,
                    "announcer",
                    "Announcement failed, retrying next period",
                    error = %e,
                    transient = e.is_transient()
                );
                Err(e)
            }
        }
    }

    fn renew_until_stopped(&self) {
        let period = self.lease.update_period();
        while !self.stop.wait(Some(period)) {
            // Failures are already logged and counted; keep renewing.
            let _ = self.announce();
        }
        debug!("[announcer] Renewal loop exited");
    }
}

impl ShardAnnouncer {
    /// Announcer for `uids`, idle until [`ShardAnnouncer::start`].
    pub fn new(
        uids: impl Into<Arc<[ModuleUid]>>,
        registry: Arc<dyn ShardRegistry>,
        time: Arc<dyn TimeSource>,
        lease: LeasePolicy,
    ) -> Self {
        Self {
            inner: Arc::new(AnnouncerInner {
                uids: uids.into(),
                registry,
                time,
                lease,
                stop: Signal::new(),
                metrics: AnnouncerMetrics::new(),
            }),
            state: RwLock::new(AnnouncerState::Idle),
            worker: Mutex::new(None),
        }
    }

    /// Announce once, then renew on a background thread.
    ///
    /// A failed first announcement is logged and counted but does not fail
    /// `start`: the renewal loop retries it.
    pub fn start(&self) -> Result<(), AnnouncerError> {
        let mut worker = self.worker.lock();
        {
            let mut state = self.state.write();
            if !state.can_transition_to(AnnouncerState::Announcing) {
                return Err(AnnouncerError::AlreadyStarted(*state));
            }
            *state = AnnouncerState::Announcing;
        }

        info!(
            "[announcer] Announcing {} modules every {:?} (expiration {:?})",
            self.inner.uids.len(),
            self.inner.lease.update_period(),
            self.inner.lease.expiration()
        );
        // Failures are already logged and counted; the loop retries.
        let _ = self.inner.announce();

        let inner = Arc::clone(&self.inner);
        let handle = thread::Builder::new()
            .name(ANNOUNCER_THREAD_NAME.to_string())
            .spawn(move || inner.renew_until_stopped())
            .map_err(|e| {
                *self.state.write() = AnnouncerState::Stopped;
                AnnouncerError::Spawn(e)
            })?;
        *worker = Some(handle);
        Ok(())
    }

    /// Ask the renewal loop to exit. Idempotent; does not wait.
    pub fn stop(&self) {
        self.inner.stop.set();
        let mut state = self.state.write();
        if !state.is_stopped() {
            *state = AnnouncerState::Stopped;
            debug!("[announcer] Stop requested");
        }
    }

    /// Wait for the renewal thread to exit.
    ///
    /// Succeeds immediately if the announcer never started or was already
    /// joined. Refuses to block on a loop that was never told to stop.
    pub fn join(&self) -> Result<(), AnnouncerError> {
        let mut worker = self.worker.lock();
        let Some(handle) = worker.take() else {
            return Ok(());
        };
        if !self.inner.stop.is_set() && !handle.is_finished() {
            *worker = Some(handle);
            return Err(AnnouncerError::JoinWithoutStop);
        }
        handle.join().map_err(|_| AnnouncerError::Panicked)
    }

    /// Current state.
    pub fn state(&self) -> AnnouncerState {
        *self.state.read()
    }

    /// Uids being announced.
    pub fn uids(&self) -> &[ModuleUid] {
        &self.inner.uids
    }

    /// Lease timing in use.
    pub fn lease(&self) -> LeasePolicy {
        self.inner.lease
    }

    /// Counter snapshot.
    pub fn stats(&self) -> AnnouncerStats {
        self.inner.metrics.snapshot()
    }
}

impl Drop for ShardAnnouncer {
    fn drop(&mut self) {
        if self.worker.get_mut().is_some() {
            warn!("[announcer] Dropped while running, stopping renewal thread");
            self.stop();
            let _ = self.join();
        }
    }
}
