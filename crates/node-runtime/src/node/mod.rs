//! # Shard Node
//!
//! Sequences a node's components through startup, serving and shutdown.
//!
//! ## Startup Sequence
//!
//! ```text
//! 1. Registry client live (started here if it is not already)
//! 2. Announcer started     (first announcement is synchronous)
//! 3. Handlers started      (each awaited in slot order)
//! 4. Engine main loop      (blocks; readiness follows the engine's own)
//! 5. Shutdown              (always, however step 1-4 ended)
//! ```
//!
//! ## Shutdown Sequence
//!
//! ```text
//! 0. Clear readiness       (before any component is touched)
//! 1. Terminate every handler, then join every handler
//! 2. Stop and join the announcer
//! 3. Stop the registry client
//! 4. Shut the engine down
//! ```
//!
//! Each shutdown step runs even if an earlier one failed; failures are
//! collected into one [`ShutdownError`].
//!
//! ## Readiness
//!
//! The node publishes its own readiness signal. While the engine runs, a
//! `node-readiness` thread copies the engine's signal onto it. Once shutdown
//! has been requested the copy is refused, so readiness stays false for the
//! whole teardown whatever the engine does.

mod lifecycle;

pub use lifecycle::NodeState;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use shared_types::{ModuleUid, NodeId, Signal};
use sw_01_shard_announcer::{AnnouncerStats, LeasePolicy, ShardAnnouncer, ShardRegistry};
use swarm_telemetry::{
    log_module_event, metric_inc, metric_set, HANDLERS_READY, NODE_READY, SHUTDOWN_STEP_FAILURES,
};
use tracing::{debug, error, info, instrument, warn};

use crate::container::{ComponentFactory, HostedBlock, NodeComponents, NodeConfig};
use crate::errors::{
    ConfigError, NodeError, ShutdownError, ShutdownFailure, ShutdownStep, StartupCause,
    StartupStep,
};
use crate::ports::{ConnectionHandler, ExecutionEngine};
use lifecycle::Lifecycle;

/// Name of the thread `start` spawns.
pub const NODE_THREAD_NAME: &str = "shard-node";

/// Name of the thread that mirrors engine readiness while serving.
pub const READINESS_THREAD_NAME: &str = "node-readiness";

/// Longest single wait while polling readiness, so that shutdown requests
/// and an early exit of the node thread are noticed.
const READINESS_POLL: Duration = Duration::from_millis(50);

/// A node serving a contiguous range of model blocks.
pub struct ShardNode {
    core: Arc<NodeCore>,
    thread: Mutex<NodeThread>,
}

enum NodeThread {
    NotStarted,
    Running(JoinHandle<Result<(), NodeError>>),
    Joined,
}

struct NodeCore {
    node_id: NodeId,
    registry: Arc<dyn ShardRegistry>,
    blocks: Vec<HostedBlock>,
    module_uids: Vec<ModuleUid>,
    engine: Arc<dyn ExecutionEngine>,
    handlers: Vec<Arc<dyn ConnectionHandler>>,
    announcer: Option<ShardAnnouncer>,
    lease: LeasePolicy,
    readiness: Signal,
    engine_ready: Signal,
    // Orders readiness publication against the shutdown request.
    readiness_gate: Mutex<()>,
    lifecycle: Lifecycle,
    run_claimed: AtomicBool,
    shutdown_requested: Signal,
    // Held while a component is being started, so teardown never races a start.
    startup_gate: Mutex<()>,
    // True once teardown has completed.
    teardown: Mutex<bool>,
}

impl ShardNode {
    /// Resolve `config`, build every component through `factory`, and
    /// return a node that has not started anything.
    #[instrument(name = "shard_node_create", skip_all)]
    pub fn create(config: &NodeConfig, factory: &dyn ComponentFactory) -> Result<Self, NodeError> {
        let resolved = config.resolve()?;
        info!(
            "[node] Creating node for {}.{}..{} ({} handlers)",
            resolved.prefix,
            resolved.block_range.start,
            resolved.block_range.end,
            resolved.num_handlers
        );
        let components = NodeComponents::build(&resolved, factory)?;
        let lease = LeasePolicy::new(
            resolved.update_period,
            resolved.expiration,
            components.registry.max_time_discrepancy(),
        )
        .map_err(ConfigError::from)?;
        Ok(Self::new(components, lease))
    }

    /// Node over already built components. Any hosted set is accepted,
    /// including an empty one (nothing is announced then).
    pub fn new(components: NodeComponents, lease: LeasePolicy) -> Self {
        let NodeComponents {
            registry,
            time,
            blocks,
            engine,
            handlers,
        } = components;
        let module_uids: Vec<ModuleUid> = blocks.iter().map(|b| b.uid.clone()).collect();
        let announcer = (!module_uids.is_empty()).then(|| {
            ShardAnnouncer::new(module_uids.clone(), Arc::clone(&registry), time, lease)
        });
        let engine_ready = engine.ready();

        Self {
            core: Arc::new(NodeCore {
                node_id: registry.node_id(),
                registry,
                blocks,
                module_uids,
                engine,
                handlers,
                announcer,
                lease,
                readiness: Signal::new(),
                engine_ready,
                readiness_gate: Mutex::new(()),
                lifecycle: Lifecycle::new(),
                run_claimed: AtomicBool::new(false),
                shutdown_requested: Signal::new(),
                startup_gate: Mutex::new(()),
                teardown: Mutex::new(false),
            }),
            thread: Mutex::new(NodeThread::NotStarted),
        }
    }

    /// Run the node on a background thread.
    ///
    /// With `await_ready`, block until the node is ready or `timeout`
    /// elapses (`None`: no limit). A timeout is advisory: the node keeps
    /// starting in the background. If the node thread ends before becoming
    /// ready, its error is returned and [`ShardNode::join`] has nothing
    /// left to report.
    pub fn start(&self, await_ready: bool, timeout: Option<Duration>) -> Result<(), NodeError> {
        {
            let mut slot = self.thread.lock();
            if !matches!(*slot, NodeThread::NotStarted) || self.core.run_claimed.load(Ordering::SeqCst)
            {
                return Err(NodeError::AlreadyStarted);
            }
            let core = Arc::clone(&self.core);
            let handle = thread::Builder::new()
                .name(NODE_THREAD_NAME.to_string())
                .spawn(move || core.run())
                .map_err(NodeError::Spawn)?;
            *slot = NodeThread::Running(handle);
        }

        if await_ready {
            self.await_ready(timeout)
        } else {
            Ok(())
        }
    }

    fn await_ready(&self, timeout: Option<Duration>) -> Result<(), NodeError> {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        loop {
            let slice = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        break;
                    }
                    remaining.min(READINESS_POLL)
                }
                None => READINESS_POLL,
            };
            if self.core.readiness.wait(Some(slice)) {
                return Ok(());
            }
            if let Some(result) = self.reap_finished_thread() {
                // The node stopped without ever being seen ready.
                return Err(result.err().unwrap_or(NodeError::Interrupted));
            }
        }
        Err(NodeError::ReadinessTimeout(timeout.unwrap_or_default()))
    }

    fn reap_finished_thread(&self) -> Option<Result<(), NodeError>> {
        let mut slot = self.thread.lock();
        match &*slot {
            NodeThread::Running(handle) if handle.is_finished() => {}
            _ => return None,
        }
        match std::mem::replace(&mut *slot, NodeThread::Joined) {
            NodeThread::Running(handle) => {
                Some(handle.join().unwrap_or(Err(NodeError::Panicked)))
            }
            _ => None,
        }
    }

    /// Run the node on the calling thread until it stops.
    ///
    /// Shutdown always runs before this returns. Returns the startup or
    /// engine error if there was one, otherwise any shutdown failure.
    pub fn run(&self) -> Result<(), NodeError> {
        self.core.run()
    }

    /// Gracefully stop the node. Idempotent and safe to call concurrently;
    /// only the first caller performs teardown.
    pub fn shutdown(&self) -> Result<(), ShutdownError> {
        self.core.shutdown()
    }

    /// Wait for the background thread and return what `run` returned.
    ///
    /// Returns `Ok` if the result was already delivered by `start` or a
    /// previous `join`.
    pub fn join(&self) -> Result<(), NodeError> {
        let handle = {
            let mut slot = self.thread.lock();
            match std::mem::replace(&mut *slot, NodeThread::Joined) {
                NodeThread::NotStarted => {
                    *slot = NodeThread::NotStarted;
                    return Err(NodeError::NotStarted);
                }
                NodeThread::Running(handle) => handle,
                NodeThread::Joined => return Ok(()),
            }
        };
        handle.join().map_err(|_| NodeError::Panicked)?
    }

    /// Readiness signal: set while the node accepts requests. Cleared when
    /// shutdown is requested and never set again afterwards.
    pub fn readiness(&self) -> Signal {
        self.core.readiness.clone()
    }

    /// Whether the node accepts requests right now.
    pub fn is_ready(&self) -> bool {
        self.core.readiness.is_set()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> NodeState {
        self.core.lifecycle.current()
    }

    /// Registry identity.
    pub fn node_id(&self) -> NodeId {
        self.core.node_id
    }

    /// Uids of the hosted blocks, in index order.
    pub fn hosted_modules(&self) -> &[ModuleUid] {
        &self.core.module_uids
    }

    /// Hosted blocks, in index order.
    pub fn hosted_blocks(&self) -> &[HostedBlock] {
        &self.core.blocks
    }

    /// Number of connection handlers.
    pub fn num_handlers(&self) -> usize {
        self.core.handlers.len()
    }

    /// Lease timing.
    pub fn lease(&self) -> LeasePolicy {
        self.core.lease
    }

    /// Announcer counters, if anything is hosted.
    pub fn announcer_stats(&self) -> Option<AnnouncerStats> {
        self.core.announcer.as_ref().map(ShardAnnouncer::stats)
    }
}

impl NodeCore {
    #[instrument(name = "shard_node", skip(self), fields(node = %self.node_id))]
    fn run(&self) -> Result<(), NodeError> {
        if self.run_claimed.swap(true, Ordering::SeqCst) {
            return Err(NodeError::AlreadyStarted);
        }
        if let Err(e) = self.lifecycle.transition(NodeState::Starting) {
            return Err(if self.shutdown_requested.is_set() {
                NodeError::Interrupted
            } else {
                e
            });
        }
        self.log_hosted_blocks();

        let outcome = self.start_components().and_then(|()| self.serve());
        if let Err(e) = &outcome {
            error!("[node] {}", e);
        }
        let teardown = self.shutdown();

        match (outcome, teardown) {
            (Err(e), Err(failed)) => {
                warn!("[node] Shutdown after failure was incomplete: {}", failed);
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), Err(failed)) => Err(NodeError::Shutdown(failed)),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    fn log_hosted_blocks(&self) {
        info!("[node] Serving {} blocks:", self.blocks.len());
        for block in &self.blocks {
            log_module_event!(
                info,
                "node",
                "Hosted block",
                block.uid,
                kind = %block.kind,
                parameters = block.num_parameters
            );
        }
    }

    /// Run one startup action unless shutdown has begun.
    fn step(
        &self,
        step: StartupStep,
        action: impl FnOnce() -> Result<(), StartupCause>,
    ) -> Result<(), NodeError> {
        let _gate = self.startup_gate.lock();
        if self.shutdown_requested.is_set() {
            return Err(NodeError::Interrupted);
        }
        action().map_err(|source| self.startup_failure(step, source))
    }

    fn startup_failure(&self, step: StartupStep, source: impl Into<StartupCause>) -> NodeError {
        if self.shutdown_requested.is_set() {
            NodeError::Interrupted
        } else {
            NodeError::startup(step, source)
        }
    }

    fn start_components(&self) -> Result<(), NodeError> {
        self.step(StartupStep::Registry, || {
            if self.registry.is_alive() {
                return Ok(());
            }
            info!("[node] Starting registry client");
            Ok(self.registry.start()?)
        })?;

        if let Some(announcer) = &self.announcer {
            self.step(StartupStep::Announcer, || Ok(announcer.start()?))?;
        }

        metric_set!(HANDLERS_READY, 0);
        for handler in &self.handlers {
            let step = StartupStep::Handler(handler.slot());
            self.step(step, || {
                if !handler.is_alive() {
                    handler.start()?;
                }
                Ok(())
            })?;
            self.await_handler(handler.as_ref(), step)?;
            metric_inc!(HANDLERS_READY);
        }
        debug!("[node] All {} connection handlers ready", self.handlers.len());
        Ok(())
    }

    fn await_handler(
        &self,
        handler: &dyn ConnectionHandler,
        step: StartupStep,
    ) -> Result<(), NodeError> {
        loop {
            if self.shutdown_requested.is_set() {
                return Err(NodeError::Interrupted);
            }
            match handler.wait_ready(Some(READINESS_POLL)) {
                Ok(true) => return Ok(()),
                Ok(false) => continue,
                Err(e) => return Err(self.startup_failure(step, e)),
            }
        }
    }

    fn serve(&self) -> Result<(), NodeError> {
        {
            let _gate = self.startup_gate.lock();
            if self.shutdown_requested.is_set() {
                return Err(NodeError::Interrupted);
            }
            self.lifecycle.transition(NodeState::Ready)?;
            self.lifecycle.transition(NodeState::Running)?;
        }
        info!("[node] Running engine");
        let engine_stopped = Signal::new();
        let served: Result<(), NodeError> = thread::scope(|scope| {
            thread::Builder::new()
                .name(READINESS_THREAD_NAME.to_string())
                .spawn_scoped(scope, || self.mirror_readiness(&engine_stopped))
                .map_err(NodeError::Spawn)?;
            let outcome = self.engine.run();
            engine_stopped.set();
            outcome.map_err(NodeError::from)
        });
        self.publish_readiness(false);
        served?;
        info!("[node] Engine stopped");
        Ok(())
    }

    /// Copy engine readiness onto the node until the engine stops or
    /// shutdown is requested.
    fn mirror_readiness(&self, engine_stopped: &Signal) {
        loop {
            self.publish_readiness(self.engine_ready.is_set());
            if engine_stopped.wait(Some(READINESS_POLL)) || self.shutdown_requested.is_set() {
                return;
            }
        }
    }

    /// Set or clear node readiness. Never sets it once shutdown is requested.
    fn publish_readiness(&self, ready: bool) {
        let _gate = self.readiness_gate.lock();
        if ready && !self.shutdown_requested.is_set() {
            if !self.readiness.is_set() {
                self.readiness.set();
                metric_set!(NODE_READY, 1);
            }
        } else if self.readiness.is_set() {
            self.readiness.clear();
            metric_set!(NODE_READY, 0);
        }
    }

    #[instrument(name = "shard_node_shutdown", skip(self), fields(node = %self.node_id))]
    fn shutdown(&self) -> Result<(), ShutdownError> {
        // Stop accepting requests before anything else.
        {
            let _gate = self.readiness_gate.lock();
            self.shutdown_requested.set();
            self.readiness.clear();
        }
        metric_set!(NODE_READY, 0);

        let mut torn_down = self.teardown.lock();
        if *torn_down {
            return Ok(());
        }
        // Wait out a component that is mid-start.
        drop(self.startup_gate.lock());
        self.lifecycle.try_transition(NodeState::ShuttingDown);
        info!("[node] Shutting down");

        let mut failures = Vec::new();
        let mut record = |step: ShutdownStep, reason: String| {
            error!("[node] Shutdown step {} failed: {}", step, reason);
            metric_inc!(SHUTDOWN_STEP_FAILURES, &[step.label()]);
            failures.push(ShutdownFailure { step, reason });
        };

        for handler in &self.handlers {
            if let Err(e) = handler.terminate() {
                record(ShutdownStep::Handler(handler.slot()), e.to_string());
            }
        }
        for handler in &self.handlers {
            if let Err(e) = handler.join() {
                record(ShutdownStep::Handler(handler.slot()), e.to_string());
            }
        }
        metric_set!(HANDLERS_READY, 0);
        debug!("[node] Connection handlers terminated");

        if let Some(announcer) = &self.announcer {
            announcer.stop();
            if let Err(e) = announcer.join() {
                record(ShutdownStep::Announcer, e.to_string());
            }
        }

        if let Err(e) = self.registry.shutdown() {
            record(ShutdownStep::Registry, e.to_string());
        }

        debug!("[node] Shutting down engine");
        if let Err(e) = self.engine.shutdown() {
            record(ShutdownStep::Engine, e.to_string());
        }

        *torn_down = true;
        self.lifecycle.try_transition(NodeState::Stopped);

        if failures.is_empty() {
            info!("[node] Shutdown complete");
            Ok(())
        } else {
            Err(ShutdownError { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ShardSpec;
    use crate::testing::{FakeComponents, FakeHandler};
    use std::time::Duration;

    fn config(blocks: u32, handlers: usize) -> NodeConfig {
        NodeConfig {
            prefix: "m".into(),
            shard: ShardSpec::count(blocks),
            num_handlers: Some(handlers),
            lease: crate::container::LeaseConfig {
                update_period_secs: 60.0,
                expiration_secs: None,
            },
            ..NodeConfig::default()
        }
    }

    #[test]
    fn test_create_builds_without_starting() {
        let factory = FakeComponents::new();
        let node = ShardNode::create(&config(2, 3), &factory).unwrap();

        assert_eq!(node.state(), NodeState::Created);
        assert!(!node.is_ready());
        assert_eq!(
            node.hosted_modules(),
            &[ModuleUid::new("m.0"), ModuleUid::new("m.1")]
        );
        assert_eq!(node.num_handlers(), 3);
        assert_eq!(node.lease().expiration(), Duration::from_secs(120));
        assert_eq!(factory.registry.start_calls(), 0);
        assert!(factory.handlers().iter().all(|h| h.start_calls() == 0));
    }

    #[test]
    fn test_create_rejects_bad_config() {
        let factory = FakeComponents::new();
        let err = ShardNode::create(&NodeConfig::default(), &factory).err();
        assert!(matches!(
            err,
            Some(NodeError::Configuration(ConfigError::MissingShardSpec))
        ));
    }

    #[test]
    fn test_lease_uses_registry_discrepancy() {
        let factory = FakeComponents::new();
        factory.registry.set_max_time_discrepancy(Duration::from_secs(600));
        let node = ShardNode::create(&config(1, 1), &factory).unwrap();
        assert_eq!(node.lease().expiration(), Duration::from_secs(600));
    }

    #[test]
    fn test_start_then_shutdown() {
        let factory = FakeComponents::new();
        let node = ShardNode::create(&config(2, 2), &factory).unwrap();

        node.start(true, Some(Duration::from_secs(5))).unwrap();
        assert!(node.is_ready());
        assert_eq!(node.state(), NodeState::Running);
        assert!(factory.registry.announce_calls() >= 1);

        node.shutdown().unwrap();
        assert!(!node.is_ready());
        node.join().unwrap();
        assert_eq!(node.state(), NodeState::Stopped);
        for handler in factory.handlers() {
            assert_eq!(handler.terminate_calls(), 1);
            assert_eq!(handler.join_calls(), 1);
        }
        assert_eq!(factory.registry.shutdown_calls(), 1);
        assert_eq!(factory.engine.shutdown_calls(), 1);
    }

    #[test]
    fn test_readiness_follows_engine_while_serving() {
        let factory = FakeComponents::new();
        let node = ShardNode::create(&config(1, 1), &factory).unwrap();
        node.start(true, Some(Duration::from_secs(5))).unwrap();

        let engine_ready = factory.engine.ready();
        engine_ready.clear();
        assert!(wait_for(|| !node.is_ready()));
        engine_ready.set();
        assert!(wait_for(|| node.is_ready()));

        node.shutdown().unwrap();
        assert!(!node.is_ready());
        node.join().unwrap();
    }

    fn wait_for(condition: impl Fn() -> bool) -> bool {
        for _ in 0..500 {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_second_start_rejected() {
        let factory = FakeComponents::new();
        let node = ShardNode::create(&config(1, 1), &factory).unwrap();
        node.start(false, None).unwrap();
        assert!(matches!(node.start(false, None), Err(NodeError::AlreadyStarted)));
        node.shutdown().unwrap();
        node.join().unwrap();
    }

    #[test]
    fn test_live_registry_not_restarted() {
        let factory = FakeComponents::new();
        factory.registry.start().unwrap();
        let node = ShardNode::create(&config(1, 1), &factory).unwrap();
        node.start(true, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(factory.registry.start_calls(), 1);
        node.shutdown().unwrap();
        node.join().unwrap();
    }

    #[test]
    fn test_registry_start_failure_is_fatal() {
        let factory = FakeComponents::new();
        factory.registry.fail_start();
        let node = ShardNode::create(&config(1, 2), &factory).unwrap();

        let err = node.start(true, Some(Duration::from_secs(5))).unwrap_err();
        assert!(matches!(
            err,
            NodeError::Startup {
                step: StartupStep::Registry,
                ..
            }
        ));
        assert_eq!(node.state(), NodeState::Stopped);
        assert_eq!(factory.registry.announce_calls(), 0);
        for handler in factory.handlers() {
            assert_eq!(handler.start_calls(), 0);
            // Terminated anyway.
            assert_eq!(handler.terminate_calls(), 1);
        }
        // `start` already delivered the thread's result.
        node.join().unwrap();
    }

    #[test]
    fn test_handler_exit_before_ready_is_fatal() {
        let factory = FakeComponents::new();
        factory.set_handler_template(FakeHandler::exits_before_ready);
        let node = ShardNode::create(&config(1, 2), &factory).unwrap();

        assert!(matches!(
            node.start(true, None),
            Err(NodeError::Startup {
                step: StartupStep::Handler(0),
                ..
            })
        ));
        assert_eq!(factory.handlers()[1].start_calls(), 0);
    }

    #[test]
    fn test_engine_fault_propagates_after_shutdown() {
        let factory = FakeComponents::new();
        factory.engine.fault_after_ready("out of memory");
        let node = ShardNode::create(&config(1, 1), &factory).unwrap();

        let err = node.run().unwrap_err();
        assert!(matches!(err, NodeError::EngineFault(ref fault) if fault.0 == "out of memory"));
        assert_eq!(node.state(), NodeState::Stopped);
        assert_eq!(factory.handlers()[0].terminate_calls(), 1);
        assert_eq!(factory.registry.shutdown_calls(), 1);
    }

    #[test]
    fn test_shutdown_failures_are_aggregated() {
        let factory = FakeComponents::new();
        factory.registry.fail_shutdown();
        factory.engine.fail_shutdown();
        let node = ShardNode::create(&config(1, 1), &factory).unwrap();
        node.start(true, Some(Duration::from_secs(5))).unwrap();

        let err = node.shutdown().unwrap_err();
        let steps: Vec<ShutdownStep> = err.failures.iter().map(|f| f.step).collect();
        assert_eq!(steps, vec![ShutdownStep::Registry, ShutdownStep::Engine]);
        // Every step ran despite the failures.
        assert_eq!(factory.handlers()[0].terminate_calls(), 1);
        assert_eq!(factory.engine.shutdown_calls(), 1);

        // The engine loop returned cleanly; the teardown error went to the
        // caller that performed it.
        node.join().unwrap();
        assert!(node.shutdown().is_ok());
    }

    #[test]
    fn test_shutdown_before_start() {
        let factory = FakeComponents::new();
        let node = ShardNode::create(&config(1, 1), &factory).unwrap();
        node.shutdown().unwrap();
        assert_eq!(node.state(), NodeState::Stopped);
        assert!(matches!(node.start(true, None), Err(NodeError::Interrupted)));
    }

    #[test]
    fn test_empty_node_skips_announcer() {
        let factory = FakeComponents::new();
        let components = NodeComponents {
            registry: factory.registry.clone(),
            time: Arc::new(shared_types::SystemTimeSource),
            blocks: Vec::new(),
            engine: factory.engine.clone(),
            handlers: Vec::new(),
        };
        let node = ShardNode::new(components, LeasePolicy::default());
        assert!(node.announcer_stats().is_none());

        node.start(true, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(factory.registry.announce_calls(), 0);
        node.shutdown().unwrap();
        node.join().unwrap();
    }

    #[test]
    fn test_join_before_start() {
        let factory = FakeComponents::new();
        let node = ShardNode::create(&config(1, 1), &factory).unwrap();
        assert!(matches!(node.join(), Err(NodeError::NotStarted)));
    }
}
