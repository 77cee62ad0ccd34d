//! Centralized Testing Utilities
//!
//! Scriptable fakes for every port the node drives. Each fake counts the
//! calls it receives so tests can assert on sequencing. Available with the
//! `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use node_runtime::testing::FakeComponents;
//! use node_runtime::{NodeConfig, ShardNode, ShardSpec};
//!
//! let factory = FakeComponents::new();
//! let config = NodeConfig { shard: ShardSpec::count(1), num_handlers: Some(1), ..NodeConfig::default() };
//! let node = ShardNode::create(&config, &factory).unwrap();
//!
//! node.start(true, Some(Duration::from_secs(5))).unwrap();
//! node.shutdown().unwrap();
//! node.join().unwrap();
//! assert_eq!(factory.handlers()[0].terminate_calls(), 1);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use shared_types::{BlockIndex, ModuleUid, NodeId, Signal, SystemTimeSource, TimeSource, Timestamp};
use sw_01_shard_announcer::{RegistryError, ShardRegistry, MAX_REGISTRY_TIME_DISCREPANCY};

use crate::container::{ComponentFactory, EngineConfig, HostedBlock, RegistryConfig};
use crate::errors::{EngineFault, HandlerError, NodeError};
use crate::ports::{ConnectionHandler, ExecutionEngine};

// =============================================================================
// REGISTRY
// =============================================================================

/// Registry client that records announcements.
pub struct FakeRegistry {
    node_id: NodeId,
    alive: AtomicBool,
    fail_start: AtomicBool,
    fail_announce: AtomicBool,
    fail_shutdown: AtomicBool,
    max_discrepancy: Mutex<Duration>,
    start_calls: AtomicUsize,
    announce_calls: AtomicUsize,
    shutdown_calls: AtomicUsize,
    announcements: Mutex<Vec<(Vec<ModuleUid>, Timestamp)>>,
}

impl Default for FakeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRegistry {
    /// Healthy, stopped registry.
    pub fn new() -> Self {
        Self {
            node_id: NodeId::random(),
            alive: AtomicBool::new(false),
            fail_start: AtomicBool::new(false),
            fail_announce: AtomicBool::new(false),
            fail_shutdown: AtomicBool::new(false),
            max_discrepancy: Mutex::new(MAX_REGISTRY_TIME_DISCREPANCY),
            start_calls: AtomicUsize::new(0),
            announce_calls: AtomicUsize::new(0),
            shutdown_calls: AtomicUsize::new(0),
            announcements: Mutex::new(Vec::new()),
        }
    }

    /// Make `start` fail.
    pub fn fail_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    /// Make every `announce` fail.
    pub fn fail_announce(&self) {
        self.fail_announce.store(true, Ordering::SeqCst);
    }

    /// Make `shutdown` fail (the client still stops).
    pub fn fail_shutdown(&self) {
        self.fail_shutdown.store(true, Ordering::SeqCst);
    }

    /// Override the reported clock skew.
    pub fn set_max_time_discrepancy(&self, skew: Duration) {
        *self.max_discrepancy.lock() = skew;
    }

    /// Times `start` was called.
    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    /// Times `announce` was called, failed calls included.
    pub fn announce_calls(&self) -> usize {
        self.announce_calls.load(Ordering::SeqCst)
    }

    /// Times `shutdown` was called.
    pub fn shutdown_calls(&self) -> usize {
        self.shutdown_calls.load(Ordering::SeqCst)
    }

    /// Accepted announcements in order.
    pub fn announcements(&self) -> Vec<(Vec<ModuleUid>, Timestamp)> {
        self.announcements.lock().clone()
    }
}

impl ShardRegistry for FakeRegistry {
    fn node_id(&self) -> NodeId {
        self.node_id
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn start(&self) -> Result<(), RegistryError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(RegistryError::StartFailed("bootstrap peers unreachable".into()));
        }
        self.alive.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn announce(&self, uids: &[ModuleUid], expire_at: Timestamp) -> Result<(), RegistryError> {
        self.announce_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_announce.load(Ordering::SeqCst) {
            return Err(RegistryError::Unavailable("store timed out".into()));
        }
        self.announcements.lock().push((uids.to_vec(), expire_at));
        Ok(())
    }

    fn shutdown(&self) -> Result<(), RegistryError> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        self.alive.store(false, Ordering::SeqCst);
        if self.fail_shutdown.load(Ordering::SeqCst) {
            return Err(RegistryError::StopFailed("socket busy".into()));
        }
        Ok(())
    }

    fn max_time_discrepancy(&self) -> Duration {
        *self.max_discrepancy.lock()
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Engine that becomes ready as soon as `run` is entered.
pub struct FakeEngine {
    ready: Signal,
    stop: Signal,
    running: Signal,
    ready_delay: Mutex<Option<Duration>>,
    fault: Mutex<Option<String>>,
    fail_shutdown: AtomicBool,
    run_calls: AtomicUsize,
    shutdown_calls: AtomicUsize,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    /// Engine whose `run` blocks until `shutdown`.
    pub fn new() -> Self {
        Self {
            ready: Signal::new(),
            stop: Signal::new(),
            running: Signal::new(),
            ready_delay: Mutex::new(None),
            fault: Mutex::new(None),
            fail_shutdown: AtomicBool::new(false),
            run_calls: AtomicUsize::new(0),
            shutdown_calls: AtomicUsize::new(0),
        }
    }

    /// Make `run` sleep for `delay` before setting readiness. The engine
    /// sets readiness after the delay even if shutdown arrived meanwhile.
    pub fn delay_ready(&self, delay: Duration) {
        *self.ready_delay.lock() = Some(delay);
    }

    /// Block until `run` has been entered, or `timeout` elapses.
    pub fn wait_until_running(&self, timeout: Duration) -> bool {
        self.running.wait(Some(timeout))
    }

    /// Make `run` set readiness and then fail with `reason`.
    pub fn fault_after_ready(&self, reason: &str) {
        *self.fault.lock() = Some(reason.to_string());
    }

    /// Make `shutdown` report failure (the loop still stops).
    pub fn fail_shutdown(&self) {
        self.fail_shutdown.store(true, Ordering::SeqCst);
    }

    /// Times `run` was entered.
    pub fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }

    /// Times `shutdown` was called.
    pub fn shutdown_calls(&self) -> usize {
        self.shutdown_calls.load(Ordering::SeqCst)
    }
}

impl ExecutionEngine for FakeEngine {
    fn ready(&self) -> Signal {
        self.ready.clone()
    }

    fn run(&self) -> Result<(), EngineFault> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        if self.stop.is_set() {
            return Ok(());
        }
        self.running.set();
        let delay = *self.ready_delay.lock();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.ready.set();
        if let Some(reason) = self.fault.lock().clone() {
            return Err(EngineFault(reason));
        }
        self.stop.wait(None);
        self.ready.clear();
        Ok(())
    }

    fn shutdown(&self) -> Result<(), EngineFault> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        self.stop.set();
        if self.fail_shutdown.load(Ordering::SeqCst) {
            return Err(EngineFault("runtime pool did not drain".into()));
        }
        Ok(())
    }
}

// =============================================================================
// CONNECTION HANDLERS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    OnStart,
    Held,
    ExitsFirst,
}

/// Scriptable connection handler.
pub struct FakeHandler {
    slot: usize,
    readiness: Readiness,
    alive: AtomicBool,
    ready: Signal,
    exited: Signal,
    awaited: Signal,
    terminate_entered: Signal,
    terminate_gate: Option<Signal>,
    start_calls: AtomicUsize,
    terminate_calls: AtomicUsize,
    join_calls: AtomicUsize,
}

impl FakeHandler {
    fn with(slot: usize, readiness: Readiness, terminate_gate: Option<Signal>) -> Self {
        Self {
            slot,
            readiness,
            alive: AtomicBool::new(false),
            ready: Signal::new(),
            exited: Signal::new(),
            awaited: Signal::new(),
            terminate_entered: Signal::new(),
            terminate_gate,
            start_calls: AtomicUsize::new(0),
            terminate_calls: AtomicUsize::new(0),
            join_calls: AtomicUsize::new(0),
        }
    }

    /// Ready as soon as it starts.
    pub fn ready_on_start(slot: usize) -> Self {
        Self::with(slot, Readiness::OnStart, None)
    }

    /// Never ready until [`FakeHandler::release_ready`].
    pub fn never_ready(slot: usize) -> Self {
        Self::with(slot, Readiness::Held, None)
    }

    /// Dies right after starting.
    pub fn exits_before_ready(slot: usize) -> Self {
        Self::with(slot, Readiness::ExitsFirst, None)
    }

    /// Ready on start; `terminate` blocks until [`FakeHandler::release_terminate`].
    pub fn blocking_terminate(slot: usize) -> Self {
        Self::with(slot, Readiness::OnStart, Some(Signal::new()))
    }

    /// Let a held handler report ready.
    pub fn release_ready(&self) {
        self.ready.set();
    }

    /// Let a blocked `terminate` finish.
    pub fn release_terminate(&self) {
        if let Some(gate) = &self.terminate_gate {
            gate.set();
        }
    }

    /// Whether the node has started waiting for this handler's readiness.
    pub fn is_awaited(&self) -> bool {
        self.awaited.is_set()
    }

    /// Block until the node waits on this handler, or `timeout` elapses.
    pub fn wait_until_awaited(&self, timeout: Duration) -> bool {
        self.awaited.wait(Some(timeout))
    }

    /// Block until `terminate` has been entered, or `timeout` elapses.
    pub fn wait_until_terminating(&self, timeout: Duration) -> bool {
        self.terminate_entered.wait(Some(timeout))
    }

    /// Times `start` was called.
    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    /// Times `terminate` was called.
    pub fn terminate_calls(&self) -> usize {
        self.terminate_calls.load(Ordering::SeqCst)
    }

    /// Times `join` was called.
    pub fn join_calls(&self) -> usize {
        self.join_calls.load(Ordering::SeqCst)
    }
}

impl ConnectionHandler for FakeHandler {
    fn slot(&self) -> usize {
        self.slot
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn start(&self) -> Result<(), HandlerError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        match self.readiness {
            Readiness::OnStart => {
                self.alive.store(true, Ordering::SeqCst);
                self.ready.set();
            }
            Readiness::Held => self.alive.store(true, Ordering::SeqCst),
            Readiness::ExitsFirst => self.exited.set(),
        }
        Ok(())
    }

    fn wait_ready(&self, timeout: Option<Duration>) -> Result<bool, HandlerError> {
        self.awaited.set();
        if self.exited.is_set() && !self.ready.is_set() {
            return Err(HandlerError::ExitedBeforeReady { slot: self.slot });
        }
        Ok(self.ready.wait(timeout))
    }

    fn terminate(&self) -> Result<(), HandlerError> {
        self.terminate_calls.fetch_add(1, Ordering::SeqCst);
        self.terminate_entered.set();
        if let Some(gate) = &self.terminate_gate {
            gate.wait(None);
        }
        self.alive.store(false, Ordering::SeqCst);
        self.ready.clear();
        Ok(())
    }

    fn join(&self) -> Result<(), HandlerError> {
        self.join_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// FACTORY
// =============================================================================

/// Builds the fake for one handler slot.
pub type HandlerTemplate = fn(usize) -> FakeHandler;

/// Factory handing out fakes and keeping a handle on each.
pub struct FakeComponents {
    /// The registry every node built here uses
    pub registry: Arc<FakeRegistry>,
    /// The engine every node built here uses
    pub engine: Arc<FakeEngine>,
    time: Mutex<Arc<dyn TimeSource>>,
    template: Mutex<HandlerTemplate>,
    per_slot: Mutex<HashMap<usize, HandlerTemplate>>,
    handlers: Mutex<Vec<Arc<FakeHandler>>>,
}

impl Default for FakeComponents {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeComponents {
    /// Healthy registry and engine; handlers ready on start.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(FakeRegistry::new()),
            engine: Arc::new(FakeEngine::new()),
            time: Mutex::new(Arc::new(SystemTimeSource)),
            template: Mutex::new(FakeHandler::ready_on_start as HandlerTemplate),
            per_slot: Mutex::new(HashMap::new()),
            handlers: Mutex::new(Vec::new()),
        }
    }

    /// Build every handler with `template`.
    pub fn set_handler_template(&self, template: HandlerTemplate) {
        *self.template.lock() = template;
    }

    /// Build the handler in `slot` with `template`.
    pub fn set_handler_for_slot(&self, slot: usize, template: HandlerTemplate) {
        self.per_slot.lock().insert(slot, template);
    }

    /// Clock handed to the node.
    pub fn set_time_source(&self, time: Arc<dyn TimeSource>) {
        *self.time.lock() = time;
    }

    /// Handlers built so far, in slot order.
    pub fn handlers(&self) -> Vec<Arc<FakeHandler>> {
        self.handlers.lock().clone()
    }
}

impl ComponentFactory for FakeComponents {
    fn registry(&self, _config: &RegistryConfig) -> Result<Arc<dyn ShardRegistry>, NodeError> {
        let registry: Arc<dyn ShardRegistry> = self.registry.clone();
        Ok(registry)
    }

    fn time_source(&self) -> Arc<dyn TimeSource> {
        self.time.lock().clone()
    }

    fn load_block(
        &self,
        uid: &ModuleUid,
        index: BlockIndex,
        _config: &EngineConfig,
    ) -> Result<HostedBlock, NodeError> {
        Ok(HostedBlock {
            uid: uid.clone(),
            index,
            kind: "FakeBlock".to_string(),
            num_parameters: 1_000,
        })
    }

    fn engine(
        &self,
        _blocks: &[HostedBlock],
        _config: &EngineConfig,
    ) -> Result<Arc<dyn ExecutionEngine>, NodeError> {
        let engine: Arc<dyn ExecutionEngine> = self.engine.clone();
        Ok(engine)
    }

    fn handler(
        &self,
        slot: usize,
        _registry: &Arc<dyn ShardRegistry>,
        _blocks: &[HostedBlock],
    ) -> Result<Arc<dyn ConnectionHandler>, NodeError> {
        let template = self
            .per_slot
            .lock()
            .get(&slot)
            .copied()
            .unwrap_or(*self.template.lock());
        let handler = Arc::new(template(slot));
        self.handlers.lock().push(Arc::clone(&handler));
        let handler: Arc<dyn ConnectionHandler> = handler;
        Ok(handler)
    }
}
