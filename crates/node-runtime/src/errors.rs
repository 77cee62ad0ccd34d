//! Error types for the node runtime.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use sw_01_shard_announcer::{AnnouncerError, LeaseError, RegistryError};
use thiserror::Error;

use crate::node::NodeState;

/// Invalid or unreadable node configuration. Never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Both `num_blocks` and `block_indices` were given
    #[error("specify num_blocks or block_indices, not both")]
    ConflictingShardSpec,

    /// Neither `num_blocks` nor `block_indices` was given
    #[error("specify one of num_blocks or block_indices")]
    MissingShardSpec,

    /// `block_indices` is not `start:end`
    #[error("invalid block_indices {input:?}: {reason} (expected start:end, e.g. 0:18)")]
    InvalidBlockRange {
        /// Raw value
        input: String,
        /// What was wrong with it
        reason: String,
    },

    /// The shard would host no blocks
    #[error("shard range {start}..{end} hosts no blocks")]
    EmptyShard {
        /// First index (inclusive)
        start: u32,
        /// Last index (exclusive)
        end: u32,
    },

    /// The shard hosts more blocks than one node may
    #[error("shard hosts {blocks} blocks, at most {max} allowed")]
    ShardTooLarge {
        /// Blocks requested
        blocks: u32,
        /// Upper bound
        max: u32,
    },

    /// `num_handlers = 0` leaves no way to accept requests
    #[error("num_handlers must be at least 1")]
    ZeroHandlers,

    /// Batch bounds out of order or zero
    #[error("invalid batch bounds: min {min} max {max}")]
    InvalidBatchBounds {
        /// Configured minimum
        min: usize,
        /// Configured maximum
        max: usize,
    },

    /// Module prefix is empty or contains the uid separator
    #[error("invalid module prefix {0:?}")]
    InvalidPrefix(String),

    /// Unknown dtype name
    #[error("unknown dtype {0:?}, expected one of auto, float16, bfloat16, float32")]
    UnknownDtype(String),

    /// A duration that is negative, NaN or too large
    #[error("invalid duration for {field}: {value}")]
    InvalidDuration {
        /// Config field name
        field: &'static str,
        /// Offending value in seconds
        value: f64,
    },

    /// Lease timing rejected
    #[error(transparent)]
    Lease(#[from] LeaseError),

    /// Config file could not be read
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::NodeConfig`]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An `SW_*` environment variable could not be parsed
    #[error("invalid value {value:?} for {key}")]
    InvalidEnv {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },
}

/// Unrecoverable error raised by the execution engine's main loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("engine fault: {0}")]
pub struct EngineFault(pub String);

/// Failure of a single connection handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The handler could not be started
    #[error("handler {slot} failed to start: {reason}")]
    StartFailed {
        /// Handler slot
        slot: usize,
        /// Cause
        reason: String,
    },

    /// The handler stopped before signalling readiness
    #[error("handler {slot} exited before becoming ready")]
    ExitedBeforeReady {
        /// Handler slot
        slot: usize,
    },

    /// The handler could not be terminated
    #[error("handler {slot} failed to terminate: {reason}")]
    TerminateFailed {
        /// Handler slot
        slot: usize,
        /// Cause
        reason: String,
    },

    /// The handler's worker panicked
    #[error("handler {slot} panicked")]
    Panicked {
        /// Handler slot
        slot: usize,
    },
}

/// Startup step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupStep {
    /// Bringing the registry client up
    Registry,
    /// Starting the announcer
    Announcer,
    /// Starting or awaiting a handler
    Handler(usize),
}

impl fmt::Display for StartupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupStep::Registry => write!(f, "registry"),
            StartupStep::Announcer => write!(f, "announcer"),
            StartupStep::Handler(slot) => write!(f, "handler {slot}"),
        }
    }
}

/// Shutdown step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownStep {
    /// Terminating or joining a handler
    Handler(usize),
    /// Stopping and joining the announcer
    Announcer,
    /// Stopping the registry client
    Registry,
    /// Shutting the engine down
    Engine,
}

impl ShutdownStep {
    /// Metric label for the step.
    pub fn label(&self) -> &'static str {
        match self {
            ShutdownStep::Handler(_) => "handler",
            ShutdownStep::Announcer => "announcer",
            ShutdownStep::Registry => "registry",
            ShutdownStep::Engine => "engine",
        }
    }
}

impl fmt::Display for ShutdownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownStep::Handler(slot) => write!(f, "handler {slot}"),
            other => f.write_str(other.label()),
        }
    }
}

/// One failed shutdown step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownFailure {
    /// Which step
    pub step: ShutdownStep,
    /// Why it failed
    pub reason: String,
}

impl fmt::Display for ShutdownFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.reason)
    }
}

/// Every step that failed during one shutdown. The remaining steps still ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownError {
    /// Failures in step order
    pub failures: Vec<ShutdownFailure>,
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} shutdown step(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ShutdownError {}

/// Cause of a failed startup step.
#[derive(Debug, Error)]
pub enum StartupCause {
    /// Registry client error
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Announcer error
    #[error(transparent)]
    Announcer(#[from] AnnouncerError),
    /// Handler error
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

/// Errors surfaced by [`crate::ShardNode`].
#[derive(Debug, Error)]
pub enum NodeError {
    /// Rejected at construction
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// `start(await_ready = true)` gave up waiting; the node keeps starting
    #[error("node did not become ready within {0:?}")]
    ReadinessTimeout(Duration),

    /// `start` or `run` called twice
    #[error("node already started")]
    AlreadyStarted,

    /// Lifecycle state machine refused a transition
    #[error("invalid lifecycle transition {from:?} -> {to:?}")]
    InvalidTransition {
        /// Current state
        from: NodeState,
        /// Requested state
        to: NodeState,
    },

    /// A startup step failed; the node was shut down
    #[error("startup failed at {step}: {source}")]
    Startup {
        /// Failing step
        step: StartupStep,
        /// Cause
        #[source]
        source: StartupCause,
    },

    /// The engine faulted; the node was shut down
    #[error(transparent)]
    EngineFault(#[from] EngineFault),

    /// Teardown had failures
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),

    /// A component could not be built
    #[error("failed to build {component}: {reason}")]
    Component {
        /// Component kind
        component: &'static str,
        /// Cause
        reason: String,
    },

    /// Shutdown began while the node was still starting
    #[error("node shut down during startup")]
    Interrupted,

    /// The node thread could not be spawned
    #[error("failed to spawn node thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The node thread panicked
    #[error("node thread panicked")]
    Panicked,

    /// `join` called before `start`
    #[error("node thread was never started")]
    NotStarted,
}

impl NodeError {
    pub(crate) fn startup(step: StartupStep, source: impl Into<StartupCause>) -> Self {
        NodeError::Startup {
            step,
            source: source.into(),
        }
    }
}
