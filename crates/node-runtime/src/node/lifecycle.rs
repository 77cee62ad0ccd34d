//! Node lifecycle state machine.
//!
//! ```text
//! Created → Starting → Ready → Running → ShuttingDown → Stopped
//!              │                              ↑
//!              └──────── startup failure ─────┘
//! ```
//!
//! `ShuttingDown` is reachable from every non-terminal state, since a
//! shutdown may be requested at any time.

use parking_lot::RwLock;
use swarm_telemetry::{metric_inc, NODE_TRANSITIONS};
use tracing::debug;

use crate::errors::NodeError;

/// Where the node is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Built, nothing started
    Created,
    /// Bringing up registry, announcer and handlers
    Starting,
    /// Every handler ready, engine about to run
    Ready,
    /// Engine main loop running
    Running,
    /// Tearing down
    ShuttingDown,
    /// Terminal
    Stopped,
}

impl NodeState {
    /// Whether `next` may follow `self`.
    pub fn can_transition_to(self, next: NodeState) -> bool {
        use NodeState::*;
        matches!(
            (self, next),
            (Created, Starting)
                | (Starting, Ready)
                | (Ready, Running)
                | (Created | Starting | Ready | Running, ShuttingDown)
                | (ShuttingDown, Stopped)
        )
    }

    /// Metric label.
    pub fn label(self) -> &'static str {
        match self {
            NodeState::Created => "created",
            NodeState::Starting => "starting",
            NodeState::Ready => "ready",
            NodeState::Running => "running",
            NodeState::ShuttingDown => "shutting_down",
            NodeState::Stopped => "stopped",
        }
    }
}

/// Guarded current state.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: RwLock<NodeState>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(NodeState::Created),
        }
    }

    pub(crate) fn current(&self) -> NodeState {
        *self.state.read()
    }

    /// Move to `next` or fail without changing state.
    pub(crate) fn transition(&self, next: NodeState) -> Result<(), NodeError> {
        let mut state = self.state.write();
        if !state.can_transition_to(next) {
            return Err(NodeError::InvalidTransition {
                from: *state,
                to: next,
            });
        }
        debug!("[node] {:?} -> {:?}", *state, next);
        *state = next;
        metric_inc!(NODE_TRANSITIONS, &[next.label()]);
        Ok(())
    }

    /// Move to `next` if legal. Returns whether the state changed.
    pub(crate) fn try_transition(&self, next: NodeState) -> bool {
        self.transition(next).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::NodeState::*;
    use super::*;

    #[test]
    fn test_happy_path() {
        let lifecycle = Lifecycle::new();
        for next in [Starting, Ready, Running, ShuttingDown, Stopped] {
            lifecycle.transition(next).unwrap();
        }
        assert_eq!(lifecycle.current(), Stopped);
    }

    #[test]
    fn test_startup_failure_path() {
        assert!(Starting.can_transition_to(ShuttingDown));
        assert!(Created.can_transition_to(ShuttingDown));
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let lifecycle = Lifecycle::new();
        assert!(matches!(
            lifecycle.transition(Running),
            Err(NodeError::InvalidTransition { from: Created, to: Running })
        ));
        assert_eq!(lifecycle.current(), Created);

        assert!(!Stopped.can_transition_to(Starting));
        assert!(!ShuttingDown.can_transition_to(Running));
        assert!(!Ready.can_transition_to(Starting));
    }
}
