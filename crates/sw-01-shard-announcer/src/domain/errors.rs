//! Error types for shard announcement.

use thiserror::Error;

use super::state::AnnouncerState;

/// Failure reported by a registry client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The client has not been started, or has been shut down
    #[error("registry client is not running")]
    NotRunning,

    /// The registry could not be reached
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    /// The registry refused the records
    #[error("registry rejected announcement: {0}")]
    Rejected(String),

    /// Starting the client failed
    #[error("registry failed to start: {0}")]
    StartFailed(String),

    /// Stopping the client failed
    #[error("registry failed to stop: {0}")]
    StopFailed(String),
}

impl RegistryError {
    /// Whether a later attempt may succeed without operator action.
    pub fn is_transient(&self) -> bool {
        matches!(self, RegistryError::Unavailable(_) | RegistryError::Rejected(_))
    }
}

/// Misuse or failure of the announcer's own thread.
#[derive(Debug, Error)]
pub enum AnnouncerError {
    /// `start` called outside the idle state
    #[error("announcer cannot start from state {0:?}")]
    AlreadyStarted(AnnouncerState),

    /// The OS refused to spawn the renewal thread
    #[error("failed to spawn announcer thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// `join` called while the loop was still told to run
    #[error("join requested before stop; the renewal loop would never exit")]
    JoinWithoutStop,

    /// The renewal thread panicked
    #[error("announcer thread panicked")]
    Panicked,
}

/// Invalid lease timing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaseError {
    /// A zero period would renew in a busy loop
    #[error("update period must be greater than zero")]
    ZeroUpdatePeriod,

    /// A zero expiration would publish records that are already expired
    #[error("expiration must be greater than zero")]
    ZeroExpiration,
}
