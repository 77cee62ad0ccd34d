//! Announcer state machine: `Idle → Announcing → Stopped`.

/// Lifecycle of a [`crate::ShardAnnouncer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnouncerState {
    /// Constructed, nothing announced yet
    Idle,
    /// Renewal loop running
    Announcing,
    /// Stop requested; terminal
    Stopped,
}

impl AnnouncerState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: AnnouncerState) -> bool {
        use AnnouncerState::*;
        matches!(
            (self, next),
            (Idle, Announcing) | (Idle, Stopped) | (Announcing, Stopped)
        )
    }

    /// Whether the state is terminal.
    pub fn is_stopped(self) -> bool {
        self == AnnouncerState::Stopped
    }
}

#[cfg(test)]
mod tests {
    use super::AnnouncerState::*;

    #[test]
    fn test_transitions() {
        assert!(Idle.can_transition_to(Announcing));
        assert!(Announcing.can_transition_to(Stopped));
        assert!(Idle.can_transition_to(Stopped));
        assert!(!Stopped.can_transition_to(Announcing));
        assert!(!Announcing.can_transition_to(Announcing));
    }
}
