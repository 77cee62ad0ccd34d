//! # Signal
//!
//! A settable, clearable boolean with broadcast wake-up, shared by cloning.
//!
//! Used for component readiness (set once the component accepts work,
//! cleared when it begins shutting down) and for cooperative stop requests
//! (background loops wait on the signal with a timeout instead of sleeping).

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Cloneable handle onto one shared flag.
///
/// All clones observe the same state. Waiters are woken together when the
/// flag is set.
#[derive(Clone, Default)]
pub struct Signal {
    inner: Arc<SignalInner>,
}

#[derive(Default)]
struct SignalInner {
    flag: Mutex<bool>,
    changed: Condvar,
}

impl Signal {
    /// Create an unset signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag and wake every waiter. No-op if already set.
    pub fn set(&self) {
        let mut flag = self.inner.flag.lock();
        if !*flag {
            *flag = true;
            self.inner.changed.notify_all();
        }
    }

    /// Reset the flag.
    pub fn clear(&self) {
        *self.inner.flag.lock() = false;
    }

    /// Current value of the flag.
    pub fn is_set(&self) -> bool {
        *self.inner.flag.lock()
    }

    /// Block until the flag is set or `timeout` elapses.
    ///
    /// `None` waits without bound. Returns the flag value at wake-up, so
    /// `false` means the wait timed out.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut flag = self.inner.flag.lock();
        while !*flag {
            match deadline {
                Some(deadline) => {
                    if self.inner.changed.wait_until(&mut flag, deadline).timed_out() {
                        return *flag;
                    }
                }
                // Unbounded, or a timeout too large to represent as an Instant.
                None => self.inner.changed.wait(&mut flag),
            }
        }
        true
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").field("set", &self.is_set()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_signal_is_unset() {
        let signal = Signal::new();
        assert!(!signal.is_set());
        assert!(!signal.wait(Some(Duration::from_millis(10))));
    }

    #[test]
    fn test_set_and_clear() {
        let signal = Signal::new();
        signal.set();
        assert!(signal.is_set());
        assert!(signal.wait(Some(Duration::ZERO)));

        signal.clear();
        assert!(!signal.is_set());
    }

    #[test]
    fn test_clones_share_state() {
        let signal = Signal::new();
        let clone = signal.clone();
        clone.set();
        assert!(signal.is_set());
        assert!(!Signal::new().is_set());
    }

    #[test]
    fn test_set_wakes_all_waiters() {
        let signal = Signal::new();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let signal = signal.clone();
                thread::spawn(move || signal.wait(Some(Duration::from_secs(5))))
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        signal.set();

        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
    }

    #[test]
    fn test_wait_times_out() {
        let signal = Signal::new();
        let started = Instant::now();
        assert!(!signal.wait(Some(Duration::from_millis(50))));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_unbounded_wait_returns_once_set() {
        let signal = Signal::new();
        let setter = signal.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            setter.set();
        });
        assert!(signal.wait(None));
        handle.join().unwrap();
    }
}
