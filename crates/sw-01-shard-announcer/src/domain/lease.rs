//! Lease timing for shard announcements.
//!
//! An announcement is soft state: the registry keeps it until `expire_at`
//! and then forgets it. The announcer renews every `update_period`, so with
//! the default expiration a record survives one missed renewal.

use std::time::Duration;

use shared_types::Timestamp;
use tracing::warn;

use super::errors::LeaseError;

/// Worst-case clock skew between peers of the registry.
///
/// A record must outlive this much skew or remote peers may consider it
/// already expired on arrival.
pub const MAX_REGISTRY_TIME_DISCREPANCY: Duration = Duration::from_secs(3);

/// Renewal period used when none is configured.
pub const DEFAULT_UPDATE_PERIOD: Duration = Duration::from_secs(30);

/// Expiration used when none is configured: `max(2 × period, discrepancy)`.
pub fn default_expiration(update_period: Duration, max_discrepancy: Duration) -> Duration {
    update_period.saturating_mul(2).max(max_discrepancy)
}

/// Renewal period plus record lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeasePolicy {
    update_period: Duration,
    expiration: Duration,
}

impl LeasePolicy {
    /// Build a policy, deriving the expiration when `expiration` is `None`.
    ///
    /// An explicit expiration shorter than the period is accepted: the
    /// record then disappears between renewals, which some deployments use
    /// to keep a node only intermittently visible.
    pub fn new(
        update_period: Duration,
        expiration: Option<Duration>,
        max_discrepancy: Duration,
    ) -> Result<Self, LeaseError> {
        if update_period.is_zero() {
            return Err(LeaseError::ZeroUpdatePeriod);
        }
        let expiration = match expiration {
            Some(e) if e.is_zero() => return Err(LeaseError::ZeroExpiration),
            Some(e) => {
                if e < update_period {
                    warn!(
                        "[announcer] Expiration {:?} is shorter than update period {:?}, \
                         records will lapse between renewals",
                        e, update_period
                    );
                }
                e
            }
            None => default_expiration(update_period, max_discrepancy),
        };
        Ok(Self {
            update_period,
            expiration,
        })
    }

    /// Policy with the default period and expiration.
    pub fn with_defaults() -> Self {
        Self {
            update_period: DEFAULT_UPDATE_PERIOD,
            expiration: default_expiration(DEFAULT_UPDATE_PERIOD, MAX_REGISTRY_TIME_DISCREPANCY),
        }
    }

    /// Interval between renewals.
    pub fn update_period(&self) -> Duration {
        self.update_period
    }

    /// Lifetime of each announced record.
    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Expiration timestamp for an announcement made at `now`.
    pub fn expire_at(&self, now: Timestamp) -> Timestamp {
        now.saturating_add(self.expiration)
    }

    /// Whether a renewal lands before the previous record lapses.
    pub fn renews_before_expiry(&self) -> bool {
        self.expiration >= self.update_period
    }
}

impl Default for LeasePolicy {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_expiration_is_twice_period() {
        let lease =
            LeasePolicy::new(Duration::from_secs(30), None, MAX_REGISTRY_TIME_DISCREPANCY).unwrap();
        assert_eq!(lease.expiration(), Duration::from_secs(60));
        assert!(lease.renews_before_expiry());
    }

    #[test]
    fn test_short_period_clamped_to_discrepancy() {
        let lease =
            LeasePolicy::new(Duration::from_secs(1), None, MAX_REGISTRY_TIME_DISCREPANCY).unwrap();
        assert_eq!(lease.expiration(), Duration::from_secs(3));
    }

    #[test]
    fn test_explicit_short_expiration_accepted() {
        let lease = LeasePolicy::new(
            Duration::from_secs(10),
            Some(Duration::from_secs(4)),
            MAX_REGISTRY_TIME_DISCREPANCY,
        )
        .unwrap();
        assert_eq!(lease.expiration(), Duration::from_secs(4));
        assert!(!lease.renews_before_expiry());
    }

    #[test]
    fn test_zero_values_rejected() {
        assert_eq!(
            LeasePolicy::new(Duration::ZERO, None, MAX_REGISTRY_TIME_DISCREPANCY),
            Err(LeaseError::ZeroUpdatePeriod)
        );
        assert_eq!(
            LeasePolicy::new(
                Duration::from_secs(1),
                Some(Duration::ZERO),
                MAX_REGISTRY_TIME_DISCREPANCY
            ),
            Err(LeaseError::ZeroExpiration)
        );
    }

    #[test]
    fn test_expire_at_offsets_now() {
        let lease = LeasePolicy::with_defaults();
        let now = Timestamp::from_secs(1_000);
        assert_eq!(lease.expire_at(now), Timestamp::from_secs(1_060));
    }

    proptest! {
        #[test]
        fn prop_default_expiration_bounds(period_ms in 1u64..10_000_000, skew_ms in 0u64..60_000) {
            let period = Duration::from_millis(period_ms);
            let skew = Duration::from_millis(skew_ms);
            let lease = LeasePolicy::new(period, None, skew).unwrap();
            prop_assert!(lease.expiration() >= period * 2);
            prop_assert!(lease.expiration() >= skew);
            prop_assert!(lease.renews_before_expiry());
        }
    }
}
