//! # Driven Ports (Outbound SPI)
//!
//! The registry client this subsystem requires. Only its lifecycle and a
//! put-style `announce` are used; lookup belongs to whoever routes requests.

use std::time::Duration;

use shared_types::{ModuleUid, NodeId, Timestamp};

use crate::domain::{RegistryError, MAX_REGISTRY_TIME_DISCREPANCY};

/// Client of the shared key → value registry with per-record expiration.
///
/// # Thread Safety
///
/// The announcer thread calls `announce` while the node thread may call
/// `shutdown`, so implementations must be `Send + Sync`.
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct DhtRegistry { node: dht::Node }
///
/// impl ShardRegistry for DhtRegistry {
///     fn announce(&self, uids: &[ModuleUid], expire_at: Timestamp) -> Result<(), RegistryError> {
///         for uid in uids {
///             self.node.store(uid.as_str(), self.node_id(), expire_at)?;
///         }
///         Ok(())
///     }
///     // ...
/// }
/// ```
pub trait ShardRegistry: Send + Sync {
    /// Identity the records are stored under.
    fn node_id(&self) -> NodeId;

    /// Whether the client is started and serving.
    fn is_alive(&self) -> bool;

    /// Start the client and block until it is ready.
    fn start(&self) -> Result<(), RegistryError>;

    /// Store `(uid, node_id, expire_at)` for every uid.
    ///
    /// A later call with a later `expire_at` extends the records.
    fn announce(&self, uids: &[ModuleUid], expire_at: Timestamp) -> Result<(), RegistryError>;

    /// Stop the client. Records already stored decay on their own.
    fn shutdown(&self) -> Result<(), RegistryError>;

    /// Clock skew the registry protocol tolerates between peers.
    fn max_time_discrepancy(&self) -> Duration {
        MAX_REGISTRY_TIME_DISCREPANCY
    }

    /// Addresses other peers can reach this client on, for logging.
    fn visible_addresses(&self) -> Vec<String> {
        Vec::new()
    }
}
