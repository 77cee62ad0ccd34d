//! In-process soft-state registry.
//!
//! One [`InMemoryRegistry`] plays the shared registry; each node gets its own
//! [`InMemoryRegistryClient`] onto it. Records expire against an injected
//! [`TimeSource`], so tests can watch leases decay without sleeping.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use shared_types::{ModuleUid, NodeId, SystemTimeSource, TimeSource, Timestamp};
use tracing::{debug, info};

use crate::domain::{RegistryError, MAX_REGISTRY_TIME_DISCREPANCY};
use crate::ports::ShardRegistry;

type Records = HashMap<ModuleUid, HashMap<NodeId, Timestamp>>;

/// Shared record store.
#[derive(Clone)]
pub struct InMemoryRegistry {
    records: Arc<RwLock<Records>>,
    time: Arc<dyn TimeSource>,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new(Arc::new(SystemTimeSource))
    }
}

impl InMemoryRegistry {
    /// Empty registry judging expiry by `time`.
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            time,
        }
    }

    /// A client that announces under `node_id`. Starts stopped.
    pub fn client(&self, node_id: NodeId) -> InMemoryRegistryClient {
        InMemoryRegistryClient {
            registry: self.clone(),
            node_id,
            alive: AtomicBool::new(false),
        }
    }

    /// Clock the registry judges expiry by.
    pub fn time_source(&self) -> Arc<dyn TimeSource> {
        Arc::clone(&self.time)
    }

    /// Upsert one record. The later of the old and new expiration wins.
    pub fn store(&self, uid: &ModuleUid, node_id: NodeId, expire_at: Timestamp) {
        let mut records = self.records.write();
        let holders = records.entry(uid.clone()).or_default();
        let entry = holders.entry(node_id).or_insert(expire_at);
        if expire_at > *entry {
            *entry = expire_at;
        }
    }

    /// Nodes holding an unexpired record for `uid`, sorted.
    pub fn live_nodes(&self, uid: &ModuleUid) -> Vec<NodeId> {
        let now = self.time.now();
        let records = self.records.read();
        let mut nodes: Vec<NodeId> = records
            .get(uid)
            .map(|holders| {
                holders
                    .iter()
                    .filter(|(_, expire_at)| **expire_at > now)
                    .map(|(node, _)| *node)
                    .collect()
            })
            .unwrap_or_default();
        nodes.sort();
        nodes
    }

    /// Stored expiration for one record, expired or not.
    pub fn expiration_of(&self, uid: &ModuleUid, node_id: NodeId) -> Option<Timestamp> {
        self.records
            .read()
            .get(uid)
            .and_then(|holders| holders.get(&node_id).copied())
    }

    /// Drop every expired record. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.time.now();
        let mut records = self.records.write();
        let mut removed = 0;
        for holders in records.values_mut() {
            let before = holders.len();
            holders.retain(|_, expire_at| *expire_at > now);
            removed += before - holders.len();
        }
        records.retain(|_, holders| !holders.is_empty());
        if removed > 0 {
            debug!("[registry] Purged {} expired records", removed);
        }
        removed
    }

    /// Number of records currently stored, including expired ones.
    pub fn record_count(&self) -> usize {
        self.records.read().values().map(HashMap::len).sum()
    }
}

/// One node's handle onto an [`InMemoryRegistry`].
pub struct InMemoryRegistryClient {
    registry: InMemoryRegistry,
    node_id: NodeId,
    alive: AtomicBool,
}

impl InMemoryRegistryClient {
    /// The registry this client writes to.
    pub fn registry(&self) -> &InMemoryRegistry {
        &self.registry
    }
}

impl ShardRegistry for InMemoryRegistryClient {
    fn node_id(&self) -> NodeId {
        self.node_id
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn start(&self) -> Result<(), RegistryError> {
        if !self.alive.swap(true, Ordering::SeqCst) {
            info!("[registry] In-memory client {} started", self.node_id);
        }
        Ok(())
    }

    fn announce(&self, uids: &[ModuleUid], expire_at: Timestamp) -> Result<(), RegistryError> {
        if !self.is_alive() {
            return Err(RegistryError::NotRunning);
        }
        for uid in uids {
            self.registry.store(uid, self.node_id, expire_at);
        }
        Ok(())
    }

    fn shutdown(&self) -> Result<(), RegistryError> {
        if self.alive.swap(false, Ordering::SeqCst) {
            info!("[registry] In-memory client {} stopped", self.node_id);
        }
        Ok(())
    }

    fn max_time_discrepancy(&self) -> Duration {
        MAX_REGISTRY_TIME_DISCREPANCY
    }

    fn visible_addresses(&self) -> Vec<String> {
        vec![format!("memory://{}", self.node_id)]
    }
}
