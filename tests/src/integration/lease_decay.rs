//! # Lease Decay
//!
//! Nodes built from the in-process adapters announcing into one shared
//! registry. A stopped node is never retracted; its records simply stop
//! being renewed and fall out of lookups once their lease runs out.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use node_runtime::adapters::LocalComponents;
    use node_runtime::{NodeConfig, ShardNode, ShardSpec};
    use shared_types::{ManualTimeSource, ModuleUid, Timestamp};
    use sw_01_shard_announcer::InMemoryRegistry;

    use crate::integration::support::{config, PROMPT};

    fn local_swarm() -> (Arc<ManualTimeSource>, LocalComponents) {
        let clock = Arc::new(ManualTimeSource::new(Timestamp::from_secs(1_000)));
        let registry = InMemoryRegistry::new(clock.clone());
        (clock, LocalComponents::new(registry))
    }

    #[test]
    fn test_stopped_node_expires_after_lease() {
        let (clock, factory) = local_swarm();
        let node = ShardNode::create(&config(2, 1, 1.0), &factory).unwrap();
        node.start(true, Some(PROMPT)).unwrap();

        let uid = ModuleUid::new("m.1");
        assert_eq!(factory.shared_registry().live_nodes(&uid), vec![node.node_id()]);

        node.shutdown().unwrap();
        node.join().unwrap();

        // Still visible until the 3 s lease (max(2 * 1 s, 3 s)) runs out.
        clock.advance(Duration::from_secs(2));
        assert_eq!(factory.shared_registry().live_nodes(&uid), vec![node.node_id()]);

        clock.advance(Duration::from_secs(1));
        assert!(factory.shared_registry().live_nodes(&uid).is_empty());
        assert_eq!(factory.shared_registry().purge_expired(), 2);
    }

    #[test]
    fn test_nodes_share_one_registry() {
        let (_clock, factory) = local_swarm();

        let mut left = NodeConfig::default();
        left.shard = ShardSpec::range("0:2");
        left.num_handlers = Some(1);
        let mut right = NodeConfig::default();
        right.shard = ShardSpec::range("1:3");
        right.num_handlers = Some(1);

        let a = ShardNode::create(&left, &factory).unwrap();
        let b = ShardNode::create(&right, &factory).unwrap();
        assert_ne!(a.node_id(), b.node_id());
        a.start(true, Some(PROMPT)).unwrap();
        b.start(true, Some(PROMPT)).unwrap();

        let registry = factory.shared_registry();
        assert_eq!(registry.live_nodes(&ModuleUid::new("bloom.0")), vec![a.node_id()]);
        let mut both = vec![a.node_id(), b.node_id()];
        both.sort();
        assert_eq!(registry.live_nodes(&ModuleUid::new("bloom.1")), both);
        assert_eq!(registry.live_nodes(&ModuleUid::new("bloom.2")), vec![b.node_id()]);

        for node in [&a, &b] {
            node.shutdown().unwrap();
            node.join().unwrap();
        }
    }

    #[test]
    fn test_expiration_override_sets_lease() {
        let (clock, factory) = local_swarm();
        let mut config = config(1, 1, 1.0);
        config.lease.expiration_secs = Some(10.0);
        let node = ShardNode::create(&config, &factory).unwrap();
        node.start(true, Some(PROMPT)).unwrap();
        node.shutdown().unwrap();
        node.join().unwrap();

        let uid = ModuleUid::new("m.0");
        assert_eq!(
            factory.shared_registry().expiration_of(&uid, node.node_id()),
            Some(Timestamp::from_secs(1_010))
        );
        clock.advance(Duration::from_secs(9));
        assert_eq!(factory.shared_registry().live_nodes(&uid), vec![node.node_id()]);
    }
}
