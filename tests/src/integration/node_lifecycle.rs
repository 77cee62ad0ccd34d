//! # Node Lifecycle
//!
//! Startup ordering, readiness, announcement renewal and shutdown of a
//! whole node, observed through the `node-runtime` fakes.
//!
//! ## Flow Tested
//!
//! 1. **Startup**: registry → announcer (first announcement synchronous) →
//!    handlers in slot order → engine
//! 2. **Serving**: readiness set, leases renewed every update period
//! 3. **Shutdown**: readiness cleared first, then handlers, announcer,
//!    registry and engine, exactly once however many callers ask

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use node_runtime::testing::{FakeComponents, FakeHandler};
    use node_runtime::{ExecutionEngine, NodeError, NodeState, ShardNode, StartupStep};
    use shared_types::{ManualTimeSource, ModuleUid, Timestamp};

    use crate::integration::support::{config, eventually, PROMPT};

    // =========================================================================
    // HAPPY PATH
    // =========================================================================

    #[test]
    fn test_node_serves_and_shuts_down_cleanly() {
        let factory = FakeComponents::new();
        factory.set_time_source(Arc::new(ManualTimeSource::new(Timestamp::from_secs(100))));
        let node = ShardNode::create(&config(2, 2, 1.0), &factory).unwrap();

        node.start(true, Some(PROMPT)).unwrap();
        assert!(node.is_ready());
        assert_eq!(node.state(), NodeState::Running);

        // First announcement happened before any handler started.
        let announcements = factory.registry.announcements();
        let (uids, expire_at) = &announcements[0];
        assert_eq!(uids, &vec![ModuleUid::new("m.0"), ModuleUid::new("m.1")]);
        // max(2 * 1 s, 3 s) past the announcement time.
        assert_eq!(*expire_at, Timestamp::from_secs(103));

        node.shutdown().unwrap();
        node.join().unwrap();

        assert!(!node.is_ready());
        assert_eq!(node.state(), NodeState::Stopped);
        for handler in factory.handlers() {
            assert_eq!(handler.start_calls(), 1);
            assert_eq!(handler.terminate_calls(), 1);
            assert_eq!(handler.join_calls(), 1);
        }
        assert_eq!(factory.registry.shutdown_calls(), 1);
        assert_eq!(factory.engine.shutdown_calls(), 1);
    }

    #[test]
    fn test_start_without_waiting() {
        let factory = FakeComponents::new();
        let node = ShardNode::create(&config(1, 1, 60.0), &factory).unwrap();

        node.start(false, None).unwrap();
        assert!(node.readiness().wait(Some(PROMPT)));

        node.shutdown().unwrap();
        node.join().unwrap();
        assert!(!node.is_ready());
    }

    // =========================================================================
    // READINESS
    // =========================================================================

    #[test]
    fn test_readiness_timeout_leaves_node_starting() {
        let factory = FakeComponents::new();
        factory.set_handler_for_slot(1, FakeHandler::never_ready);
        let node = ShardNode::create(&config(1, 2, 60.0), &factory).unwrap();

        let timeout = Duration::from_millis(500);
        match node.start(true, Some(timeout)) {
            Err(NodeError::ReadinessTimeout(waited)) => assert_eq!(waited, timeout),
            other => panic!("expected readiness timeout, got {other:?}"),
        }
        assert!(!node.is_ready());
        assert_eq!(node.state(), NodeState::Starting);

        let handlers = factory.handlers();
        assert_eq!(handlers[0].start_calls(), 1);
        assert_eq!(handlers[1].start_calls(), 1);
        assert!(handlers[1].is_awaited());
        assert_eq!(factory.engine.run_calls(), 0);

        node.shutdown().unwrap();
        assert!(matches!(node.join(), Err(NodeError::Interrupted)));
        assert_eq!(factory.engine.run_calls(), 0);
        for handler in &handlers {
            assert_eq!(handler.terminate_calls(), 1);
        }
    }

    #[test]
    fn test_late_handler_releases_readiness() {
        let factory = FakeComponents::new();
        factory.set_handler_for_slot(0, FakeHandler::never_ready);
        let node = ShardNode::create(&config(1, 2, 60.0), &factory).unwrap();

        node.start(false, None).unwrap();
        let handlers = factory.handlers();
        assert!(handlers[0].wait_until_awaited(PROMPT));
        // Slot 1 is only started once slot 0 is ready.
        assert_eq!(handlers[1].start_calls(), 0);
        assert!(!node.is_ready());

        handlers[0].release_ready();
        assert!(node.readiness().wait(Some(PROMPT)));
        assert_eq!(handlers[1].start_calls(), 1);

        node.shutdown().unwrap();
        node.join().unwrap();
    }

    #[test]
    fn test_handler_death_reported_from_start() {
        let factory = FakeComponents::new();
        factory.set_handler_for_slot(1, FakeHandler::exits_before_ready);
        let node = ShardNode::create(&config(1, 3, 60.0), &factory).unwrap();

        match node.start(true, Some(PROMPT)) {
            Err(NodeError::Startup { step, .. }) => assert_eq!(step, StartupStep::Handler(1)),
            other => panic!("expected handler startup failure, got {other:?}"),
        }
        // Slot 2 never got built into a running handler.
        assert_eq!(factory.handlers()[2].start_calls(), 0);
        assert_eq!(node.state(), NodeState::Stopped);
        node.join().unwrap();
    }

    // =========================================================================
    // ANNOUNCEMENTS
    // =========================================================================

    #[test]
    fn test_failing_registry_does_not_stop_node() {
        let factory = FakeComponents::new();
        factory.registry.fail_announce();
        let node = ShardNode::create(&config(1, 1, 0.2), &factory).unwrap();

        node.start(true, Some(PROMPT)).unwrap();
        assert!(eventually(PROMPT, || factory.registry.announce_calls() >= 3));

        assert!(node.is_ready());
        assert_eq!(node.state(), NodeState::Running);
        let stats = node.announcer_stats().unwrap();
        assert!(stats.failures >= 3);
        assert_eq!(stats.successes, 0);

        node.shutdown().unwrap();
        node.join().unwrap();
    }

    #[test]
    fn test_announcements_stop_after_shutdown() {
        let factory = FakeComponents::new();
        let node = ShardNode::create(&config(1, 1, 0.1), &factory).unwrap();

        node.start(true, Some(PROMPT)).unwrap();
        assert!(eventually(PROMPT, || factory.registry.announce_calls() >= 2));
        node.shutdown().unwrap();
        node.join().unwrap();

        let calls = factory.registry.announce_calls();
        thread::sleep(Duration::from_millis(350));
        assert_eq!(factory.registry.announce_calls(), calls);
    }

    // =========================================================================
    // SHUTDOWN
    // =========================================================================

    #[test]
    fn test_concurrent_shutdown_runs_teardown_once() {
        let factory = FakeComponents::new();
        let node = Arc::new(ShardNode::create(&config(2, 4, 60.0), &factory).unwrap());
        node.start(true, Some(PROMPT)).unwrap();

        let callers: Vec<_> = (0..4)
            .map(|_| {
                let node = Arc::clone(&node);
                thread::spawn(move || node.shutdown())
            })
            .collect();
        for caller in callers {
            caller.join().unwrap().unwrap();
        }
        node.join().unwrap();

        for handler in factory.handlers() {
            assert_eq!(handler.terminate_calls(), 1);
        }
        assert_eq!(factory.registry.shutdown_calls(), 1);
        assert_eq!(factory.engine.shutdown_calls(), 1);
    }

    #[test]
    fn test_readiness_cleared_before_handlers_stop() {
        let factory = FakeComponents::new();
        factory.set_handler_for_slot(0, FakeHandler::blocking_terminate);
        let node = Arc::new(ShardNode::create(&config(1, 2, 60.0), &factory).unwrap());
        node.start(true, Some(PROMPT)).unwrap();

        let stopper = {
            let node = Arc::clone(&node);
            thread::spawn(move || node.shutdown())
        };
        let handlers = factory.handlers();
        assert!(handlers[0].wait_until_terminating(PROMPT));
        assert!(!node.is_ready());
        assert_eq!(factory.registry.shutdown_calls(), 0);

        handlers[0].release_terminate();
        stopper.join().unwrap().unwrap();
        node.join().unwrap();
        assert_eq!(node.state(), NodeState::Stopped);
    }

    #[test]
    fn test_late_engine_readiness_ignored_during_shutdown() {
        let factory = FakeComponents::new();
        factory.engine.delay_ready(Duration::from_millis(200));
        factory.set_handler_for_slot(0, FakeHandler::blocking_terminate);
        let node = Arc::new(ShardNode::create(&config(1, 2, 60.0), &factory).unwrap());

        node.start(false, None).unwrap();
        assert!(factory.engine.wait_until_running(PROMPT));

        let stopper = {
            let node = Arc::clone(&node);
            thread::spawn(move || node.shutdown())
        };
        let handlers = factory.handlers();
        assert!(handlers[0].wait_until_terminating(PROMPT));

        // The engine reports ready while handler 0 is still terminating.
        assert!(factory.engine.ready().wait(Some(PROMPT)));
        thread::sleep(Duration::from_millis(200));
        assert!(!node.is_ready());

        handlers[0].release_terminate();
        stopper.join().unwrap().unwrap();
        node.join().unwrap();
        assert!(!node.is_ready());
    }

    #[test]
    fn test_engine_fault_surfaces_from_join() {
        let factory = FakeComponents::new();
        factory.engine.fault_after_ready("device lost");
        let node = ShardNode::create(&config(1, 1, 60.0), &factory).unwrap();

        node.start(false, None).unwrap();
        match node.join() {
            Err(NodeError::EngineFault(fault)) => assert_eq!(fault.0, "device lost"),
            other => panic!("expected engine fault, got {other:?}"),
        }
        assert!(!node.is_ready());
        assert_eq!(factory.registry.shutdown_calls(), 1);
        assert_eq!(factory.handlers()[0].terminate_calls(), 1);
    }

    #[test]
    fn test_registry_start_failure_reaches_caller() {
        let factory = FakeComponents::new();
        factory.registry.fail_start();
        let node = ShardNode::create(&config(1, 2, 60.0), &factory).unwrap();

        match node.start(true, Some(PROMPT)) {
            Err(NodeError::Startup { step, .. }) => assert_eq!(step, StartupStep::Registry),
            other => panic!("expected registry startup failure, got {other:?}"),
        }
        assert_eq!(factory.registry.announce_calls(), 0);
        for handler in factory.handlers() {
            assert_eq!(handler.start_calls(), 0);
        }
    }
}
