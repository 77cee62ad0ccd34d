//! # Integration Tests
//!
//! Full nodes built from the `node-runtime` fakes or the in-process
//! adapters, driven through start, serve and shutdown.

pub mod lease_decay;
pub mod node_lifecycle;

#[cfg(test)]
pub(crate) mod support {
    use std::time::{Duration, Instant};

    use node_runtime::{LeaseConfig, NodeConfig, ShardSpec};

    /// Generous bound for anything that should happen promptly.
    pub const PROMPT: Duration = Duration::from_secs(10);

    /// Config hosting `m.0..m.{blocks}` with `handlers` handlers.
    pub fn config(blocks: u32, handlers: usize, update_period_secs: f64) -> NodeConfig {
        NodeConfig {
            prefix: "m".into(),
            shard: ShardSpec::count(blocks),
            num_handlers: Some(handlers),
            lease: LeaseConfig {
                update_period_secs,
                expiration_secs: None,
            },
            ..NodeConfig::default()
        }
    }

    /// Poll `condition` until it holds or `timeout` elapses.
    pub fn eventually(timeout: Duration, condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        condition()
    }
}
