//! Prometheus metrics for swarm nodes.
//!
//! All metrics follow the naming convention: `sw_<subject>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., announcements_total)
//! - **Gauge**: Value that can go up or down (e.g., handlers_ready)

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // NODE LIFECYCLE
    // =========================================================================

    /// 1 while the node accepts requests, 0 otherwise
    pub static ref NODE_READY: Gauge = Gauge::new(
        "sw_node_ready",
        "Whether the node is ready to serve requests"
    ).expect("metric creation failed");

    /// Connection handlers that have signalled readiness
    pub static ref HANDLERS_READY: Gauge = Gauge::new(
        "sw_handlers_ready",
        "Connection handlers that finished starting"
    ).expect("metric creation failed");

    /// Lifecycle transitions by target state
    pub static ref NODE_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("sw_node_transitions_total", "Lifecycle transitions by target state"),
        &["state"]
    ).expect("metric creation failed");

    /// Failed shutdown steps by step
    pub static ref SHUTDOWN_STEP_FAILURES: CounterVec = CounterVec::new(
        Opts::new("sw_shutdown_step_failures_total", "Shutdown steps that failed"),
        &["step"]  // step: handler/announcer/registry/engine
    ).expect("metric creation failed");

    // =========================================================================
    // ANNOUNCER
    // =========================================================================

    /// Announcement attempts by outcome
    pub static ref SHARD_ANNOUNCEMENTS: CounterVec = CounterVec::new(
        Opts::new("sw_shard_announcements_total", "Shard announcements by outcome"),
        &["outcome"]  // outcome: ok/failed
    ).expect("metric creation failed");

    /// Modules covered by the latest successful announcement
    pub static ref ANNOUNCED_MODULES: Gauge = Gauge::new(
        "sw_announced_modules",
        "Modules covered by the latest successful announcement"
    ).expect("metric creation failed");
}

/// Handle proving the collectors were registered.
pub struct MetricsHandle {
    _registry: Registry,
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless: collectors that are already
/// registered are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Node
        Box::new(NODE_READY.clone()),
        Box::new(HANDLERS_READY.clone()),
        Box::new(NODE_TRANSITIONS.clone()),
        Box::new(SHUTDOWN_STEP_FAILURES.clone()),
        // Announcer
        Box::new(SHARD_ANNOUNCEMENTS.clone()),
        Box::new(ANNOUNCED_MODULES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: REGISTRY.clone(),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
