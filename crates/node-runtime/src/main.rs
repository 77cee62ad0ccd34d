//! # Swarm Node
//!
//! Serves a contiguous range of model blocks and keeps them announced in
//! the shared registry until interrupted.
//!
//! ## Configuration Layers
//!
//! ```text
//! defaults  →  --config <file.toml>  →  SW_* environment  →  command line
//! ```
//!
//! Later layers win. A shard given as `--num-blocks` in one layer replaces
//! a `block_indices` range from an earlier one.
//!
//! This binary wires in-process collaborators: the registry is in memory
//! and blocks carry no weights. It exercises the full node lifecycle.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use node_runtime::adapters::LocalComponents;
use node_runtime::{BlockDtype, ConfigError, NodeConfig, NodeState, ShardNode, ShardSpec};
use swarm_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use tracing::{error, info, warn};

/// How often the main task checks whether the node stopped on its own.
const EXIT_POLL: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "swarm-node")]
#[command(about = "Serve a range of model blocks to the swarm")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Module uid prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Host blocks 0..N
    #[arg(long, conflicts_with = "block_indices")]
    num_blocks: Option<u32>,

    /// Host blocks in "start:end"
    #[arg(long)]
    block_indices: Option<String>,

    /// Connection handler count (default: 4 per block)
    #[arg(long)]
    num_handlers: Option<usize>,

    /// Seconds between announcements
    #[arg(long)]
    update_period: Option<f64>,

    /// Announcement lifetime in seconds
    #[arg(long)]
    expiration: Option<f64>,

    /// Registry bootstrap peers, comma separated
    #[arg(long, value_delimiter = ',')]
    initial_peers: Vec<String>,

    /// Device the engine runs on
    #[arg(long)]
    device: Option<String>,

    /// Parameter dtype: auto, float16, bfloat16 or float32
    #[arg(long)]
    dtype: Option<String>,

    /// Engine attention cache size
    #[arg(long)]
    cache_size_bytes: Option<u64>,

    /// Smallest batch the engine forms
    #[arg(long)]
    min_batch_size: Option<usize>,

    /// Largest batch the engine forms
    #[arg(long)]
    max_batch_size: Option<usize>,

    /// Seconds to wait for readiness before giving up
    #[arg(long, default_value = "300")]
    ready_timeout: f64,
}

impl Cli {
    fn apply(&self, config: &mut NodeConfig) -> Result<(), ConfigError> {
        if let Some(prefix) = &self.prefix {
            config.prefix = prefix.clone();
        }
        config.shard.override_with(ShardSpec {
            num_blocks: self.num_blocks,
            block_indices: self.block_indices.clone(),
        });
        if let Some(n) = self.num_handlers {
            config.num_handlers = Some(n);
        }
        if let Some(period) = self.update_period {
            config.lease.update_period_secs = period;
        }
        if let Some(expiration) = self.expiration {
            config.lease.expiration_secs = Some(expiration);
        }
        if !self.initial_peers.is_empty() {
            config.registry.initial_peers = self.initial_peers.clone();
        }
        if let Some(device) = &self.device {
            config.engine.device = device.clone();
        }
        if let Some(dtype) = &self.dtype {
            config.engine.dtype = dtype.parse::<BlockDtype>()?;
        }
        if let Some(bytes) = self.cache_size_bytes {
            config.engine.cache_size_bytes = Some(bytes);
        }
        if let Some(n) = self.min_batch_size {
            config.engine.min_batch_size = n;
        }
        if let Some(n) = self.max_batch_size {
            config.engine.max_batch_size = n;
        }
        Ok(())
    }
}

fn load_config(cli: &Cli) -> Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    config
        .apply_env()
        .context("Invalid SW_* environment override")?;
    cli.apply(&mut config).context("Invalid command line")?;
    Ok(config)
}

/// Shut the node down and collect its exit status.
async fn stop_node(node: Arc<ShardNode>) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        if let Err(e) = node.shutdown() {
            error!("[node] {}", e);
        }
        node.join()
    })
    .await
    .context("Shutdown task panicked")?
    .context("Node exited with an error")
}

async fn wait_for_exit(node: &ShardNode) {
    let mut tick = tokio::time::interval(EXIT_POLL);
    loop {
        tick.tick().await;
        if matches!(node.state(), NodeState::ShuttingDown | NodeState::Stopped) {
            return;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = load_config(&cli)?;
    let ready_timeout =
        Duration::try_from_secs_f64(cli.ready_timeout).context("Invalid --ready-timeout")?;

    let factory = LocalComponents::default();
    let node = Arc::new(ShardNode::create(&config, &factory).context("Failed to build node")?);
    info!(
        "[node] Node {} hosting {} block(s) with {} handler(s)",
        node.node_id(),
        node.hosted_modules().len(),
        node.num_handlers()
    );

    let starter = Arc::clone(&node);
    let started = tokio::task::spawn_blocking(move || starter.start(true, Some(ready_timeout)))
        .await
        .context("Startup task panicked")?;
    if let Err(e) = started {
        error!("[node] Startup failed: {}", e);
        if let Err(stop_error) = stop_node(Arc::clone(&node)).await {
            warn!("[node] {:#}", stop_error);
        }
        return Err(e).context("Node failed to become ready");
    }

    info!("[node] Ready. Press Ctrl+C to stop.");
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            info!("[node] Interrupt received, shutting down");
        }
        _ = wait_for_exit(&node) => {
            warn!("[node] Node stopped on its own");
        }
    }

    let outcome = stop_node(node).await;

    match encode_metrics() {
        Ok(text) => info!("[telemetry] Final metrics:\n{}", text),
        Err(e) => warn!("[telemetry] Could not encode metrics: {}", e),
    }

    outcome
}
