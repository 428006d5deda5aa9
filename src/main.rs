//! New Relic agent receiver
//!
//! Standalone host for the receiver: agents are pointed at this process and
//! every translated span batch is logged.
//!
//! # Architecture Overview
//!
//! ```text
//!     New Relic agent                 ┌──────────────────────────────────────────────┐
//!     ────────────────────────────────┼─▶ http::handler  (?method=...)              │
//!                                     │      │                                      │
//!                                     │      ├─ preconnect ─────▶ redirect host     │
//!                                     │      ├─ connect ──▶ protocol ──▶ registry  │
//!                                     │      ├─ span_event_data                     │
//!                                     │      │     protocol ──▶ registry.get        │
//!                                     │      │     ──▶ translate ──▶ consumer ──────┼──▶ traces
//!                                     │      └─ analytic_event_data ──▶ log         │
//!                                     │                                             │
//!                                     │  config · lifecycle · observability · net   │
//!                                     └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use newrelic_receiver::config::{load_config, ReceiverConfig};
use newrelic_receiver::lifecycle::shutdown_signal;
use newrelic_receiver::observability::{logging, metrics};
use newrelic_receiver::{LoggingConsumer, NewRelicReceiver};

#[derive(Parser)]
#[command(name = "newrelic-receiver")]
#[command(about = "Receive New Relic agent spans and translate them to OTLP", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ReceiverConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability)?;
    tracing::info!("newrelic-receiver v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        path = %config.protocol.path,
        max_concurrent_requests = config.listener.max_concurrent_requests,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut receiver = NewRelicReceiver::new(config, Arc::new(LoggingConsumer));
    receiver.start().await?;

    shutdown_signal().await;
    receiver.shutdown().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
