//! Pump Pulse
//!
//! Watches newly created bonding-curve tokens on a pump.fun-style Solana
//! program, filters them against configurable predicates, and monitors each
//! survivor until a termination rule fires.

use anyhow::Result;
use clap::Parser;
use pump_pulse::config::PipelineConfig;
use pump_pulse::core::{FilterConfig, Project};
use pump_pulse::creation_filter::CreationFilter;
use pump_pulse::curve_poller::CurvePoller;
use pump_pulse::dispatcher::Dispatcher;
use pump_pulse::monitor;
use pump_pulse::rpc::{BondingCurveSource, RpcReader};
use pump_pulse::snapshot::{LoggingSink, NullSink, SnapshotSink};
use pump_pulse::stream_listener::StreamListener;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pump-pulse")]
#[command(about = "Real-time bonding-curve token monitor", version, author)]
struct Cli {
    /// Override the configured log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Validate configuration and exit without connecting to anything
    #[arg(long)]
    dry_run: bool,

    /// Only monitor mints whose name or symbol contains this substring
    #[arg(long)]
    name_contains: Option<String>,

    /// Only monitor mints created by this address
    #[arg(long)]
    creator_address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = PipelineConfig::from_env()?;
    if let Some(log_level) = cli.log_level.clone() {
        config = config.with_log_level(log_level);
    }
    config = config.with_filters(FilterConfig {
        name_contains: cli.name_contains.clone(),
        creator_address: cli.creator_address.clone(),
    });

    init_logging(&config)?;

    info!(version = env!("CARGO_PKG_VERSION"), "starting pump-pulse");
    info!(wss_endpoint = %config.wss_endpoint, "configuration loaded");
    info!(rpc_http_endpoint = %config.rpc_http_endpoint, "configuration loaded");
    info!(pump_program = %config.pump_program, "configuration loaded");

    if cli.dry_run {
        info!("dry run: configuration is valid, exiting");
        return Ok(());
    }

    let (dispatcher, watcher_rx) = Dispatcher::new(config.pump_program.clone());
    let dispatcher = Arc::new(dispatcher);
    let rpc: Arc<dyn BondingCurveSource> = Arc::new(RpcReader::new(config.rpc_http_endpoint.clone()));
    let sink: Arc<dyn SnapshotSink> = if cli.dry_run {
        Arc::new(NullSink)
    } else {
        Arc::new(LoggingSink)
    };

    let stream_listener = StreamListener::new(
        config.wss_endpoint.clone(),
        config.pump_program.clone(),
        dispatcher.clone(),
    );
    let stream_handle = tokio::spawn(stream_listener.run());

    let creation_filter = CreationFilter::new(dispatcher.clone(), config.filters.clone());
    let filter_dispatcher = dispatcher.clone();
    let filter_rpc = rpc.clone();
    let filter_thresholds = config.thresholds;
    let filter_sink = sink.clone();
    let filter_handle = tokio::spawn(async move {
        creation_filter
            .run(watcher_rx, move |project: Project, rx| {
                let dispatcher = filter_dispatcher.clone();
                let rpc = filter_rpc.clone();
                let sink = filter_sink.clone();
                tokio::spawn(monitor::task::run(
                    dispatcher,
                    rpc,
                    project,
                    rx,
                    filter_thresholds,
                    sink,
                ));
            })
            .await;
    });

    let curve_poller = CurvePoller::new(dispatcher.clone(), rpc.clone());
    let poller_handle = tokio::spawn(curve_poller.run());

    info!("pump-pulse running, press Ctrl+C to shut down");

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("received shutdown signal");
        }
        result = stream_handle => {
            if let Err(e) = result {
                tracing::error!(error = %e, "stream listener task panicked");
            }
        }
        result = filter_handle => {
            if let Err(e) = result {
                tracing::error!(error = %e, "creation filter task panicked");
            }
        }
        result = poller_handle => {
            if let Err(e) = result {
                tracing::error!(error = %e, "curve poller task panicked");
            }
        }
    }

    info!("shutting down pump-pulse");
    Ok(())
}

fn init_logging(config: &PipelineConfig) -> Result<()> {
    let log_level = config.log_level.parse().unwrap_or(tracing::Level::INFO);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("pump_pulse={log_level},solana_sdk=warn").into());

    if config.structured_logging {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }

    Ok(())
}
