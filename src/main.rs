#![forbid(unsafe_code)]

//! `logistics-relay`: Slack image relay binary.
//!
//! Bootstraps configuration and credentials, builds the relay pipeline,
//! and listens for messages over Slack Socket Mode until shutdown.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use logistics_relay::config::GlobalConfig;
use logistics_relay::routing::directory::ChannelDirectory;
use logistics_relay::routing::forwarder::FileTransfer;
use logistics_relay::routing::RelayPipeline;
use logistics_relay::slack::client::SlackService;
use logistics_relay::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "logistics-relay", about = "Slack logistics image relay", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("logistics-relay bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.load_credentials().await?;
    let config = Arc::new(config);
    info!(
        source_channel = %config.slack.source_channel_id,
        page_size = config.routing.channel_page_size,
        max_pages = config.routing.max_channel_pages,
        cache_ttl_seconds = config.routing.directory_cache_ttl_seconds,
        "configuration loaded"
    );

    // ── Build Slack adapter and pipeline ────────────────
    let slack = Arc::new(SlackService::new(&config).map_err(|err| {
        error!(%err, "slack service init failed");
        err
    })?);
    let directory: Arc<dyn ChannelDirectory> = slack.clone();
    let transfer: Arc<dyn FileTransfer> = slack.clone();
    let pipeline = Arc::new(RelayPipeline::new(&config, directory, transfer));

    // ── Start Socket Mode ───────────────────────────────
    let ct = CancellationToken::new();
    let socket_handle = slack.start_socket_mode(&config.slack.app_token, pipeline, ct.clone());
    info!("bot is running and handlers are loaded");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    if let Err(err) = socket_handle.await {
        error!(%err, "socket mode task panicked");
    }
    info!("logistics-relay shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
