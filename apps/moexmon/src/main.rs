//! MOEX watchlist monitor.
//!
//! Polls the exchange on a fixed interval, evaluates active watchlist
//! items, latches fired items in the store, and publishes alerts onto the
//! message bus for the dispatcher to deliver.

mod config;
mod evaluator;
mod metrics;

use anyhow::Context;
use clap::Parser;
use config::AppConfig;
use evaluator::Evaluator;
use metrics::Metrics;
use moexmon_bus::MessageBus;
use moexmon_moex::MoexClient;
use moexmon_store::Database;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Watchlist monitor CLI.
#[derive(Parser, Debug)]
#[command(name = "moexmon")]
#[command(about = "MOEX watchlist monitor", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, default_value = "moexmon.json")]
    config: PathBuf,

    /// Verbose logging
    #[arg(short = 'v', long, default_value_t = false)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_new(format!(
        "{level},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn,tower=warn"
    ))
    .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to parse configuration {}", args.config.display()))?;
    anyhow::ensure!(
        config.check_interval_seconds > 0,
        "check_interval_seconds must be positive"
    );
    info!(
        config = %args.config.display(),
        interval_secs = config.check_interval_seconds,
        "starting MOEX watchlist monitor"
    );

    let shutdown = CancellationToken::new();

    // SIGINT (Ctrl+C), SIGTERM (systemd/K8s), SIGQUIT all trigger the same
    // ordered shutdown.
    let mut interrupt = signal(SignalKind::interrupt()).context("failed to install handler")?;
    let mut terminate = signal(SignalKind::terminate()).context("failed to install handler")?;
    let mut quit = signal(SignalKind::quit()).context("failed to install handler")?;
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
            _ = quit.recv() => {}
        }
        info!("received termination signal, shutting down");
        signal_token.cancel();
    });

    let db = match std::env::var("GODFATHER_DB_CONN") {
        Ok(dsn) => Database::connect_dsn(&dsn).await,
        Err(_) => {
            let d = &config.database;
            Database::connect(&d.host, d.port, &d.user, &d.passwd, &d.database).await
        }
    }
    .context("failed to initialize database connection")?;

    let bus = MessageBus::connect(&config.nats.host, config.nats.port, &config.nats.user)
        .await
        .context("failed to initialize message bus")?;
    bus.ensure_stream("alerts", "alerts.*")
        .await
        .context("failed to create alerts stream")?;

    let metrics = Arc::new(Metrics::new().context("failed to register metrics")?);
    let metrics_handle = tokio::spawn(metrics::serve(
        metrics.clone(),
        config.prometheus.url.clone(),
        config.prometheus.port,
        shutdown.clone(),
    ));

    let ev = Evaluator::new(
        db.clone(),
        MoexClient::new(),
        bus.clone(),
        metrics,
        Duration::from_secs(config.check_interval_seconds),
    );
    let evaluator_token = shutdown.clone();
    let evaluator_handle = tokio::spawn(async move { ev.run(evaluator_token).await });

    shutdown.cancelled().await;

    if let Err(e) = evaluator_handle.await {
        error!(error = %e, "evaluator task failed");
    }
    match metrics_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "metrics server failed"),
        Err(e) => error!(error = %e, "metrics task failed"),
    }

    bus.close().await;
    db.close().await;
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        error!("startup failed: {e:#}");
        std::process::exit(1);
    }
    info!("shutdown complete");
}
