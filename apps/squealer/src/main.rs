//! Alert dispatcher.
//!
//! Holds a durable subscription on the alert subject, correlates each
//! consumed alert with its notification record, and forwards the alert to
//! the configured Telegram chat.

mod config;
mod dispatcher;
mod telegram;

use anyhow::Context;
use clap::Parser;
use config::AppConfig;
use moexmon_bus::MessageBus;
use moexmon_store::Database;
use std::path::PathBuf;
use std::sync::Arc;
use telegram::TelegramCourier;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Alert dispatcher CLI.
#[derive(Parser, Debug)]
#[command(name = "squealer")]
#[command(about = "Alert dispatcher for the MOEX watchlist monitor", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, default_value = "squealer.json")]
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
    info!(config = %args.config.display(), "starting alert dispatcher");

    let shutdown = CancellationToken::new();

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
    bus.ensure_stream(dispatcher::ALERT_STREAM, dispatcher::ALERT_SUBJECTS)
        .await
        .context("failed to create alerts stream")?;

    let store = Arc::new(db.clone());
    let courier = Arc::new(TelegramCourier);
    let subscription = bus
        .push_subscribe(
            dispatcher::DURABLE_NAME,
            dispatcher::ALERT_STREAM,
            dispatcher::ALERT_SUBJECT,
            move |message| {
                let store = store.clone();
                let courier = courier.clone();
                async move {
                    // Ack first: delivery is best-effort, and a failed bot
                    // call must not turn into a redelivery storm.
                    if let Err(e) = message.ack().await {
                        error!(error = %e, "failed to acknowledge message");
                        return;
                    }
                    dispatcher::handle_alert(store.as_ref(), courier.as_ref(), &message.payload)
                        .await;
                }
            },
        )
        .await
        .context("failed to subscribe to alerts")?;

    info!("dispatcher running");
    shutdown.cancelled().await;

    // The durable cursor stays on the server; the next start resumes from
    // the last acknowledged alert.
    subscription.unsubscribe();
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
