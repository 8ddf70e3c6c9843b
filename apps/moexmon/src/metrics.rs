//! Pipeline counters and their HTTP exposition.

use axum::{extract::State, routing::get, Router};
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Counters of the evaluation pipeline.
///
/// Counter names are part of the operational contract; dashboards and
/// alerting rules key on them.
pub struct Metrics {
    registry: Registry,
    pub db_failures: IntCounter,
    pub net_failures: IntCounter,
    pub alerts_published: IntCounter,
    pub alert_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let db_failures = IntCounter::new(
            "moexmon_db_failures",
            "Database failures while reading or latching the watchlist",
        )?;
        let net_failures = IntCounter::new(
            "moexmon_net_failures",
            "Exchange price request failures",
        )?;
        let alerts_published = IntCounter::new(
            "moexmon_alerts_published",
            "Alerts published onto the message bus",
        )?;
        let alert_failures = IntCounter::new(
            "moexmon_alert_failures",
            "Alerts that failed to encode or publish",
        )?;

        for counter in [
            &db_failures,
            &net_failures,
            &alerts_published,
            &alert_failures,
        ] {
            registry.register(Box::new(counter.clone()))?;
        }

        Ok(Self {
            registry,
            db_failures,
            net_failures,
            alerts_published,
            alert_failures,
        })
    }

    /// Text exposition of every registered counter.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

async fn render_metrics(State(metrics): State<Arc<Metrics>>) -> String {
    metrics.render()
}

/// Serve the exposition endpoint until the shutdown token fires.
pub async fn serve(
    metrics: Arc<Metrics>,
    url: String,
    port: u16,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let app = Router::new()
        .route(&url, get(render_metrics))
        .with_state(metrics);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, path = %url, "metrics server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("metrics server stopped");
    Ok(())
}
