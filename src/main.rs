//! Seawatch - Maritime situational awareness for vessel operators.
//!
//! Polls the tracking backend on a fixed interval and serves situation
//! reports computed from the latest snapshot.
//!
//! # API Endpoints
//!
//! - `GET /situation` - Situation report for the latest snapshot
//! - `POST /situation` - Situation report for a supplied snapshot
//! - `GET /situation/alerts` - Proximity alerts only
//! - `GET /health` - Health check

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use seawatch::api::{AppState, router};
use seawatch::config::ServiceConfig;
use seawatch::data_sources::MaritimeApiClient;
use seawatch::poller::{SituationPoller, SnapshotStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("seawatch=info".parse()?))
        .init();

    let config = ServiceConfig::from_env();
    config.engine.validate()?;

    info!(
        port = config.port,
        backend = %config.backend_url,
        poll_secs = config.poll_interval.as_secs(),
        alert_radius_km = config.engine.alert_radius_km,
        risk_radius_km = config.engine.risk_radius_km,
        "Starting Seawatch server"
    );
    if config.api_token.is_none() {
        info!("No SEAWATCH_API_TOKEN set, backend requests are unauthenticated");
    }

    // Start polling before accepting requests so the first snapshot is on its way
    let client = MaritimeApiClient::new(&config.backend_url, config.api_token.clone())?;
    let store = SnapshotStore::new();
    let poller = SituationPoller::new(client, store.clone(), config.poll_interval).spawn();

    let state = AppState {
        snapshots: store,
        engine: config.engine.clone(),
    };

    let app = router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Seawatch is listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    poller.shutdown().await;

    Ok(())
}
