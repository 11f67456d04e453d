//! HTTP boundary: TradingView-style webhook intake, status API, relay
//! management and the HTML dashboard.

pub mod dashboard;
pub mod parse;
pub mod relay_routes;
pub mod status_routes;
pub mod webhook_routes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::{mpsc, watch};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use relay_routes::RelayRegistry;
use trading_core::{EngineEvent, StatusSnapshot};

#[derive(Clone)]
pub struct AppState {
    pub symbol: String,
    /// Fan-in into the engine's serialized event stream.
    pub events: mpsc::Sender<EngineEvent>,
    /// Latest engine-published status; reads are copy-on-read.
    pub status: watch::Receiver<StatusSnapshot>,
    pub relays: Arc<RelayRegistry>,
    pub http: reqwest::Client,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard::dashboard_page))
        .route("/webhook", post(webhook_routes::receive_webhook))
        .route("/status", get(status_routes::get_status))
        .route(
            "/relays",
            get(relay_routes::list_relays)
                .post(relay_routes::add_relay)
                .delete(relay_routes::remove_relay),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("webhook server + dashboard listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
