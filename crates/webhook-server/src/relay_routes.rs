use std::collections::BTreeSet;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::AppState;

/// Registered relay endpoints. Owned by the server state rather than a
/// module-level global so its lifetime follows the process wiring.
#[derive(Debug, Default)]
pub struct RelayRegistry {
    urls: RwLock<BTreeSet<String>>,
}

impl RelayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(urls: impl IntoIterator<Item = String>) -> Self {
        Self {
            urls: RwLock::new(urls.into_iter().collect()),
        }
    }

    /// Returns false if the URL was already registered.
    pub async fn add(&self, url: String) -> bool {
        self.urls.write().await.insert(url)
    }

    pub async fn remove(&self, url: &str) -> bool {
        self.urls.write().await.remove(url)
    }

    pub async fn list(&self) -> Vec<String> {
        self.urls.read().await.iter().cloned().collect()
    }
}

#[derive(Deserialize)]
pub struct RelayRequest {
    pub url: String,
}

pub async fn list_relays(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "relays": state.relays.list().await }))
}

pub async fn add_relay(
    State(state): State<AppState>,
    Json(req): Json<RelayRequest>,
) -> (StatusCode, Json<Value>) {
    let url = req.url.trim().to_string();
    if url.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "url is required" })),
        );
    }

    state.relays.add(url.clone()).await;
    tracing::info!(%url, "added relay URL");
    (
        StatusCode::OK,
        Json(json!({ "ok": true, "relays": state.relays.list().await })),
    )
}

pub async fn remove_relay(
    State(state): State<AppState>,
    Json(req): Json<RelayRequest>,
) -> (StatusCode, Json<Value>) {
    let url = req.url.trim();
    if url.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "url is required" })),
        );
    }

    state.relays.remove(url).await;
    tracing::info!(%url, "removed relay URL");
    (
        StatusCode::OK,
        Json(json!({ "ok": true, "relays": state.relays.list().await })),
    )
}

/// Best-effort fan-out of a signal event to every registered relay. A failed
/// POST is logged and skipped; it never affects webhook handling.
pub async fn broadcast_to_relays(state: &AppState, event: Value) {
    for url in state.relays.list().await {
        if let Err(err) = state.http.post(&url).json(&event).send().await {
            tracing::error!(%url, error = %err, "relay POST failed");
        }
    }
}
