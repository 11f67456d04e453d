use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::parse::parse_signal_message;
use crate::relay_routes::broadcast_to_relays;
use crate::AppState;

/// TradingView-style webhook intake. The signal text may arrive under
/// `message`, `text` or `signal`; anything unusable is a 400.
pub async fn receive_webhook(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| body.get("text").and_then(Value::as_str))
        .or_else(|| body.get("signal").and_then(Value::as_str));

    let Some(message) = message else {
        tracing::warn!(body = %body, "webhook without usable message text");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing message text" })),
        );
    };

    let Some(side) = parse_signal_message(message) else {
        tracing::warn!(message, "unknown webhook message format");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Unknown message format" })),
        );
    };

    tracing::info!(side = side.as_str(), message, "received trading signal");

    if state
        .events
        .send(trading_core::EngineEvent::Signal(side))
        .await
        .is_err()
    {
        tracing::error!("engine event channel closed, dropping signal");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "engine unavailable" })),
        );
    }

    broadcast_to_relays(
        &state,
        json!({
            "type": "tradingview-signal",
            "side": side.as_str(),
            "rawMessage": message,
            "ts": Utc::now().timestamp_millis(),
        }),
    )
    .await;

    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
