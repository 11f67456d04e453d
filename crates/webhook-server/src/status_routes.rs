use axum::{extract::State, Json};

use trading_core::StatusSnapshot;

use crate::AppState;

/// Point-in-time engine status: FSM state, position, anchors and PnL, with
/// the exact field names the dashboard renders.
pub async fn get_status(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.status.borrow().clone())
}
