use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Market events
// ---------------------------------------------------------------------------

/// A single trade-stream tick. Not retained beyond the current evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub price: Decimal,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
}

impl Tick {
    pub fn new(price: Decimal, ts: DateTime<Utc>) -> Self {
        Self { price, ts }
    }
}

/// Directional signal from the webhook boundary. Carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
        }
    }
}

/// The serialized event stream feeding the engine task. Ticks and signals
/// from independent listeners are funneled through one of these so the core
/// never observes concurrent mutation.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Tick(Tick),
    Signal(Signal),
}

// ---------------------------------------------------------------------------
// Position and anchors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Long,
    Flat,
}

/// Long-only position view. `qty == 0` iff `side == Flat` iff
/// `entry_price == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub side: PositionSide,
    pub qty: Decimal,
    pub entry_price: Decimal,
}

/// Price levels the state machine watches to decide entry or exit.
/// Recomputed on every state transition, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchors {
    pub buy_entry_trigger: Option<Decimal>,
    pub buy_stop: Option<Decimal>,
    pub sell_entry_trigger: Option<Decimal>,
    pub sell_stop: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Trade history and PnL projection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeKind {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// One entry in the append-only trade history. Field names are the
/// dashboard's trade-table contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TradeKind,
    pub side: OrderSide,
    pub qty: Decimal,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl: Option<Decimal>,
    pub meta: serde_json::Value,
}

/// Read-only ledger projection, computed on demand and never cached stale.
/// `total_pnl == realized_pnl + unrealized_pnl` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlSnapshot {
    pub symbol: String,
    pub position_qty: Decimal,
    pub avg_price: Decimal,
    pub last_price: Option<Decimal>,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub total_pnl: Decimal,
    pub trade_count: u64,
    pub trades: Vec<TradeRecord>,
}

// ---------------------------------------------------------------------------
// State machine surface
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FsmState {
    Flat,
    ArmedLong,
    Long,
}

impl FsmState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FsmState::Flat => "FLAT",
            FsmState::ArmedLong => "ARMED_LONG",
            FsmState::Long => "LONG",
        }
    }
}

/// Point-in-time view of the whole engine, published to the status boundary.
/// Always an owned copy, never a reference into live internal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub state: FsmState,
    pub position: Option<Position>,
    pub anchors: Option<Anchors>,
    pub pnl: PnlSnapshot,
}
