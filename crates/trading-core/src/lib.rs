//! Decision-and-bookkeeping core of the paper trading engine.
//!
//! Pure synchronous, lock-free code: the signal bus, the PnL ledger, the
//! paper broker and the trading state machine. Transport (market stream,
//! webhook server, dashboard) lives in the sibling crates and feeds this
//! core through one serialized event stream.

pub mod broker;
pub mod bus;
pub mod fsm;
pub mod ledger;
pub mod types;

#[cfg(test)]
mod tests;

pub use broker::{Broker, PaperBroker};
pub use bus::SignalBus;
pub use fsm::{AnchorPolicy, TradingFsm};
pub use ledger::{LedgerError, OrderFill, PnlLedger};
pub use types::{
    Anchors, EngineEvent, FsmState, OrderSide, PnlSnapshot, Position, PositionSide, Signal,
    StatusSnapshot, Tick, TradeKind, TradeRecord,
};
