use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{OrderSide, PnlSnapshot, Position, PositionSide, TradeKind, TradeRecord};

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Post-clamp negative quantity means the bookkeeping itself is broken.
    /// The offending operation is aborted without touching the ledger.
    #[error("position quantity would go negative: {0}")]
    NegativeQuantity(Decimal),
}

/// A simulated fill to record against the ledger.
#[derive(Debug, Clone)]
pub struct OrderFill {
    pub side: OrderSide,
    pub qty: Decimal,
    pub price: Decimal,
    pub meta: serde_json::Value,
}

impl OrderFill {
    pub fn buy(qty: Decimal, price: Decimal, meta: serde_json::Value) -> Self {
        Self {
            side: OrderSide::Buy,
            qty,
            price,
            meta,
        }
    }

    pub fn sell(qty: Decimal, price: Decimal, meta: serde_json::Value) -> Self {
        Self {
            side: OrderSide::Sell,
            qty,
            price,
            meta,
        }
    }
}

/// In-memory position and PnL bookkeeping for one symbol, long-only.
///
/// Owns the position quantity, average entry price, cumulative realized PnL
/// and the append-only trade history. Lives for the process lifetime; no
/// persistence.
#[derive(Debug)]
pub struct PnlLedger {
    symbol: String,
    position_qty: Decimal,
    avg_price: Decimal,
    last_price: Option<Decimal>,
    realized_pnl: Decimal,
    trades: Vec<TradeRecord>,
}

impl PnlLedger {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            position_qty: Decimal::ZERO,
            avg_price: Decimal::ZERO,
            last_price: None,
            realized_pnl: Decimal::ZERO,
            trades: Vec::new(),
        }
    }

    /// Record the latest observed market price. Never trades, never fails.
    pub fn update_mark_price(&mut self, price: Decimal) {
        self.last_price = Some(price);
    }

    pub fn open_qty(&self) -> Decimal {
        self.position_qty
    }

    /// Position view for the status boundary; `None` while flat.
    pub fn position(&self) -> Option<Position> {
        if self.position_qty.is_zero() {
            return None;
        }
        Some(Position {
            side: PositionSide::Long,
            qty: self.position_qty,
            entry_price: self.avg_price,
        })
    }

    fn unrealized_pnl(&self) -> Decimal {
        match self.last_price {
            Some(last) if !self.position_qty.is_zero() => {
                (last - self.avg_price) * self.position_qty
            }
            _ => Decimal::ZERO,
        }
    }

    /// Owned point-in-time projection, computed on demand.
    pub fn snapshot(&self) -> PnlSnapshot {
        let unrealized_pnl = self.unrealized_pnl();
        PnlSnapshot {
            symbol: self.symbol.clone(),
            position_qty: self.position_qty,
            avg_price: self.avg_price,
            last_price: self.last_price,
            realized_pnl: self.realized_pnl,
            unrealized_pnl,
            total_pnl: self.realized_pnl + unrealized_pnl,
            trade_count: self.trades.len() as u64,
            trades: self.trades.clone(),
        }
    }

    /// Record a BUY fill: quantity-weighted average entry price, incremented
    /// position, OPEN trade record. Any other side is a logged no-op.
    pub fn open_position(&mut self, fill: OrderFill) -> PnlSnapshot {
        if fill.side != OrderSide::Buy {
            tracing::warn!(side = ?fill.side, "open_position requires a BUY fill, ignoring");
            return self.snapshot();
        }

        let total_cost = self.avg_price * self.position_qty + fill.price * fill.qty;
        self.position_qty += fill.qty;
        self.avg_price = if self.position_qty > Decimal::ZERO {
            total_cost / self.position_qty
        } else {
            Decimal::ZERO
        };

        self.trades.push(TradeRecord {
            ts: Utc::now(),
            kind: TradeKind::Open,
            side: OrderSide::Buy,
            qty: fill.qty,
            price: fill.price,
            pnl: None,
            meta: fill.meta,
        });

        self.snapshot()
    }

    /// Record a SELL fill against the held position. The quantity is clamped
    /// to the held quantity so the ledger can always reach flat; a full close
    /// resets quantity and average price to exactly zero. Any other side is a
    /// logged no-op.
    pub fn close_position(&mut self, fill: OrderFill) -> Result<PnlSnapshot, LedgerError> {
        if fill.side != OrderSide::Sell {
            tracing::warn!(side = ?fill.side, "close_position requires a SELL fill, ignoring");
            return Ok(self.snapshot());
        }

        let mut qty = fill.qty;
        if qty > self.position_qty {
            tracing::warn!(
                requested = %qty,
                held = %self.position_qty,
                "close exceeds held quantity, clamping"
            );
            qty = self.position_qty;
        }

        let remaining = self.position_qty - qty;
        if remaining < Decimal::ZERO {
            return Err(LedgerError::NegativeQuantity(remaining));
        }

        let pnl = (fill.price - self.avg_price) * qty;
        self.realized_pnl += pnl;
        self.position_qty = remaining;
        if self.position_qty <= Decimal::ZERO {
            self.position_qty = Decimal::ZERO;
            self.avg_price = Decimal::ZERO;
        }

        self.trades.push(TradeRecord {
            ts: Utc::now(),
            kind: TradeKind::Close,
            side: OrderSide::Sell,
            qty,
            price: fill.price,
            pnl: Some(pnl),
            meta: fill.meta,
        });

        Ok(self.snapshot())
    }
}
