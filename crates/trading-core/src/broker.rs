use anyhow::Result;
use rust_decimal::Decimal;

use crate::ledger::{OrderFill, PnlLedger};
use crate::types::{PnlSnapshot, Position};

/// The order seam the state machine trades through. A real gateway would sit
/// behind this; here only the paper implementation exists.
pub trait Broker {
    fn place_limit_buy(
        &mut self,
        qty: Decimal,
        price: Decimal,
        meta: serde_json::Value,
    ) -> Result<PnlSnapshot>;

    fn place_limit_sell(
        &mut self,
        qty: Decimal,
        price: Decimal,
        meta: serde_json::Value,
    ) -> Result<PnlSnapshot>;

    fn open_qty(&self) -> Decimal;

    /// Forward the latest observed price to the ledger mark.
    fn mark_to_market(&mut self, price: Decimal);

    fn snapshot(&self) -> PnlSnapshot;

    fn position(&self) -> Option<Position>;
}

/// Simulated order gateway: no matching, no partial fills, no rejections.
/// Every order fills completely and immediately at the given price, with one
/// audit log record and one ledger mutation per call.
pub struct PaperBroker {
    symbol: String,
    ledger: PnlLedger,
}

impl PaperBroker {
    pub fn new(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            ledger: PnlLedger::new(symbol.clone()),
            symbol,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Broker for PaperBroker {
    fn place_limit_buy(
        &mut self,
        qty: Decimal,
        price: Decimal,
        meta: serde_json::Value,
    ) -> Result<PnlSnapshot> {
        tracing::info!(symbol = %self.symbol, %qty, %price, %meta, "paper LIMIT BUY");
        Ok(self.ledger.open_position(OrderFill::buy(qty, price, meta)))
    }

    fn place_limit_sell(
        &mut self,
        qty: Decimal,
        price: Decimal,
        meta: serde_json::Value,
    ) -> Result<PnlSnapshot> {
        tracing::info!(symbol = %self.symbol, %qty, %price, %meta, "paper LIMIT SELL");
        let snapshot = self.ledger.close_position(OrderFill::sell(qty, price, meta))?;
        Ok(snapshot)
    }

    fn open_qty(&self) -> Decimal {
        self.ledger.open_qty()
    }

    fn mark_to_market(&mut self, price: Decimal) {
        self.ledger.update_mark_price(price);
    }

    fn snapshot(&self) -> PnlSnapshot {
        self.ledger.snapshot()
    }

    fn position(&self) -> Option<Position> {
        self.ledger.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn buy_then_sell_round_trip() {
        let mut broker = PaperBroker::new("BTCUSDT");

        let snap = broker
            .place_limit_buy(dec!(0.5), dec!(40000), json!({"reason": "test"}))
            .unwrap();
        assert_eq!(snap.position_qty, dec!(0.5));
        assert_eq!(broker.open_qty(), dec!(0.5));

        let snap = broker
            .place_limit_sell(dec!(0.5), dec!(41000), json!({}))
            .unwrap();
        assert_eq!(snap.position_qty, Decimal::ZERO);
        assert_eq!(snap.realized_pnl, dec!(500.0));
    }

    #[test]
    fn fills_are_complete_and_immediate() {
        let mut broker = PaperBroker::new("BTCUSDT");
        broker
            .place_limit_buy(dec!(2), dec!(100), json!({}))
            .unwrap();

        // The full quantity is on the book right away; no pending orders.
        assert_eq!(broker.open_qty(), dec!(2));
        assert_eq!(broker.snapshot().trade_count, 1);
    }

    #[test]
    fn mark_to_market_passes_through() {
        let mut broker = PaperBroker::new("BTCUSDT");
        broker
            .place_limit_buy(dec!(1), dec!(100), json!({}))
            .unwrap();
        broker.mark_to_market(dec!(110));
        assert_eq!(broker.snapshot().unrealized_pnl, dec!(10));
    }
}
