use anyhow::Result;
use rust_decimal::Decimal;
use serde_json::json;

use crate::broker::Broker;
use crate::types::{Anchors, FsmState, PnlSnapshot, Position, Signal, StatusSnapshot, Tick};

/// Where triggers and stops sit relative to a reference price, as percent
/// offsets. This is configuration, not logic: substitute values to change
/// the breakout policy without touching the state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorPolicy {
    /// Entry trigger above the tick price when arming, in percent.
    pub entry_trigger_pct: Decimal,
    /// Invalidation stop below the tick price when arming, in percent.
    pub entry_stop_pct: Decimal,
    /// Take-profit trigger above the entry price, in percent.
    pub take_profit_pct: Decimal,
    /// Protective stop below the entry price, in percent.
    pub protective_stop_pct: Decimal,
}

impl Default for AnchorPolicy {
    fn default() -> Self {
        Self {
            entry_trigger_pct: Decimal::new(1, 1),    // 0.1%
            entry_stop_pct: Decimal::new(5, 1),       // 0.5%
            take_profit_pct: Decimal::ONE,            // 1.0%
            protective_stop_pct: Decimal::new(5, 1),  // 0.5%
        }
    }
}

impl AnchorPolicy {
    /// Breakout-entry anchors for an arming long, relative to the tick price.
    pub fn arm_anchors(&self, price: Decimal) -> Anchors {
        let hundred = Decimal::ONE_HUNDRED;
        Anchors {
            buy_entry_trigger: Some(price * (Decimal::ONE + self.entry_trigger_pct / hundred)),
            buy_stop: Some(price * (Decimal::ONE - self.entry_stop_pct / hundred)),
            sell_entry_trigger: None,
            sell_stop: None,
        }
    }

    /// Take-profit / protective-stop anchors for a held long, relative to
    /// the entry price.
    pub fn exit_anchors(&self, entry_price: Decimal) -> Anchors {
        let hundred = Decimal::ONE_HUNDRED;
        Anchors {
            buy_entry_trigger: None,
            buy_stop: None,
            sell_entry_trigger: Some(entry_price * (Decimal::ONE + self.take_profit_pct / hundred)),
            sell_stop: Some(entry_price * (Decimal::ONE - self.protective_stop_pct / hundred)),
        }
    }
}

/// The trading state machine: consumes ticks and signals, maintains anchor
/// price levels, and trades through the broker seam.
///
/// `Flat` → BUY signal → `ArmedLong` → price crosses the entry trigger →
/// `Long` → price crosses an exit anchor (or SELL signal) → `Flat`.
/// Runs for the process lifetime; no terminal state.
pub struct TradingFsm<B: Broker> {
    state: FsmState,
    anchors: Option<Anchors>,
    policy: AnchorPolicy,
    order_qty: Decimal,
    last_price: Option<Decimal>,
    broker: B,
}

impl<B: Broker> TradingFsm<B> {
    pub fn new(broker: B, policy: AnchorPolicy, order_qty: Decimal) -> Self {
        Self {
            state: FsmState::Flat,
            anchors: None,
            policy,
            order_qty,
            last_price: None,
            broker,
        }
    }

    /// Every tick marks the ledger first, then evaluates anchors.
    pub fn on_tick(&mut self, tick: &Tick) -> Result<()> {
        self.last_price = Some(tick.price);
        self.broker.mark_to_market(tick.price);

        match self.state {
            FsmState::Flat => Ok(()),
            FsmState::ArmedLong => self.evaluate_armed(tick.price),
            FsmState::Long => self.evaluate_long(tick.price),
        }
    }

    pub fn on_signal(&mut self, signal: Signal) -> Result<()> {
        match (self.state, signal) {
            (FsmState::Flat, Signal::Buy) => {
                let Some(price) = self.last_price else {
                    tracing::warn!("BUY signal before any tick, nothing to anchor against");
                    return Ok(());
                };
                let anchors = self.policy.arm_anchors(price);
                let trigger = anchors.buy_entry_trigger.unwrap_or_default();
                let stop = anchors.buy_stop.unwrap_or_default();
                tracing::info!(
                    reference = %price,
                    %trigger,
                    %stop,
                    "BUY signal: arming long"
                );
                self.anchors = Some(anchors);
                self.state = FsmState::ArmedLong;
                Ok(())
            }
            (FsmState::ArmedLong, Signal::Sell) => {
                tracing::info!("SELL signal while armed: disarming without entry");
                self.disarm();
                Ok(())
            }
            (FsmState::Long, Signal::Sell) => {
                let Some(price) = self.last_price else {
                    tracing::warn!("SELL signal while long but no mark price, ignoring");
                    return Ok(());
                };
                self.exit_long(price, "sell-signal")
            }
            (state, signal) => {
                tracing::debug!(
                    state = state.as_str(),
                    signal = signal.as_str(),
                    "signal ignored in current state"
                );
                Ok(())
            }
        }
    }

    fn evaluate_armed(&mut self, price: Decimal) -> Result<()> {
        let Some(anchors) = self.anchors.clone() else {
            tracing::error!("armed without anchors, returning to flat");
            self.disarm();
            return Ok(());
        };

        if let Some(trigger) = anchors.buy_entry_trigger {
            if price >= trigger {
                tracing::info!(%price, %trigger, "entry trigger crossed, opening long");
                self.broker.place_limit_buy(
                    self.order_qty,
                    trigger,
                    json!({ "reason": "breakout-entry", "trigger": trigger.to_string() }),
                )?;
                self.anchors = Some(self.policy.exit_anchors(trigger));
                self.state = FsmState::Long;
                return Ok(());
            }
        }

        if let Some(stop) = anchors.buy_stop {
            if price <= stop {
                tracing::info!(%price, %stop, "buy stop crossed, disarming");
                self.disarm();
            }
        }

        Ok(())
    }

    fn evaluate_long(&mut self, price: Decimal) -> Result<()> {
        let Some(anchors) = self.anchors.clone() else {
            // Exit anchors are gone but the position remains; close at market.
            tracing::error!("long without anchors, closing position");
            return self.exit_long(price, "missing-anchors");
        };

        if let Some(trigger) = anchors.sell_entry_trigger {
            if price >= trigger {
                tracing::info!(%price, %trigger, "take-profit trigger crossed, closing long");
                return self.exit_long(trigger, "take-profit");
            }
        }

        if let Some(stop) = anchors.sell_stop {
            if price <= stop {
                tracing::info!(%price, %stop, "protective stop crossed, closing long");
                return self.exit_long(stop, "protective-stop");
            }
        }

        Ok(())
    }

    /// Fully close the open position at the given price and return to flat.
    fn exit_long(&mut self, price: Decimal, reason: &str) -> Result<()> {
        let qty = self.broker.open_qty();
        self.broker
            .place_limit_sell(qty, price, json!({ "reason": reason }))?;
        self.disarm();
        Ok(())
    }

    fn disarm(&mut self) {
        self.anchors = None;
        self.state = FsmState::Flat;
    }

    // -- status boundary (pure reads, owned copies) --------------------------

    pub fn state(&self) -> FsmState {
        self.state
    }

    pub fn anchors(&self) -> Option<Anchors> {
        self.anchors.clone()
    }

    pub fn position(&self) -> Option<Position> {
        self.broker.position()
    }

    pub fn snapshot(&self) -> PnlSnapshot {
        self.broker.snapshot()
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state,
            position: self.position(),
            anchors: self.anchors(),
            pnl: self.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::PaperBroker;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    /// Broker wrapper that counts order calls so transition tests can assert
    /// "exactly one" order per crossing.
    struct CountingBroker {
        inner: PaperBroker,
        buys: Vec<(Decimal, Decimal)>,
        sells: Vec<(Decimal, Decimal)>,
    }

    impl CountingBroker {
        fn new() -> Self {
            Self {
                inner: PaperBroker::new("BTCUSDT"),
                buys: Vec::new(),
                sells: Vec::new(),
            }
        }
    }

    impl Broker for CountingBroker {
        fn place_limit_buy(
            &mut self,
            qty: Decimal,
            price: Decimal,
            meta: serde_json::Value,
        ) -> Result<PnlSnapshot> {
            self.buys.push((qty, price));
            self.inner.place_limit_buy(qty, price, meta)
        }

        fn place_limit_sell(
            &mut self,
            qty: Decimal,
            price: Decimal,
            meta: serde_json::Value,
        ) -> Result<PnlSnapshot> {
            self.sells.push((qty, price));
            self.inner.place_limit_sell(qty, price, meta)
        }

        fn open_qty(&self) -> Decimal {
            self.inner.open_qty()
        }

        fn mark_to_market(&mut self, price: Decimal) {
            self.inner.mark_to_market(price);
        }

        fn snapshot(&self) -> PnlSnapshot {
            self.inner.snapshot()
        }

        fn position(&self) -> Option<Position> {
            self.inner.position()
        }
    }

    fn tick(price: Decimal) -> Tick {
        Tick::new(price, Utc::now())
    }

    fn fsm() -> TradingFsm<CountingBroker> {
        TradingFsm::new(CountingBroker::new(), AnchorPolicy::default(), dec!(1))
    }

    #[test]
    fn buy_signal_arms_with_anchors() {
        let mut f = fsm();
        f.on_tick(&tick(dec!(100))).unwrap();
        f.on_signal(Signal::Buy).unwrap();

        assert_eq!(f.state(), FsmState::ArmedLong);
        let anchors = f.anchors().unwrap();
        assert_eq!(anchors.buy_entry_trigger, Some(dec!(100.1)));
        assert_eq!(anchors.buy_stop, Some(dec!(99.5)));
        assert_eq!(anchors.sell_entry_trigger, None);
    }

    #[test]
    fn buy_signal_before_first_tick_is_ignored() {
        let mut f = fsm();
        f.on_signal(Signal::Buy).unwrap();
        assert_eq!(f.state(), FsmState::Flat);
        assert!(f.anchors().is_none());
    }

    #[test]
    fn tick_below_trigger_leaves_armed_state() {
        let mut f = fsm();
        f.on_tick(&tick(dec!(100))).unwrap();
        f.on_signal(Signal::Buy).unwrap();

        f.on_tick(&tick(dec!(100.05))).unwrap();
        assert_eq!(f.state(), FsmState::ArmedLong);
        assert!(f.broker.buys.is_empty());
    }

    #[test]
    fn trigger_crossing_opens_exactly_one_long() {
        let mut f = fsm();
        f.on_tick(&tick(dec!(100))).unwrap();
        f.on_signal(Signal::Buy).unwrap();

        f.on_tick(&tick(dec!(100.1))).unwrap();
        assert_eq!(f.state(), FsmState::Long);
        assert_eq!(f.broker.buys, vec![(dec!(1), dec!(100.1))]);

        // Exit anchors are armed off the entry price.
        let anchors = f.anchors().unwrap();
        assert_eq!(anchors.sell_entry_trigger, Some(dec!(101.101)));
        assert_eq!(anchors.sell_stop, Some(dec!(99.5995)));
        assert_eq!(anchors.buy_entry_trigger, None);

        let pos = f.position().unwrap();
        assert_eq!(pos.qty, dec!(1));
        assert_eq!(pos.entry_price, dec!(100.1));
    }

    #[test]
    fn buy_stop_crossing_disarms_without_entry() {
        let mut f = fsm();
        f.on_tick(&tick(dec!(100))).unwrap();
        f.on_signal(Signal::Buy).unwrap();

        f.on_tick(&tick(dec!(99.5))).unwrap();
        assert_eq!(f.state(), FsmState::Flat);
        assert!(f.anchors().is_none());
        assert!(f.broker.buys.is_empty());
        assert!(f.position().is_none());
    }

    #[test]
    fn sell_signal_while_armed_disarms() {
        let mut f = fsm();
        f.on_tick(&tick(dec!(100))).unwrap();
        f.on_signal(Signal::Buy).unwrap();
        f.on_signal(Signal::Sell).unwrap();

        assert_eq!(f.state(), FsmState::Flat);
        assert!(f.broker.sells.is_empty());
    }

    #[test]
    fn protective_stop_closes_full_position() {
        let mut f = fsm();
        f.on_tick(&tick(dec!(100))).unwrap();
        f.on_signal(Signal::Buy).unwrap();
        f.on_tick(&tick(dec!(100.1))).unwrap();
        assert_eq!(f.state(), FsmState::Long);

        // 99.5995 is the protective stop for a 100.1 entry.
        f.on_tick(&tick(dec!(99.59))).unwrap();
        assert_eq!(f.state(), FsmState::Flat);
        assert_eq!(f.broker.sells, vec![(dec!(1), dec!(99.5995))]);
        assert!(f.anchors().is_none());
        assert!(f.position().is_none());
    }

    #[test]
    fn take_profit_closes_full_position() {
        let mut f = fsm();
        f.on_tick(&tick(dec!(100))).unwrap();
        f.on_signal(Signal::Buy).unwrap();
        f.on_tick(&tick(dec!(100.1))).unwrap();

        f.on_tick(&tick(dec!(101.2))).unwrap();
        assert_eq!(f.state(), FsmState::Flat);
        assert_eq!(f.broker.sells, vec![(dec!(1), dec!(101.101))]);

        let snap = f.snapshot();
        assert_eq!(snap.position_qty, Decimal::ZERO);
        assert!(snap.realized_pnl > Decimal::ZERO);
    }

    #[test]
    fn sell_signal_while_long_closes_at_mark() {
        let mut f = fsm();
        f.on_tick(&tick(dec!(100))).unwrap();
        f.on_signal(Signal::Buy).unwrap();
        f.on_tick(&tick(dec!(100.1))).unwrap();

        f.on_tick(&tick(dec!(100.5))).unwrap();
        f.on_signal(Signal::Sell).unwrap();

        assert_eq!(f.state(), FsmState::Flat);
        assert_eq!(f.broker.sells, vec![(dec!(1), dec!(100.5))]);
    }

    #[test]
    fn no_pyramiding_while_long() {
        let mut f = fsm();
        f.on_tick(&tick(dec!(100))).unwrap();
        f.on_signal(Signal::Buy).unwrap();
        f.on_tick(&tick(dec!(100.1))).unwrap();

        f.on_signal(Signal::Buy).unwrap();
        assert_eq!(f.state(), FsmState::Long);
        assert_eq!(f.broker.buys.len(), 1);
    }

    #[test]
    fn sell_signal_while_flat_is_ignored() {
        let mut f = fsm();
        f.on_tick(&tick(dec!(100))).unwrap();
        f.on_signal(Signal::Sell).unwrap();

        assert_eq!(f.state(), FsmState::Flat);
        assert!(f.broker.sells.is_empty());
    }

    #[test]
    fn every_tick_updates_the_mark_price() {
        let mut f = fsm();
        f.on_tick(&tick(dec!(123.45))).unwrap();
        assert_eq!(f.snapshot().last_price, Some(dec!(123.45)));

        f.on_signal(Signal::Buy).unwrap();
        f.on_tick(&tick(dec!(99))).unwrap();
        assert_eq!(f.snapshot().last_price, Some(dec!(99)));
    }

    #[test]
    fn status_reports_all_views() {
        let mut f = fsm();
        f.on_tick(&tick(dec!(100))).unwrap();
        f.on_signal(Signal::Buy).unwrap();

        let status = f.status();
        assert_eq!(status.state, FsmState::ArmedLong);
        assert!(status.position.is_none());
        assert!(status.anchors.is_some());
        assert_eq!(status.pnl.last_price, Some(dec!(100)));
    }
}
