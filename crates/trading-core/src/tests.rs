//! End-to-end scenarios across the bus, state machine, broker and ledger.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::broker::{Broker, PaperBroker};
use crate::bus::SignalBus;
use crate::fsm::{AnchorPolicy, TradingFsm};
use crate::types::{FsmState, Signal, Tick, TradeKind};

type Engine = TradingFsm<PaperBroker>;

fn engine() -> (SignalBus<Engine>, Engine) {
    let mut bus: SignalBus<Engine> = SignalBus::new();
    bus.subscribe(|fsm, signal| fsm.on_signal(signal));
    let fsm = TradingFsm::new(
        PaperBroker::new("BTCUSDT"),
        AnchorPolicy::default(),
        dec!(1),
    );
    (bus, fsm)
}

fn tick(fsm: &mut Engine, price: Decimal) {
    fsm.on_tick(&Tick::new(price, Utc::now())).unwrap();
}

#[test]
fn breakout_entry_and_take_profit_round_trip() {
    let (mut bus, mut fsm) = engine();

    tick(&mut fsm, dec!(100));
    bus.emit_buy(&mut fsm);
    assert_eq!(fsm.state(), FsmState::ArmedLong);

    // Below the 100.1 trigger: still armed, no position.
    tick(&mut fsm, dec!(100.05));
    assert_eq!(fsm.state(), FsmState::ArmedLong);
    assert!(fsm.position().is_none());

    // Crossing the trigger enters at the trigger price.
    tick(&mut fsm, dec!(100.2));
    assert_eq!(fsm.state(), FsmState::Long);
    let pos = fsm.position().unwrap();
    assert_eq!(pos.entry_price, dec!(100.1));

    // Crossing the 101.101 take-profit flattens with positive realized PnL.
    tick(&mut fsm, dec!(101.2));
    assert_eq!(fsm.state(), FsmState::Flat);
    let snap = fsm.snapshot();
    assert_eq!(snap.position_qty, Decimal::ZERO);
    assert_eq!(snap.realized_pnl, dec!(1.001));
    assert_eq!(snap.trade_count, 2);
    assert_eq!(snap.trades[0].kind, TradeKind::Open);
    assert_eq!(snap.trades[1].kind, TradeKind::Close);
}

#[test]
fn sell_signal_through_the_bus_closes_the_long() {
    let (mut bus, mut fsm) = engine();

    tick(&mut fsm, dec!(100));
    bus.emit_buy(&mut fsm);
    tick(&mut fsm, dec!(100.1));
    assert_eq!(fsm.state(), FsmState::Long);

    tick(&mut fsm, dec!(100.8));
    bus.emit_sell(&mut fsm);

    assert_eq!(fsm.state(), FsmState::Flat);
    let snap = fsm.snapshot();
    // Entered at 100.1, sold at the 100.8 mark.
    assert_eq!(snap.realized_pnl, dec!(0.7));
    assert_eq!(snap.total_pnl, snap.realized_pnl);
}

#[test]
fn ignored_signals_leave_no_trace() {
    let (mut bus, mut fsm) = engine();

    // SELL while flat, BUY before any tick: both no-ops.
    bus.emit_sell(&mut fsm);
    bus.emit_buy(&mut fsm);
    assert_eq!(fsm.state(), FsmState::Flat);
    assert_eq!(fsm.snapshot().trade_count, 0);

    // BUY while already armed changes nothing.
    tick(&mut fsm, dec!(100));
    bus.emit_buy(&mut fsm);
    let armed = fsm.anchors();
    bus.emit_buy(&mut fsm);
    assert_eq!(fsm.anchors(), armed);
}

#[test]
fn total_pnl_identity_holds_across_the_lifecycle() {
    let (mut bus, mut fsm) = engine();

    tick(&mut fsm, dec!(100));
    bus.emit_buy(&mut fsm);
    tick(&mut fsm, dec!(100.1));
    tick(&mut fsm, dec!(100.6));

    let snap = fsm.snapshot();
    assert_eq!(snap.total_pnl, snap.realized_pnl + snap.unrealized_pnl);
    assert_eq!(snap.unrealized_pnl, dec!(0.5));

    tick(&mut fsm, dec!(101.2));
    let snap = fsm.snapshot();
    assert_eq!(snap.unrealized_pnl, Decimal::ZERO);
    assert_eq!(snap.total_pnl, snap.realized_pnl);
}

#[test]
fn reentry_after_full_cycle_starts_clean() {
    let (mut bus, mut fsm) = engine();

    tick(&mut fsm, dec!(100));
    bus.emit_buy(&mut fsm);
    tick(&mut fsm, dec!(100.1));
    tick(&mut fsm, dec!(101.2));
    assert_eq!(fsm.state(), FsmState::Flat);

    // Second cycle arms off the new reference price, not the old one.
    tick(&mut fsm, dec!(200));
    bus.emit_buy(&mut fsm);
    let anchors = fsm.anchors().unwrap();
    assert_eq!(anchors.buy_entry_trigger, Some(dec!(200.2)));
    assert_eq!(anchors.buy_stop, Some(dec!(199.0)));
}
