use rust_decimal::Decimal;
use tokio::sync::{mpsc, watch};

use trading_core::{
    AnchorPolicy, EngineEvent, PaperBroker, Signal, SignalBus, StatusSnapshot, TradingFsm,
};

type Fsm = TradingFsm<PaperBroker>;

/// Single consumer of the serialized tick/signal stream.
///
/// Owns the signal bus and the state machine (and, through it, the ledger),
/// so all trading state is mutated from one task with no locks. After every
/// event a fresh status snapshot is published for the HTTP boundary.
pub struct Engine {
    fsm: Fsm,
    bus: SignalBus<Fsm>,
    events: mpsc::Receiver<EngineEvent>,
    status: watch::Sender<StatusSnapshot>,
}

impl Engine {
    pub fn new(
        symbol: &str,
        policy: AnchorPolicy,
        order_qty: Decimal,
        events: mpsc::Receiver<EngineEvent>,
    ) -> (Self, watch::Receiver<StatusSnapshot>) {
        let fsm = TradingFsm::new(PaperBroker::new(symbol), policy, order_qty);

        let mut bus: SignalBus<Fsm> = SignalBus::new();
        bus.subscribe(|fsm, signal| fsm.on_signal(signal));
        bus.subscribe(|_, signal| {
            tracing::debug!(signal = signal.as_str(), "signal delivered");
            Ok(())
        });

        let (status_tx, status_rx) = watch::channel(fsm.status());
        (
            Self {
                fsm,
                bus,
                events,
                status: status_tx,
            },
            status_rx,
        )
    }

    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            match event {
                EngineEvent::Tick(tick) => {
                    if let Err(err) = self.fsm.on_tick(&tick) {
                        tracing::error!(error = %err, "tick handling failed");
                    }
                }
                EngineEvent::Signal(Signal::Buy) => self.bus.emit_buy(&mut self.fsm),
                EngineEvent::Signal(Signal::Sell) => self.bus.emit_sell(&mut self.fsm),
            }
            let _ = self.status.send(self.fsm.status());
        }
        tracing::info!("event channel closed, engine stopping");
    }
}
