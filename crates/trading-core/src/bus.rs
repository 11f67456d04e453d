use anyhow::Result;

use crate::types::Signal;

type Handler<C> = Box<dyn FnMut(&mut C, Signal) -> Result<()> + Send>;

/// Process-wide publish/subscribe channel for BUY/SELL signals.
///
/// Delivery is synchronous and in registration order. There is no buffering
/// and no replay: a subscriber registered after an emission never observes
/// it. A handler that returns an error is logged and skipped; it does not
/// prevent delivery to later subscribers.
///
/// Handlers receive a `&mut C` context so the state machine can subscribe
/// without the bus and the machine sharing mutable ownership.
pub struct SignalBus<C> {
    subscribers: Vec<Handler<C>>,
}

impl<C> SignalBus<C> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Register a handler for both signal kinds.
    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: FnMut(&mut C, Signal) -> Result<()> + Send + 'static,
    {
        self.subscribers.push(Box::new(handler));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn emit_buy(&mut self, ctx: &mut C) {
        self.emit(ctx, Signal::Buy);
    }

    pub fn emit_sell(&mut self, ctx: &mut C) {
        self.emit(ctx, Signal::Sell);
    }

    fn emit(&mut self, ctx: &mut C, signal: Signal) {
        for (idx, handler) in self.subscribers.iter_mut().enumerate() {
            if let Err(err) = handler(ctx, signal) {
                tracing::warn!(
                    signal = signal.as_str(),
                    subscriber = idx,
                    error = %err,
                    "signal handler failed, continuing delivery"
                );
            }
        }
    }
}

impl<C> Default for SignalBus<C> {
    fn default() -> Self {
        Self::new()
    }
}
