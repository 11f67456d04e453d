//! Binance trade-stream websocket client: the tick source for the engine.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use trading_core::{EngineEvent, Tick};

const BINANCE_WS_BASE: &str = "wss://stream.binance.com:9443/ws";

/// Streams `<symbol>@trade` events and forwards each parsed tick into the
/// engine's event channel. Reconnects after 5 seconds on error; a decode
/// failure is logged and the message skipped.
pub struct BinanceTradeStream {
    symbol: String,
    url_base: String,
    events: mpsc::Sender<EngineEvent>,
    shutdown: Arc<tokio::sync::Notify>,
}

impl BinanceTradeStream {
    pub fn new(symbol: impl Into<String>, events: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            symbol: symbol.into(),
            url_base: BINANCE_WS_BASE.to_string(),
            events,
            shutdown: Arc::new(tokio::sync::Notify::new()),
        }
    }

    /// Override the websocket endpoint (testnets, local mocks).
    pub fn with_url_base(mut self, base: impl Into<String>) -> Self {
        self.url_base = base.into();
        self
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    pub async fn run(&self) {
        loop {
            match self.connect_and_stream().await {
                Ok(()) => {
                    tracing::info!("market stream disconnected gracefully");
                    break;
                }
                Err(e) => {
                    tracing::warn!("market stream error: {}, reconnecting in 5s", e);
                    tokio::select! {
                        _ = tokio::time::sleep(std::time::Duration::from_secs(5)) => {}
                        _ = self.shutdown.notified() => {
                            tracing::info!("market stream shutdown requested");
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn connect_and_stream(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/{}@trade", self.url_base, self.symbol.to_lowercase());
        let (ws_stream, _) = connect_async(url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();
        tracing::info!(symbol = %self.symbol, "connected to Binance trade stream");

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            match parse_trade(&text) {
                                Some(tick) => {
                                    if self.events.send(EngineEvent::Tick(tick)).await.is_err() {
                                        tracing::info!("engine gone, stopping market stream");
                                        return Ok(());
                                    }
                                }
                                None => {
                                    tracing::debug!(%text, "unparseable trade message, skipping");
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!("market stream connection closed");
                            return Ok(());
                        }
                        Some(Err(e)) => {
                            return Err(Box::new(e));
                        }
                        _ => {}
                    }
                }
                _ = self.shutdown.notified() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
            }
        }
    }
}

/// Decode one Binance `@trade` event (`p` price string, `T` trade time in
/// epoch millis) into a tick.
fn parse_trade(text: &str) -> Option<Tick> {
    let msg: serde_json::Value = serde_json::from_str(text).ok()?;
    let price = Decimal::from_str(msg.get("p")?.as_str()?).ok()?;
    let ts = msg
        .get("T")
        .and_then(|v| v.as_i64())
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_else(Utc::now);
    Some(Tick::new(price, ts))
}
