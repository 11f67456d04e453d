use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use trading_core::AnchorPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub symbol: String,
    pub port: u16,

    // Order sizing
    pub order_qty: Decimal,

    // Anchor offset policy (percent offsets from the reference price)
    pub entry_trigger_pct: Decimal,
    pub entry_stop_pct: Decimal,
    pub take_profit_pct: Decimal,
    pub protective_stop_pct: Decimal,

    // Transport
    pub ws_url_base: Option<String>,
    pub relay_urls: Vec<String>,
    pub event_queue_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            symbol: env::var("SYMBOL").unwrap_or_else(|_| "BTCUSDT".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("invalid PORT")?,

            order_qty: decimal_var("ORDER_QTY", "0.001")?,

            entry_trigger_pct: decimal_var("ENTRY_TRIGGER_PCT", "0.1")?,
            entry_stop_pct: decimal_var("ENTRY_STOP_PCT", "0.5")?,
            take_profit_pct: decimal_var("TAKE_PROFIT_PCT", "1.0")?,
            protective_stop_pct: decimal_var("PROTECTIVE_STOP_PCT", "0.5")?,

            ws_url_base: env::var("BINANCE_WS_URL").ok(),
            relay_urls: env::var("RELAY_URLS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            event_queue_size: env::var("EVENT_QUEUE_SIZE")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .context("invalid EVENT_QUEUE_SIZE")?,
        })
    }

    pub fn anchor_policy(&self) -> AnchorPolicy {
        AnchorPolicy {
            entry_trigger_pct: self.entry_trigger_pct,
            entry_stop_pct: self.entry_stop_pct,
            take_profit_pct: self.take_profit_pct,
            protective_stop_pct: self.protective_stop_pct,
        }
    }
}

fn decimal_var(key: &str, default: &str) -> Result<Decimal> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    Decimal::from_str(&raw).with_context(|| format!("invalid {key}: {raw}"))
}
