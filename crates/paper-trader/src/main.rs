use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use market_stream::BinanceTradeStream;
use webhook_server::{relay_routes::RelayRegistry, AppState};

mod config;
mod engine;

use config::Config;
use engine::Engine;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env, init tracing
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // Panic hook: log panic info before crashing
    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    // 2. Load configuration
    let config = Config::from_env()?;
    tracing::info!("Starting paper trader for {}", config.symbol);
    tracing::info!("  Order quantity: {}", config.order_qty);
    tracing::info!(
        "  Entry trigger/stop: +{}% / -{}%",
        config.entry_trigger_pct,
        config.entry_stop_pct
    );
    tracing::info!(
        "  Take profit / protective stop: +{}% / -{}%",
        config.take_profit_pct,
        config.protective_stop_pct
    );
    tracing::info!("  HTTP port: {}", config.port);

    // 3. Engine: single consumer of the serialized tick/signal stream
    let (event_tx, event_rx) = mpsc::channel(config.event_queue_size);
    let (engine, status_rx) = Engine::new(
        &config.symbol,
        config.anchor_policy(),
        config.order_qty,
        event_rx,
    );
    let engine_task = tokio::spawn(engine.run());

    // 4. Binance market stream (ticks)
    let mut stream = BinanceTradeStream::new(&config.symbol, event_tx.clone());
    if let Some(base) = &config.ws_url_base {
        stream = stream.with_url_base(base);
    }
    let stream = Arc::new(stream);
    let stream_task = {
        let stream = Arc::clone(&stream);
        tokio::spawn(async move { stream.run().await })
    };

    // 5. Webhook server + status API + dashboard
    let state = AppState {
        symbol: config.symbol.clone(),
        events: event_tx.clone(),
        status: status_rx,
        relays: Arc::new(RelayRegistry::seeded(config.relay_urls.clone())),
        http: reqwest::Client::new(),
    };
    if !config.relay_urls.is_empty() {
        tracing::info!("  Seeded {} relay URL(s)", config.relay_urls.len());
    }
    let server_task = tokio::spawn(webhook_server::serve(state, config.port));

    tracing::info!("System initialized. Press Ctrl+C to stop.");

    // 6. Orderly shutdown on Ctrl-C
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    stream.shutdown();
    server_task.abort();
    drop(event_tx);

    let _ = tokio::time::timeout(Duration::from_secs(5), stream_task).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), engine_task).await;

    Ok(())
}
