use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{Config, RelayConfig, ServerClock, TradeTerminal, TradingMode};
use engine::{BridgeClient, Refresher, Relay, RetryPolicy};
use paper::PaperTerminal;
use telegram_relay::{ChatListener, TelegramAlerts};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    let relay_cfg = RelayConfig::load(&cfg.relay_config_path);
    info!(
        mode = %cfg.trading_mode,
        symbols = relay_cfg.symbols.len(),
        chats = relay_cfg.signal_chats.len(),
        "Signal relay starting"
    );

    // ── Bridge (market data always, orders in live mode) ─────────────────────
    let bridge = Arc::new(
        BridgeClient::new(&cfg.bridge_url, &cfg.bridge_api_key, &cfg.bridge_secret)
            .context("failed to set up the bridge client")?,
    );

    let terminal: Arc<dyn TradeTerminal> = match cfg.trading_mode {
        TradingMode::Live => {
            info!(url = %cfg.bridge_url, "Live trading mode, orders go to the bridge");
            bridge.clone()
        }
        TradingMode::Paper => {
            info!("Paper trading mode, orders are only recorded");
            Arc::new(PaperTerminal::new())
        }
    };

    // ── Telegram ──────────────────────────────────────────────────────────────
    let bot = Bot::new(cfg.telegram_token.clone());
    let alerts = Arc::new(TelegramAlerts::new(bot.clone(), relay_cfg.alerts_chat));

    // ── Relay actor ───────────────────────────────────────────────────────────
    let (relay, handle) = Relay::new(&relay_cfg, terminal, alerts);

    // ── Refresh jobs ──────────────────────────────────────────────────────────
    let refresher = Arc::new(Refresher::new(
        bridge,
        relay_cfg.symbols.clone(),
        ServerClock::new(relay_cfg.server_utc_offset_hours),
        RetryPolicy::new(relay_cfg.retry_attempts),
        handle.update_sender(),
    ));
    let period = Duration::from_secs(relay_cfg.refresh_interval_secs.max(1));

    // ── Listener ──────────────────────────────────────────────────────────────
    let listener = ChatListener::new(bot, relay_cfg.signal_chats.clone(), handle.chat_sender());
    drop(handle);

    // ── Spawn all tasks ───────────────────────────────────────────────────────
    tokio::spawn(relay.run());
    tokio::spawn(refresher.clone().run_news(period));
    tokio::spawn(refresher.run_trends(period));
    tokio::spawn(listener.run());

    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutdown signal received. Exiting.");
    Ok(())
}
