use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use common::{AlertSink, CacheUpdate, ChatEvent, RelayConfig, ServerClock, TradeTerminal};
use gate::{decide, ContextCache, Decision};
use signal::Screen;

use crate::alert;
use crate::executor::OrderExecutor;

/// Cloneable handle passed to the listener and the refresh jobs.
#[derive(Clone)]
pub struct RelayHandle {
    chat_tx: mpsc::Sender<ChatEvent>,
    update_tx: mpsc::Sender<CacheUpdate>,
}

impl RelayHandle {
    /// Sender for chat events. The relay stops once every clone is dropped.
    pub fn chat_sender(&self) -> mpsc::Sender<ChatEvent> {
        self.chat_tx.clone()
    }

    /// Sender for cache updates from the refresh jobs.
    pub fn update_sender(&self) -> mpsc::Sender<CacheUpdate> {
        self.update_tx.clone()
    }
}

/// The relay actor: sole owner of the context cache.
///
/// Chat events and cache updates arrive on two queues. Pending updates are
/// applied before the next chat event is screened, and each decision reads
/// the cache without yielding in between.
pub struct Relay {
    screen: Screen,
    cache: ContextCache,
    clock: ServerClock,
    executor: OrderExecutor,
    alerts: Arc<dyn AlertSink>,
    chat_rx: mpsc::Receiver<ChatEvent>,
    update_rx: mpsc::Receiver<CacheUpdate>,
}

impl Relay {
    pub fn new(
        cfg: &RelayConfig,
        terminal: Arc<dyn TradeTerminal>,
        alerts: Arc<dyn AlertSink>,
    ) -> (Self, RelayHandle) {
        let (chat_tx, chat_rx) = mpsc::channel(64);
        let (update_tx, update_rx) = mpsc::channel(64);

        let handle = RelayHandle { chat_tx, update_tx };

        let relay = Relay {
            screen: Screen::from_config(cfg),
            cache: ContextCache::new(),
            clock: ServerClock::new(cfg.server_utc_offset_hours),
            executor: OrderExecutor::from_config(terminal, cfg),
            alerts,
            chat_rx,
            update_rx,
        };

        (relay, handle)
    }

    /// Run until the chat queue closes. Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!("Relay running, waiting for chat events");

        loop {
            tokio::select! {
                biased;

                Some(update) = self.update_rx.recv() => {
                    self.apply(update);
                }

                event = self.chat_rx.recv() => match event {
                    Some(event) => {
                        self.handle_chat(event).await;
                    }
                    None => {
                        warn!("Chat event channel closed, relay shutting down");
                        break;
                    }
                },
            }
        }
    }

    pub fn apply(&mut self, update: CacheUpdate) {
        debug!(symbol = %update.symbol(), "Applying cache update");
        self.cache.apply(update);
    }

    pub async fn handle_chat(&mut self, event: ChatEvent) -> Option<Decision> {
        self.handle_chat_at(event, Utc::now()).await
    }

    /// Screen, decide, trade and alert for one chat event observed at `now`.
    /// Returns the decision, or `None` when the message was screened out.
    pub async fn handle_chat_at(&mut self, event: ChatEvent, now: DateTime<Utc>) -> Option<Decision> {
        let signal = match self.screen.check(&event, now) {
            Ok(signal) => signal,
            Err(reason) => {
                debug!(chat = event.chat_id, edited = event.edited, %reason, "Message dropped");
                return None;
            }
        };

        let decision = decide(&signal, &self.cache, self.clock.at(now));
        info!(
            chat = %event.chat_title,
            symbol = %signal.symbol,
            direction = %signal.direction,
            decision = ?decision,
            "Signal screened"
        );

        let (failed, legs) = if decision.is_approved() {
            let execution = self.executor.execute(&signal).await;
            (execution.failed(), execution.legs.len())
        } else {
            (0, 0)
        };

        let text = alert::render(
            &decision,
            &event.chat_title,
            &event.text.to_uppercase(),
            failed,
            legs,
        );
        if let Err(e) = self.alerts.send_alert(&text).await {
            warn!(error = %e, "Failed to deliver alert");
        }

        Some(decision)
    }
}
