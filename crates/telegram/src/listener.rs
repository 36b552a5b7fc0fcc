use std::time::Duration;

use teloxide::payloads::GetUpdatesSetters;
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, UpdateKind};
use teloxide::RequestError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use common::ChatEvent;

/// Long-poll timeout handed to `getUpdates`, in seconds.
const POLL_TIMEOUT_SECS: u32 = 30;
/// Pause after Telegram asks us to slow down.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(20);
/// Pause after any other transport failure.
const ERROR_BACKOFF: Duration = Duration::from_secs(60);

/// Polls Telegram for messages in the signal chats and forwards them to
/// the relay as [`ChatEvent`]s.
pub struct ChatListener {
    bot: Bot,
    chats: Vec<i64>,
    chat_tx: mpsc::Sender<ChatEvent>,
    offset: i32,
}

impl ChatListener {
    pub fn new(bot: Bot, chats: Vec<i64>, chat_tx: mpsc::Sender<ChatEvent>) -> Self {
        Self {
            bot,
            chats,
            chat_tx,
            offset: 0,
        }
    }

    /// Poll forever, backing off on transport errors. Returns once the relay
    /// has gone away. Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!(chats = ?self.chats, "Listening for signals (long-polling)");
        loop {
            match self.poll_once().await {
                Ok(true) => {}
                Ok(false) => {
                    warn!("Relay closed its chat queue, listener stopping");
                    return;
                }
                Err(e) => {
                    let backoff = backoff_for(&e);
                    warn!(error = %e, backoff = ?backoff, "Telegram polling failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    /// One `getUpdates` round trip. `Ok(false)` means the relay is gone.
    async fn poll_once(&mut self) -> Result<bool, RequestError> {
        let updates = self
            .bot
            .get_updates()
            .offset(self.offset)
            .timeout(POLL_TIMEOUT_SECS)
            .allowed_updates(vec![
                AllowedUpdate::Message,
                AllowedUpdate::EditedMessage,
                AllowedUpdate::ChannelPost,
                AllowedUpdate::EditedChannelPost,
            ])
            .await?;

        for update in updates {
            self.offset = update.id + 1;
            let Some(event) = chat_event(update.kind, &self.chats) else {
                continue;
            };
            debug!(chat = event.chat_id, edited = event.edited, "Chat event received");
            if self.chat_tx.send(event).await.is_err() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Pause before polling again after `e`.
pub fn backoff_for(e: &RequestError) -> Duration {
    match e {
        RequestError::RetryAfter(_) => RATE_LIMIT_BACKOFF,
        _ => ERROR_BACKOFF,
    }
}

/// Turn one update into a chat event if it is a text or captioned post in
/// one of `chats`. Edits keep the original send time.
pub fn chat_event(kind: UpdateKind, chats: &[i64]) -> Option<ChatEvent> {
    let (msg, edited) = match kind {
        UpdateKind::Message(msg) | UpdateKind::ChannelPost(msg) => (msg, false),
        UpdateKind::EditedMessage(msg) | UpdateKind::EditedChannelPost(msg) => (msg, true),
        _ => return None,
    };

    let chat_id = msg.chat.id.0;
    if !chats.contains(&chat_id) {
        return None;
    }

    let text = msg.text().or_else(|| msg.caption())?.to_string();
    let chat_title = msg
        .chat
        .title()
        .map(str::to_string)
        .unwrap_or_else(|| chat_id.to_string());

    Some(ChatEvent {
        chat_id,
        chat_title,
        text,
        sent_at: msg.date,
        edited,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use teloxide::types::Update;
    use teloxide::ApiError;

    const CHAT: i64 = -1001763228815;

    fn update(json: serde_json::Value) -> Update {
        serde_json::from_str(&json.to_string()).unwrap()
    }

    #[test]
    fn channel_post_from_watched_chat_is_forwarded() {
        let upd = update(serde_json::json!({
            "update_id": 10,
            "channel_post": {
                "message_id": 7,
                "date": 1_709_900_000,
                "chat": {"id": CHAT, "type": "channel", "title": "Gold VIP"},
                "text": "SELL GOLD NOW TP 1950 SL 1960"
            }
        }));
        let event = chat_event(upd.kind, &[CHAT]).unwrap();
        assert_eq!(event.chat_id, CHAT);
        assert_eq!(event.chat_title, "Gold VIP");
        assert_eq!(event.text, "SELL GOLD NOW TP 1950 SL 1960");
        assert_eq!(event.sent_at, Utc.timestamp_opt(1_709_900_000, 0).unwrap());
        assert!(!event.edited);
    }

    #[test]
    fn edit_keeps_original_date_and_is_flagged() {
        let upd = update(serde_json::json!({
            "update_id": 11,
            "edited_channel_post": {
                "message_id": 7,
                "date": 1_709_900_000,
                "edit_date": 1_709_900_030,
                "chat": {"id": CHAT, "type": "channel", "title": "Gold VIP"},
                "text": "SELL GOLD NOW TP 1945 SL 1960"
            }
        }));
        let event = chat_event(upd.kind, &[CHAT]).unwrap();
        assert!(event.edited);
        assert_eq!(event.sent_at, Utc.timestamp_opt(1_709_900_000, 0).unwrap());
    }

    #[test]
    fn photo_caption_stands_in_for_text() {
        let upd = update(serde_json::json!({
            "update_id": 13,
            "channel_post": {
                "message_id": 9,
                "date": 1_709_900_000,
                "chat": {"id": CHAT, "type": "channel", "title": "Gold VIP"},
                "photo": [{
                    "file_id": "AgACAgQAAx0CZ",
                    "file_unique_id": "AQADq7kxG",
                    "file_size": 1234,
                    "width": 90,
                    "height": 67
                }],
                "caption": "BUY GOLD NOW TP 1960 SL 1940"
            }
        }));
        let event = chat_event(upd.kind, &[CHAT]).unwrap();
        assert_eq!(event.text, "BUY GOLD NOW TP 1960 SL 1940");
    }

    #[test]
    fn rate_limit_waits_less_than_other_failures() {
        let limited = RequestError::RetryAfter(Duration::from_secs(5));
        assert_eq!(backoff_for(&limited), Duration::from_secs(20));
        let blocked = RequestError::Api(ApiError::BotBlocked);
        assert_eq!(backoff_for(&blocked), Duration::from_secs(60));
    }

    #[test]
    fn unwatched_chat_is_ignored() {
        let upd = update(serde_json::json!({
            "update_id": 12,
            "channel_post": {
                "message_id": 8,
                "date": 1_709_900_000,
                "chat": {"id": -100123, "type": "channel", "title": "Other"},
                "text": "BUY EURUSD"
            }
        }));
        assert!(chat_event(upd.kind, &[CHAT]).is_none());
    }
}
