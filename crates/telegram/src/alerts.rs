use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::debug;

use common::{AlertSink, Error, Result};

/// Posts audit messages to one Telegram chat.
pub struct TelegramAlerts {
    bot: Bot,
    chat: ChatId,
}

impl TelegramAlerts {
    pub fn new(bot: Bot, chat_id: i64) -> Self {
        Self {
            bot,
            chat: ChatId(chat_id),
        }
    }
}

#[async_trait]
impl AlertSink for TelegramAlerts {
    async fn send_alert(&self, text: &str) -> Result<()> {
        self.bot
            .send_message(self.chat, text)
            .await
            .map_err(|e| Error::Telegram(e.to_string()))?;
        debug!(chat = self.chat.0, "Alert delivered");
        Ok(())
    }
}
