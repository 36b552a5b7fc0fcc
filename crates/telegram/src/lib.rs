//! Telegram side of the relay: long-polls the signal chats and delivers
//! audit messages to the alerts chat.

pub mod alerts;
pub mod listener;

pub use alerts::TelegramAlerts;
pub use listener::ChatListener;
