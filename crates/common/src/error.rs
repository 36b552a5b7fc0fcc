use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Bridge API error: {0}")]
    Bridge(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Market data error: {0}")]
    Data(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
