use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{Bar, NewsEvent, OrderReceipt, OrderTicket, Result, Symbol};

/// Abstraction over the order-placing side of the trading terminal.
///
/// `BridgeClient` implements this for live trading.
/// `PaperTerminal` implements this for dry runs.
///
/// Only `OrderExecutor` in `crates/engine` submits orders, and only for
/// signals the decision gate approved.
#[async_trait]
pub trait TradeTerminal: Send + Sync {
    /// Place one market order leg and return the terminal's confirmation.
    async fn submit_order(&self, ticket: &OrderTicket) -> Result<OrderReceipt>;
}

/// Read-only market context served by the terminal.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Economic calendar entries for `symbol` between two server-time dates.
    async fn calendar(&self, symbol: Symbol, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<NewsEvent>>;

    /// Historical candles at `timeframe` (e.g. `"M30"`), oldest first.
    async fn history(
        &self,
        symbol: Symbol,
        timeframe: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>>;
}

/// Destination for the human-readable audit messages.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send_alert(&self, text: &str) -> Result<()>;
}
