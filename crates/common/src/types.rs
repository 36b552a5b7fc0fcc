use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Instruments the relay knows how to recognise and trade.
///
/// Declaration order is the canonical precedence used when a message
/// mentions more than one instrument: see [`Symbol::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Symbol {
    Xauusd,
    Eurusd,
    Audusd,
    Nzdusd,
    Gbpusd,
    Audcad,
    Nzdcad,
    Eurgbp,
    Audjpy,
    Usdjpy,
    Cadjpy,
    Chfjpy,
    Gbpjpy,
    Euraud,
}

impl Symbol {
    /// Every symbol, in match precedence order. The first symbol whose
    /// keyword appears in a message wins, so reordering this list changes
    /// which instrument an ambiguous message resolves to.
    pub const ALL: [Symbol; 14] = [
        Symbol::Xauusd,
        Symbol::Eurusd,
        Symbol::Audusd,
        Symbol::Nzdusd,
        Symbol::Gbpusd,
        Symbol::Audcad,
        Symbol::Nzdcad,
        Symbol::Eurgbp,
        Symbol::Audjpy,
        Symbol::Usdjpy,
        Symbol::Cadjpy,
        Symbol::Chfjpy,
        Symbol::Gbpjpy,
        Symbol::Euraud,
    ];

    /// Terminal code, e.g. `"XAUUSD"`.
    pub fn code(&self) -> &'static str {
        match self {
            Symbol::Xauusd => "XAUUSD",
            Symbol::Eurusd => "EURUSD",
            Symbol::Audusd => "AUDUSD",
            Symbol::Nzdusd => "NZDUSD",
            Symbol::Gbpusd => "GBPUSD",
            Symbol::Audcad => "AUDCAD",
            Symbol::Nzdcad => "NZDCAD",
            Symbol::Eurgbp => "EURGBP",
            Symbol::Audjpy => "AUDJPY",
            Symbol::Usdjpy => "USDJPY",
            Symbol::Cadjpy => "CADJPY",
            Symbol::Chfjpy => "CHFJPY",
            Symbol::Gbpjpy => "GBPJPY",
            Symbol::Euraud => "EURAUD",
        }
    }

    /// Upper-case keywords that identify this symbol in free text.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Symbol::Xauusd => &["XAUUSD", "XAU/USD", "GOLD"],
            Symbol::Eurusd => &["EURUSD", "EUR/USD", "EURO"],
            Symbol::Audusd => &["AUDUSD", "AUD/USD"],
            Symbol::Nzdusd => &["NZDUSD", "NZD/USD"],
            Symbol::Gbpusd => &["GBPUSD", "GBP/USD"],
            Symbol::Audcad => &["AUDCAD", "AUD/CAD"],
            Symbol::Nzdcad => &["NZDCAD", "NZD/CAD"],
            Symbol::Eurgbp => &["EURGBP", "EUR/GBP"],
            Symbol::Audjpy => &["AUDJPY", "AUD/JPY"],
            Symbol::Usdjpy => &["USDJPY", "USD/JPY"],
            Symbol::Cadjpy => &["CADJPY", "CAD/JPY"],
            Symbol::Chfjpy => &["CHFJPY", "CHF/JPY"],
            Symbol::Gbpjpy => &["GBPJPY", "GBP/JPY"],
            Symbol::Euraud => &["EURAUD", "EUR/AUD"],
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// A trade instruction parsed out of one chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: Symbol,
    pub direction: Direction,
    /// One entry per order leg. Never empty: `[None]` is a single leg
    /// without a profit target.
    pub take_profits: Vec<Option<f64>>,
    pub stop_loss: Option<f64>,
}

/// Scheduled economic calendar event, stamped in server time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEvent {
    pub symbol: Symbol,
    pub name: String,
    pub scheduled_at: NaiveDateTime,
    pub impact: u8,
}

impl NewsEvent {
    /// Impact above this level is considered market-moving.
    pub const HIGH_IMPACT_THRESHOLD: u8 = 1;

    pub fn is_high_impact(&self) -> bool {
        self.impact > Self::HIGH_IMPACT_THRESHOLD
    }
}

/// One historical OHLC candle from the terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

/// Wholesale replacement of one symbol's context entry, produced by the
/// refresh jobs and applied by the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheUpdate {
    News { symbol: Symbol, events: Vec<NewsEvent> },
    Trend { symbol: Symbol, value: f64 },
}

impl CacheUpdate {
    pub fn symbol(&self) -> Symbol {
        match self {
            CacheUpdate::News { symbol, .. } | CacheUpdate::Trend { symbol, .. } => *symbol,
        }
    }
}

/// A new or edited message observed in one of the watched chats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    pub chat_id: i64,
    pub chat_title: String,
    pub text: String,
    /// Original send time. Edits keep the time of the first version.
    pub sent_at: DateTime<Utc>,
    pub edited: bool,
}

/// One order leg to be placed on the terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTicket {
    pub id: String,
    pub symbol: Symbol,
    pub direction: Direction,
    /// Lot size.
    pub volume: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    /// Maximum slippage in points.
    pub deviation: u32,
    pub magic: u64,
}

impl OrderTicket {
    pub fn market(
        symbol: Symbol,
        direction: Direction,
        volume: f64,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol,
            direction,
            volume,
            stop_loss,
            take_profit,
            deviation: 0,
            magic: 0,
        }
    }

    pub fn with_deviation(mut self, deviation: u32) -> Self {
        self.deviation = deviation;
        self
    }

    pub fn with_magic(mut self, magic: u64) -> Self {
        self.magic = magic;
        self
    }
}

/// Confirmation returned by the terminal for a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub ticket: u64,
    pub symbol: Symbol,
    pub direction: Direction,
    pub volume: f64,
    pub price: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Whether orders reach the real terminal or are only recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    Live,
    Paper,
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradingMode::Live => write!(f, "live"),
            TradingMode::Paper => write!(f, "paper"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_serializes_as_terminal_code() {
        let json = serde_json::to_string(&Symbol::Xauusd).unwrap();
        assert_eq!(json, "\"XAUUSD\"");
        let back: Symbol = serde_json::from_str("\"GBPJPY\"").unwrap();
        assert_eq!(back, Symbol::Gbpjpy);
    }

    #[test]
    fn first_keyword_is_the_code() {
        for symbol in Symbol::ALL {
            assert_eq!(symbol.keywords()[0], symbol.code());
        }
    }

    #[test]
    fn impact_threshold_is_exclusive() {
        let mut event = NewsEvent {
            symbol: Symbol::Eurusd,
            name: "CPI".into(),
            scheduled_at: chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(13, 30, 0)
                .unwrap(),
            impact: 1,
        };
        assert!(!event.is_high_impact());
        event.impact = 2;
        assert!(event.is_high_impact());
    }
}
