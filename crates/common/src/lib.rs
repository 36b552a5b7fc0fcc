pub mod clock;
pub mod config;
pub mod error;
pub mod exchange;
pub mod types;

pub use clock::ServerClock;
pub use config::{Config, RelayConfig};
pub use error::{Error, Result};
pub use exchange::{AlertSink, MarketData, TradeTerminal};
pub use types::*;
