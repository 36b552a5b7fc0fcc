pub mod cache;
pub mod decision;
pub mod trend;

pub use cache::ContextCache;
pub use decision::{decide, is_against_trend, Decision};
pub use trend::{avg_consecutive_diff, trend_from_bars};
