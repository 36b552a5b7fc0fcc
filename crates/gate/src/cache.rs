use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use common::{CacheUpdate, NewsEvent, Symbol};

/// How long before "now" an event still blocks trading.
pub const NEWS_LOOKBACK_MINUTES: i64 = 60;
/// How far ahead of "now" an upcoming event already blocks trading.
pub const NEWS_LOOKAHEAD_MINUTES: i64 = 30;

/// Latest market context per symbol: high-impact news and trend value.
///
/// Owned by a single task. Every write replaces one symbol's entry whole,
/// so a reader never sees a half-merged news list.
#[derive(Debug, Default, Clone)]
pub struct ContextCache {
    news: HashMap<Symbol, Vec<NewsEvent>>,
    trends: HashMap<Symbol, f64>,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, update: CacheUpdate) {
        match update {
            CacheUpdate::News { symbol, mut events } => {
                events.retain(NewsEvent::is_high_impact);
                debug!(symbol = %symbol, events = events.len(), "News cache replaced");
                self.news.insert(symbol, events);
            }
            CacheUpdate::Trend { symbol, value } => {
                debug!(symbol = %symbol, trend = value, "Trend cache replaced");
                self.trends.insert(symbol, value);
            }
        }
    }

    /// Cached news for `symbol` scheduled within
    /// `[server_now - 1h, server_now + 30min]`, or `None` if there is none.
    pub fn news_affecting(&self, symbol: Symbol, server_now: NaiveDateTime) -> Option<Vec<NewsEvent>> {
        let start = server_now - Duration::minutes(NEWS_LOOKBACK_MINUTES);
        let end = server_now + Duration::minutes(NEWS_LOOKAHEAD_MINUTES);
        let hits: Vec<NewsEvent> = self
            .news_of(symbol)
            .iter()
            .filter(|e| e.scheduled_at >= start && e.scheduled_at <= end)
            .cloned()
            .collect();
        (!hits.is_empty()).then_some(hits)
    }

    pub fn trend_of(&self, symbol: Symbol) -> Option<f64> {
        self.trends.get(&symbol).copied()
    }

    /// All cached news for `symbol`, regardless of time.
    pub fn news_of(&self, symbol: Symbol) -> &[NewsEvent] {
        self.news.get(&symbol).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn news(symbol: Symbol, name: &str, when: NaiveDateTime, impact: u8) -> NewsEvent {
        NewsEvent { symbol, name: name.into(), scheduled_at: when, impact }
    }

    #[test]
    fn low_impact_news_is_never_retained() {
        let mut cache = ContextCache::new();
        cache.apply(CacheUpdate::News {
            symbol: Symbol::Eurusd,
            events: vec![
                news(Symbol::Eurusd, "Speech", at(12, 0), 1),
                news(Symbol::Eurusd, "CPI", at(12, 0), 3),
            ],
        });
        assert_eq!(cache.news_of(Symbol::Eurusd).len(), 1);
        assert_eq!(cache.news_of(Symbol::Eurusd)[0].name, "CPI");
    }

    #[test]
    fn window_is_one_hour_back_thirty_minutes_ahead() {
        let mut cache = ContextCache::new();
        cache.apply(CacheUpdate::News {
            symbol: Symbol::Xauusd,
            events: vec![
                news(Symbol::Xauusd, "Too old", at(10, 59), 3),
                news(Symbol::Xauusd, "Edge past", at(11, 0), 3),
                news(Symbol::Xauusd, "Edge ahead", at(12, 30), 3),
                news(Symbol::Xauusd, "Too far", at(12, 31), 3),
            ],
        });
        let hits = cache.news_affecting(Symbol::Xauusd, at(12, 0)).unwrap();
        let names: Vec<&str> = hits.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Edge past", "Edge ahead"]);
    }

    #[test]
    fn no_news_outside_window_is_none() {
        let mut cache = ContextCache::new();
        cache.apply(CacheUpdate::News {
            symbol: Symbol::Xauusd,
            events: vec![news(Symbol::Xauusd, "NFP", at(18, 0), 3)],
        });
        assert!(cache.news_affecting(Symbol::Xauusd, at(12, 0)).is_none());
        assert!(cache.news_affecting(Symbol::Eurusd, at(12, 0)).is_none());
    }

    #[test]
    fn updates_replace_wholesale() {
        let mut cache = ContextCache::new();
        cache.apply(CacheUpdate::News {
            symbol: Symbol::Gbpusd,
            events: vec![news(Symbol::Gbpusd, "BoE", at(12, 0), 3)],
        });
        cache.apply(CacheUpdate::News { symbol: Symbol::Gbpusd, events: Vec::new() });
        assert!(cache.news_of(Symbol::Gbpusd).is_empty());

        cache.apply(CacheUpdate::Trend { symbol: Symbol::Gbpusd, value: 0.5 });
        cache.apply(CacheUpdate::Trend { symbol: Symbol::Gbpusd, value: -0.25 });
        assert_eq!(cache.trend_of(Symbol::Gbpusd), Some(-0.25));
    }

    #[test]
    fn one_symbol_update_leaves_others_alone() {
        let mut cache = ContextCache::new();
        cache.apply(CacheUpdate::Trend { symbol: Symbol::Gbpusd, value: 0.5 });
        cache.apply(CacheUpdate::Trend { symbol: Symbol::Usdjpy, value: -1.0 });
        assert_eq!(cache.trend_of(Symbol::Gbpusd), Some(0.5));
        assert_eq!(cache.trend_of(Symbol::Audusd), None);
    }
}
