use chrono::NaiveDateTime;

use common::{Direction, NewsEvent, Signal};

use crate::cache::ContextCache;

/// Outcome of running a signal through the gate.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// High-impact news for the symbol is inside the news window.
    NewsBlocked(Vec<NewsEvent>),
    /// The trade opposes the cached trend, or the trend is unknown.
    TrendBlocked { trend: Option<f64> },
    Approved,
}

impl Decision {
    pub fn is_approved(&self) -> bool {
        matches!(self, Decision::Approved)
    }
}

/// Decide what to do with `signal` given the cache as it is right now.
///
/// News is checked before trend, so a news conflict always wins.
pub fn decide(signal: &Signal, cache: &ContextCache, server_now: NaiveDateTime) -> Decision {
    if let Some(news) = cache.news_affecting(signal.symbol, server_now) {
        return Decision::NewsBlocked(news);
    }

    let trend = cache.trend_of(signal.symbol);
    if is_against_trend(signal.direction, trend) {
        return Decision::TrendBlocked { trend };
    }

    Decision::Approved
}

/// True when `direction` opposes `trend` or the trend cannot vouch for it.
///
/// Unknown, flat (exactly zero) and NaN trends all count as against.
pub fn is_against_trend(direction: Direction, trend: Option<f64>) -> bool {
    match trend {
        None => true,
        Some(t) if t.is_nan() || t == 0.0 => true,
        Some(t) => match direction {
            Direction::Buy => t < 0.0,
            Direction::Sell => t > 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::{CacheUpdate, Symbol};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn signal(direction: Direction) -> Signal {
        Signal {
            symbol: Symbol::Eurusd,
            direction,
            take_profits: vec![Some(1.085)],
            stop_loss: Some(1.08),
        }
    }

    fn with_trend(value: f64) -> ContextCache {
        let mut cache = ContextCache::new();
        cache.apply(CacheUpdate::Trend { symbol: Symbol::Eurusd, value });
        cache
    }

    #[test]
    fn news_takes_precedence_over_favourable_trend() {
        let mut cache = with_trend(2.5);
        cache.apply(CacheUpdate::News {
            symbol: Symbol::Eurusd,
            events: vec![NewsEvent {
                symbol: Symbol::Eurusd,
                name: "ECB Rate Decision".into(),
                scheduled_at: now() + chrono::Duration::minutes(10),
                impact: 3,
            }],
        });
        let decision = decide(&signal(Direction::Buy), &cache, now());
        assert!(matches!(decision, Decision::NewsBlocked(ref n) if n.len() == 1));
    }

    #[test]
    fn sell_against_uptrend_is_blocked() {
        let decision = decide(&signal(Direction::Sell), &with_trend(2.5), now());
        assert_eq!(decision, Decision::TrendBlocked { trend: Some(2.5) });
    }

    #[test]
    fn sell_with_downtrend_is_approved() {
        let decision = decide(&signal(Direction::Sell), &with_trend(-1.0), now());
        assert_eq!(decision, Decision::Approved);
    }

    #[test]
    fn buy_with_uptrend_is_approved() {
        assert!(decide(&signal(Direction::Buy), &with_trend(0.0003), now()).is_approved());
    }

    #[test]
    fn missing_trend_blocks() {
        let decision = decide(&signal(Direction::Buy), &ContextCache::new(), now());
        assert_eq!(decision, Decision::TrendBlocked { trend: None });
    }

    #[test]
    fn flat_and_nan_trends_block() {
        assert!(is_against_trend(Direction::Buy, Some(0.0)));
        assert!(is_against_trend(Direction::Sell, Some(0.0)));
        assert!(is_against_trend(Direction::Buy, Some(f64::NAN)));
    }
}
