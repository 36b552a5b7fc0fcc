use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use common::{ChatEvent, RelayConfig, Signal, Symbol};

use crate::extract::{extract_direction, extract_stop_loss, extract_symbol, extract_take_profits};

/// Why a chat event was not treated as a signal. None of these are errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Discard {
    /// Older than the age limit, e.g. backlog replayed after a reconnect.
    Stale { age: Duration },
    NoSymbol,
    Untracked(Symbol),
    Blacklisted(String),
    NoDirection,
}

impl std::fmt::Display for Discard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Discard::Stale { age } => write!(f, "stale ({}s old)", age.num_seconds()),
            Discard::NoSymbol => write!(f, "no symbol"),
            Discard::Untracked(symbol) => write!(f, "untracked symbol {symbol}"),
            Discard::Blacklisted(phrase) => write!(f, "blacklisted phrase '{phrase}'"),
            Discard::NoDirection => write!(f, "no direction"),
        }
    }
}

/// Ingestion filter chain: age, symbol, blacklist, direction, in that order.
#[derive(Debug, Clone)]
pub struct Screen {
    tracked: Vec<Symbol>,
    blacklist: Vec<String>,
    max_age: Duration,
}

impl Screen {
    pub fn new(tracked: Vec<Symbol>, blacklist: Vec<String>, max_age: Duration) -> Self {
        Self {
            tracked,
            blacklist: blacklist.into_iter().map(|p| p.to_uppercase()).collect(),
            max_age,
        }
    }

    pub fn from_config(cfg: &RelayConfig) -> Self {
        Self::new(
            cfg.symbols.clone(),
            cfg.blacklist.clone(),
            Duration::seconds(cfg.max_message_age_secs),
        )
    }

    /// Run the filter chain against `event` as seen at `now`.
    pub fn check(&self, event: &ChatEvent, now: DateTime<Utc>) -> Result<Signal, Discard> {
        let age = now - event.sent_at;
        if age >= self.max_age {
            return Err(Discard::Stale { age });
        }

        let text = event.text.to_uppercase();

        let symbol = extract_symbol(&text).ok_or(Discard::NoSymbol)?;
        if !self.tracked.contains(&symbol) {
            return Err(Discard::Untracked(symbol));
        }

        if let Some(phrase) = self.blacklist.iter().find(|p| text.contains(p.as_str())) {
            return Err(Discard::Blacklisted(phrase.clone()));
        }

        let direction = extract_direction(&text).ok_or(Discard::NoDirection)?;

        let signal = Signal {
            symbol,
            direction,
            take_profits: extract_take_profits(&text),
            stop_loss: extract_stop_loss(&text),
        };
        debug!(
            symbol = %signal.symbol,
            direction = %signal.direction,
            legs = signal.take_profits.len(),
            stop_loss = ?signal.stop_loss,
            "Signal parsed"
        );
        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Screen {
        Screen::from_config(&RelayConfig::default())
    }

    fn event(text: &str, age_secs: i64, now: DateTime<Utc>) -> ChatEvent {
        ChatEvent {
            chat_id: -4000930568,
            chat_title: "Test Signals".into(),
            text: text.into(),
            sent_at: now - Duration::seconds(age_secs),
            edited: false,
        }
    }

    #[test]
    fn fresh_signal_passes() {
        let now = Utc::now();
        let signal = screen()
            .check(&event("buy eurusd now tp1 1.085 tp2 1.087 sl 1.080", 10, now), now)
            .unwrap();
        assert_eq!(signal.symbol, Symbol::Eurusd);
        assert_eq!(signal.direction, common::Direction::Buy);
        assert_eq!(signal.take_profits, vec![Some(1.085), Some(1.087)]);
        assert_eq!(signal.stop_loss, Some(1.080));
    }

    #[test]
    fn stale_message_is_dropped_first() {
        let now = Utc::now();
        // Would also fail the blacklist; age is checked before anything else
        let result = screen().check(&event("GOLD TP1 HIT", 60, now), now);
        assert!(matches!(result, Err(Discard::Stale { .. })));
    }

    #[test]
    fn message_just_under_age_limit_passes() {
        let now = Utc::now();
        assert!(screen().check(&event("SELL GOLD SL 1950", 59, now), now).is_ok());
    }

    #[test]
    fn untracked_symbol_is_dropped() {
        let now = Utc::now();
        let screen = Screen::new(vec![Symbol::Xauusd], Vec::new(), Duration::seconds(60));
        let result = screen.check(&event("BUY GBPJPY", 1, now), now);
        assert_eq!(result, Err(Discard::Untracked(Symbol::Gbpjpy)));
    }

    #[test]
    fn no_symbol_is_dropped() {
        let now = Utc::now();
        let result = screen().check(&event("BUY SOMETHING", 1, now), now);
        assert_eq!(result, Err(Discard::NoSymbol));
    }

    #[test]
    fn blacklisted_follow_up_is_dropped() {
        let now = Utc::now();
        let result = screen().check(&event("XAUUSD TP1 HIT +50 PIPS", 1, now), now);
        assert_eq!(result, Err(Discard::Blacklisted("HIT".into())));
    }

    #[test]
    fn blacklist_is_case_insensitive() {
        let now = Utc::now();
        let screen = Screen::new(Symbol::ALL.to_vec(), vec!["close".into()], Duration::seconds(60));
        let result = screen.check(&event("Close gold buys", 1, now), now);
        assert_eq!(result, Err(Discard::Blacklisted("CLOSE".into())));
    }

    #[test]
    fn missing_direction_is_dropped() {
        let now = Utc::now();
        let result = screen().check(&event("XAUUSD TP 1950", 1, now), now);
        assert_eq!(result, Err(Discard::NoDirection));
    }
}
