//! Field extractors for upper-cased signal text.
//!
//! Providers phrase the same signal many ways, so each numeric field is read
//! through a [`PatternChain`]: an ordered list of pattern families tried one
//! after another. The order of every list in this module decides what an
//! ambiguous message means and must not be shuffled.

use std::sync::LazyLock;

use regex::Regex;

use common::{Direction, Symbol};

/// Price capture shared by every numeric family.
const NUMBER: &str = r"(\d+(?:\.\d+)?)";

/// Keyword, optional leg index, separator, number. Alternatives are tried
/// in order at each keyword:
///
/// 1. index then punctuation: `TP 1: 1950`, `TP2 @ 1960`;
/// 2. index then whitespace: `TP 1 1950`, `TP1 1.085`;
/// 3. no index, or one glued to the keyword, then a separator that starts
///    with neither a digit nor a decimal point: `SL 1.080`, `TARGET 1950`.
///
/// Every alternative needs a non-numeric gap after the index, so the index
/// alone is never read as the price and `SL 1.080` keeps its integer part.
fn family(keyword: &str) -> String {
    format!(r"{keyword}(?:\s*\d+\s*[:=@)\-]\s*|\s*\d+\s+|\d*[^\d.]\D*){NUMBER}")
}

static TAKE_PROFIT: LazyLock<PatternChain> =
    LazyLock::new(|| PatternChain::new(&["TP", r"TAKE\s*PROFIT", "TARGET"]));

static STOP_LOSS: LazyLock<PatternChain> =
    LazyLock::new(|| PatternChain::new(&["SL", r"STOP\s*LOSS", "STOP"]));

/// Ordered numeric pattern families. Earlier families shadow later ones
/// completely; results are never merged across families.
pub struct PatternChain {
    families: Vec<Regex>,
}

impl PatternChain {
    fn new(keywords: &[&str]) -> Self {
        let families = keywords
            .iter()
            .map(|k| Regex::new(&family(k)).expect("static signal pattern compiles"))
            .collect();
        Self { families }
    }

    /// Every non-overlapping number captured by the first family that
    /// matches at least once.
    pub fn all(&self, text: &str) -> Vec<f64> {
        for re in &self.families {
            let found: Vec<f64> = re
                .captures_iter(text)
                .filter_map(|c| c.get(1))
                .filter_map(|m| m.as_str().parse().ok())
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// Leftmost number captured by the first family that matches.
    pub fn first(&self, text: &str) -> Option<f64> {
        self.families.iter().find_map(|re| {
            re.captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok())
        })
    }
}

/// First symbol in [`Symbol::ALL`] order with a keyword present in `text`.
pub fn extract_symbol(text: &str) -> Option<Symbol> {
    Symbol::ALL
        .into_iter()
        .find(|symbol| symbol.keywords().iter().any(|k| text.contains(k)))
}

/// Buy keywords are checked first, so a text with both sides is a buy.
pub fn extract_direction(text: &str) -> Option<Direction> {
    if text.contains("BUY") || text.contains("LONG") {
        return Some(Direction::Buy);
    }
    if text.contains("SELL") || text.contains("SHORT") {
        return Some(Direction::Sell);
    }
    None
}

/// One entry per order leg; `[None]` when no target is given.
pub fn extract_take_profits(text: &str) -> Vec<Option<f64>> {
    let targets = TAKE_PROFIT.all(text);
    if targets.is_empty() {
        return vec![None];
    }
    targets.into_iter().map(Some).collect()
}

pub fn extract_stop_loss(text: &str) -> Option<f64> {
    STOP_LOSS.first(text)
}
