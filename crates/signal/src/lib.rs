//! Turns free-text chat messages into trade signals.
//!
//! [`extract`] holds the pure per-field extractors; [`screen`] decides
//! whether a chat event is a fresh, tracked, non-chatter signal at all.

pub mod extract;
pub mod screen;

pub use extract::{extract_direction, extract_stop_loss, extract_symbol, extract_take_profits};
pub use screen::{Discard, Screen};
