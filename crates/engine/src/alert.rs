use std::collections::BTreeMap;

use serde::Serialize;

use common::NewsEvent;
use gate::Decision;

#[derive(Serialize)]
struct NewsLine {
    when: String,
    impact: u8,
}

/// Audit text for one screened signal.
///
/// `message` is the upper-cased message body, `failed_legs` the number of
/// order legs the terminal rejected out of `legs` (approved signals only).
pub fn render(decision: &Decision, chat_title: &str, message: &str, failed_legs: usize, legs: usize) -> String {
    match decision {
        Decision::NewsBlocked(events) => format!(
            "Affected by News\n\n{}\n\nFrom: {chat_title}\n\n{message}",
            news_table(events)
        ),
        Decision::TrendBlocked { trend } => {
            let trend = trend.map_or_else(|| "unknown".to_string(), |t| t.to_string());
            format!("Against Trend {trend}\nFrom: {chat_title}\n\n{message}")
        }
        Decision::Approved => {
            let mut text = format!("New Trade:\nFrom: {chat_title}\n\n{message}");
            if failed_legs > 0 {
                text.push_str(&format!("\nFailed legs: {failed_legs}/{legs}"));
            }
            text
        }
    }
}

/// Events as a TOML table keyed by event name.
fn news_table(events: &[NewsEvent]) -> String {
    let table: BTreeMap<&str, NewsLine> = events
        .iter()
        .map(|e| {
            let line = NewsLine {
                when: e.scheduled_at.format("%Y-%m-%d %H:%M").to_string(),
                impact: e.impact,
            };
            (e.name.as_str(), line)
        })
        .collect();
    toml::to_string(&table).unwrap_or_else(|_| {
        events
            .iter()
            .map(|e| format!("{} at {} (impact {})", e.name, e.scheduled_at, e.impact))
            .collect::<Vec<_>>()
            .join("\n")
    })
}
