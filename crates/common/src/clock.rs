use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};

/// Converts UTC instants into the terminal server's wall clock.
///
/// Calendar entries and candles come back stamped in server time, so every
/// comparison against them goes through this offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerClock {
    offset: Duration,
}

impl ServerClock {
    pub fn new(offset_hours: i64) -> Self {
        Self {
            offset: Duration::hours(offset_hours),
        }
    }

    /// Current server wall-clock time.
    pub fn now(&self) -> NaiveDateTime {
        self.at(Utc::now())
    }

    pub fn at(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        (instant + self.offset).naive_utc()
    }
}

/// Date range for the news calendar: today through tomorrow.
pub fn calendar_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today, today + Duration::days(1))
}

/// Date range covering the last two trading days, counting `today` when it
/// is a weekday. Weekends are skipped when walking back.
pub fn history_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let mut start = today;
    let mut weekdays = 0;
    loop {
        if start.weekday().num_days_from_monday() < 5 {
            weekdays += 1;
            if weekdays >= 2 {
                break;
            }
        }
        start = start - Duration::days(1);
    }
    (start, today)
}
