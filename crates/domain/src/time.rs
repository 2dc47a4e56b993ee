use chrono::{DateTime, Utc};

const MINUTE: i64 = 60 * 1000;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 31 * DAY;
const YEAR: i64 = 12 * MONTH;

/// Coarse "time ago" bucket between two epoch-millis instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elapsed {
    Years(i64),
    Months(i64),
    Weeks(i64),
    Days(i64),
    Hours(i64),
    Minutes(i64),
    JustNow,
}

impl Elapsed {
    pub fn between(now_millis: i64, then_millis: i64) -> Self {
        let diff = now_millis.saturating_sub(then_millis);

        if diff > YEAR {
            Elapsed::Years(diff / YEAR)
        } else if diff > MONTH {
            Elapsed::Months(diff / MONTH)
        } else if diff > WEEK {
            Elapsed::Weeks(diff / WEEK)
        } else if diff > DAY {
            Elapsed::Days(diff / DAY)
        } else if diff > HOUR {
            Elapsed::Hours(diff / HOUR)
        } else if diff > MINUTE {
            Elapsed::Minutes(diff / MINUTE)
        } else {
            Elapsed::JustNow
        }
    }
}

pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

pub fn days_to_millis(days: i64) -> i64 {
    days.saturating_mul(DAY)
}
