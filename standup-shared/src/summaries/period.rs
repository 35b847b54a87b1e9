/// Summary periods and their date windows
///
/// Windows are inclusive on both ends and computed from a caller-supplied
/// "today" so they can be tested without a clock. Request handlers pass the
/// current UTC date.
///
/// ```
/// use chrono::NaiveDate;
/// use standup_shared::summaries::period::Period;
///
/// let today = NaiveDate::from_ymd_opt(2025, 3, 13).unwrap(); // Thursday
/// let week = Period::Week.window(today);
/// assert_eq!(week.from, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
/// assert_eq!(week.to, today);
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Aggregation period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Today,
    Week,
    Month,
}

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown period '{0}', expected today, week or month")]
pub struct ParsePeriodError(String);

impl Period {
    /// Window ending on `today`
    pub fn window(self, today: NaiveDate) -> DateWindow {
        let from = match self {
            Period::Today => today,
            Period::Week => today - Duration::days(i64::from(today.weekday().num_days_from_monday())),
            Period::Month => today.with_day(1).unwrap_or(today),
        };

        DateWindow { from, to: today }
    }

    /// Window ending on the current UTC date
    pub fn current_window(self) -> DateWindow {
        self.window(Utc::now().date_naive())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Week => "week",
            Period::Month => "month",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Period::Today),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => Err(ParsePeriodError(other.to_string())),
        }
    }
}

impl DateWindow {
    /// Window covering a single day
    pub fn single(day: NaiveDate) -> Self {
        Self { from: day, to: day }
    }

    #[cfg(test)]
    fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }

    /// Number of days covered, counting both ends
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}
