use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::CloseApproach;

pub const DEFAULT_WINDOW_DAYS: i64 = 7;
/// Longest look-ahead accepted from configuration.
pub const MAX_WINDOW_DAYS: i64 = 366;

/// How to choose among several approaches that fall inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproachSelection {
    /// The first matching approach in feed order.
    FirstInSourceOrder,
    /// The matching approach with the earliest date; feed order breaks ties.
    #[default]
    ChronologicallyEarliest,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown approach selection '{0}' (expected 'first' or 'earliest')")]
pub struct SelectionParseError(pub String);

impl FromStr for ApproachSelection {
    type Err = SelectionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "first" | "first_in_source_order" => Ok(ApproachSelection::FirstInSourceOrder),
            "earliest" | "chronologically_earliest" => {
                Ok(ApproachSelection::ChronologicallyEarliest)
            }
            other => Err(SelectionParseError(other.to_string())),
        }
    }
}

impl fmt::Display for ApproachSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApproachSelection::FirstInSourceOrder => f.write_str("first"),
            ApproachSelection::ChronologicallyEarliest => f.write_str("earliest"),
        }
    }
}

/// Inclusive range of calendar dates `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApproachWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ApproachWindow {
    /// Dates whose UTC midnight lies in `[now, now + days]`.
    ///
    /// Today only qualifies when `now` is exactly midnight; once the day has
    /// started its approach is treated as past. The last day always
    /// qualifies. Negative spans count as zero and oversized spans saturate
    /// at the calendar's end.
    pub fn following(now: DateTime<Utc>, days: i64) -> Self {
        let today = now.date_naive();
        let start = if now.time() == NaiveTime::MIN {
            today
        } else {
            today.succ_opt().unwrap_or(NaiveDate::MAX)
        };
        let span = Days::new(u64::try_from(days).unwrap_or(0));
        let end = today.checked_add_days(span).unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Picks the approach that triggers an alert, if any falls in the window.
    /// Approaches with a non-finite miss distance are never selected.
    pub fn select<'a>(
        &self,
        approaches: &'a [CloseApproach],
        selection: ApproachSelection,
    ) -> Option<&'a CloseApproach> {
        let mut candidates = approaches
            .iter()
            .filter(|approach| approach.has_valid_distance())
            .filter(|approach| self.contains(approach.date));

        match selection {
            ApproachSelection::FirstInSourceOrder => candidates.next(),
            // min_by_key keeps the first of equal keys.
            ApproachSelection::ChronologicallyEarliest => {
                candidates.min_by_key(|approach| approach.date)
            }
        }
    }
}
