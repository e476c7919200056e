mod nasa;
mod wire;

pub use nasa::NasaFeedClient;
pub use wire::{parse_measure, MeasureParseError, NeoRecord, NeoWsFeed};

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use serde::Serialize;

use super::domain::{NearEarthObject, NeoId};

/// Longest span the NeoWs feed endpoint accepts in a single request.
pub const MAX_FEED_SPAN_DAYS: i64 = 7;

/// Inclusive calendar range requested from the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FeedRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FeedError> {
        if end < start || (end - start).num_days() > MAX_FEED_SPAN_DAYS {
            return Err(FeedError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The week leading up to and including `today`, cut short at the start
    /// of the calendar.
    pub fn trailing_week(today: NaiveDate) -> Self {
        Self {
            start: today
                .checked_sub_days(Days::new(MAX_FEED_SPAN_DAYS.unsigned_abs()))
                .unwrap_or(NaiveDate::MIN),
            end: today,
        }
    }

    /// The full week ending on `end`. Fails when that week would begin before
    /// the first representable date.
    pub fn week_ending(end: NaiveDate) -> Result<Self, FeedError> {
        match end.checked_sub_days(Days::new(MAX_FEED_SPAN_DAYS.unsigned_abs())) {
            Some(start) => Ok(Self { start, end }),
            None => Err(FeedError::InvalidRange {
                start: NaiveDate::MIN,
                end,
            }),
        }
    }
}

/// Source of raw object records.
#[async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch_range(&self, range: FeedRange) -> Result<Vec<NearEarthObject>, FeedError>;
    async fn fetch_by_id(&self, id: &NeoId) -> Result<Option<NearEarthObject>, FeedError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed range {start}..={end} must be ordered and span at most {} days", MAX_FEED_SPAN_DAYS)]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("feed request failed: {0}")]
    Transport(String),
    #[error("feed responded with status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("feed payload could not be decoded: {0}")]
    Decode(String),
}
