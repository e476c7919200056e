use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{CachedAsteroid, NeoId};
use super::feed::{FeedError, FeedProvider, FeedRange};
use super::repository::{CatalogFilter, CatalogQuery, CatalogRepository, CatalogStats};
use super::risk::RiskTier;
use crate::store::RepositoryError;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;
pub const SEARCH_LIMIT: usize = 20;
pub const MIN_SEARCH_LEN: usize = 2;
pub const HAZARDOUS_LIMIT: usize = 50;

/// Paging request for the catalog listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageRequest {
    pub limit: Option<usize>,
    pub offset: usize,
    pub hazardous_only: bool,
}

/// Outcome of a feed pull.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub range: FeedRange,
    pub fetched: usize,
    pub cached: usize,
    /// Set when scoring succeeded but the catalog write did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_error: Option<String>,
    pub asteroids: Vec<CachedAsteroid>,
}

/// Feed ingestion plus read access to the scored catalog.
pub struct CatalogService<R, F> {
    repository: Arc<R>,
    feed: Arc<F>,
}

impl<R, F> CatalogService<R, F>
where
    R: CatalogRepository + 'static,
    F: FeedProvider + 'static,
{
    pub fn new(repository: Arc<R>, feed: Arc<F>) -> Self {
        Self { repository, feed }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Pulls the range from the feed, scores every object, and upserts the
    /// results. A failed catalog write is reported, not raised: the scored
    /// objects are still returned to the caller.
    pub async fn ingest_range(
        &self,
        range: FeedRange,
    ) -> Result<IngestSummary, CatalogServiceError> {
        let objects = self.feed.fetch_range(range).await?;
        let fetched_at = Utc::now();
        let asteroids: Vec<CachedAsteroid> = objects
            .into_iter()
            .map(|object| CachedAsteroid::from_object(object, fetched_at))
            .collect();
        let fetched = asteroids.len();

        let (cached, cache_error) = if asteroids.is_empty() {
            (0, None)
        } else {
            match self.repository.upsert_many(asteroids.clone()) {
                Ok(count) => (count, None),
                Err(err) => {
                    warn!(%err, start = %range.start, end = %range.end, "failed to cache feed results");
                    (0, Some(err.to_string()))
                }
            }
        };

        info!(start = %range.start, end = %range.end, fetched, cached, "feed ingested");

        Ok(IngestSummary {
            range,
            fetched,
            cached,
            cache_error,
            asteroids,
        })
    }

    pub async fn ingest_recent(
        &self,
        today: NaiveDate,
    ) -> Result<IngestSummary, CatalogServiceError> {
        self.ingest_range(FeedRange::trailing_week(today)).await
    }

    /// Cache first, then the feed. Feed misses and failures resolve to `None`.
    pub async fn lookup(&self, id: &NeoId) -> Option<CachedAsteroid> {
        match self.repository.get(id) {
            Ok(Some(cached)) => return Some(cached),
            Ok(None) => {}
            Err(err) => warn!(%err, neo_id = %id, "catalog read failed, falling back to feed"),
        }

        let object = match self.feed.fetch_by_id(id).await {
            Ok(Some(object)) => object,
            Ok(None) => return None,
            Err(err) => {
                warn!(%err, neo_id = %id, "feed lookup failed");
                return None;
            }
        };

        let asteroid = CachedAsteroid::from_object(object, Utc::now());
        if let Err(err) = self.repository.upsert_many(vec![asteroid.clone()]) {
            warn!(%err, neo_id = %id, "failed to cache looked-up object");
        }
        Some(asteroid)
    }

    pub fn search(&self, query: &str) -> Result<Vec<CachedAsteroid>, CatalogServiceError> {
        let needle = query.trim();
        if needle.chars().count() < MIN_SEARCH_LEN {
            return Ok(Vec::new());
        }
        Ok(self.repository.search(needle, SEARCH_LIMIT)?)
    }

    pub fn hazardous(&self) -> Result<Vec<CachedAsteroid>, CatalogServiceError> {
        let query = CatalogQuery {
            filter: CatalogFilter::hazardous(),
            offset: 0,
            limit: Some(HAZARDOUS_LIMIT),
        };
        Ok(self.repository.list(&query)?)
    }

    pub fn page(&self, request: PageRequest) -> Result<Vec<CachedAsteroid>, CatalogServiceError> {
        let limit = request
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let filter = if request.hazardous_only {
            CatalogFilter::hazardous()
        } else {
            CatalogFilter::default()
        };
        let query = CatalogQuery {
            filter,
            offset: request.offset,
            limit: Some(limit),
        };
        Ok(self.repository.list(&query)?)
    }

    pub fn stats(&self) -> Result<CatalogStats, CatalogServiceError> {
        Ok(CatalogStats {
            total: self.repository.count(&CatalogFilter::default())?,
            hazardous: self.repository.count(&CatalogFilter::hazardous())?,
            critical: self
                .repository
                .count(&CatalogFilter::tier(RiskTier::Critical))?,
            high: self.repository.count(&CatalogFilter::tier(RiskTier::High))?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogServiceError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
