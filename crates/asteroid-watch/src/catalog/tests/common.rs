use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::catalog::domain::{
    CachedAsteroid, CloseApproach, DiameterRange, NearEarthObject, NeoId,
};
use crate::catalog::feed::{FeedError, FeedProvider, FeedRange};
use crate::catalog::repository::{CatalogFilter, CatalogQuery, CatalogRepository};
use crate::catalog::service::CatalogService;
use crate::store::{InMemoryCatalog, RepositoryError};

pub(super) fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).expect("valid date")
}

pub(super) fn approach(on: NaiveDate, miss_distance_km: f64) -> CloseApproach {
    CloseApproach {
        date: on,
        miss_distance_km,
        relative_velocity_kph: Some(54_000.0),
        orbiting_body: "Earth".to_string(),
    }
}

pub(super) fn object(
    id: &str,
    hazardous: bool,
    diameter_km: (f64, f64),
    approaches: Vec<CloseApproach>,
) -> NearEarthObject {
    NearEarthObject {
        id: NeoId::from(id),
        name: format!("({id})"),
        nasa_jpl_url: None,
        absolute_magnitude: Some(22.1),
        is_potentially_hazardous: hazardous,
        estimated_diameter: DiameterRange::new(diameter_km.0, diameter_km.1),
        close_approaches: approaches,
        orbital_data: None,
    }
}

pub(super) fn cached(object: NearEarthObject) -> CachedAsteroid {
    let fetched_at = Utc
        .with_ymd_and_hms(2026, 10, 16, 6, 0, 0)
        .single()
        .expect("valid timestamp");
    CachedAsteroid::from_object(object, fetched_at)
}

/// Three rows spanning CRITICAL, HIGH, and LOW.
pub(super) fn seeded_catalog() -> InMemoryCatalog {
    InMemoryCatalog::with_rows([
        cached(object(
            "2000433",
            true,
            (1.2, 1.6),
            vec![approach(date(10, 18), 600_000.0)],
        )),
        cached(object(
            "3542519",
            true,
            (0.4, 0.5),
            vec![approach(date(10, 19), 2_000_000.0)],
        )),
        cached(object(
            "54016768",
            false,
            (0.04, 0.05),
            vec![approach(date(10, 20), 10_000_000.0)],
        )),
    ])
}

#[derive(Default)]
pub(super) struct FakeFeed {
    pub(super) range: Vec<NearEarthObject>,
    pub(super) by_id: HashMap<NeoId, NearEarthObject>,
    pub(super) fail: bool,
    pub(super) calls: AtomicUsize,
}

impl FakeFeed {
    pub(super) fn with_range(range: Vec<NearEarthObject>) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    pub(super) fn with_object(object: NearEarthObject) -> Self {
        let mut by_id = HashMap::new();
        by_id.insert(object.id.clone(), object);
        Self {
            by_id,
            ..Self::default()
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedProvider for FakeFeed {
    async fn fetch_range(&self, _range: FeedRange) -> Result<Vec<NearEarthObject>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FeedError::Status {
                status: 503,
                detail: "upstream offline".to_string(),
            });
        }
        Ok(self.range.clone())
    }

    async fn fetch_by_id(&self, id: &NeoId) -> Result<Option<NearEarthObject>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FeedError::Transport("connection reset".to_string()));
        }
        Ok(self.by_id.get(id).cloned())
    }
}

/// Catalog whose every call fails, with a record of attempted writes.
#[derive(Default)]
pub(super) struct UnavailableCatalog {
    pub(super) attempted_writes: Mutex<usize>,
}

impl CatalogRepository for UnavailableCatalog {
    fn upsert_many(&self, _asteroids: Vec<CachedAsteroid>) -> Result<usize, RepositoryError> {
        *self.attempted_writes.lock().expect("mutex poisoned") += 1;
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn get(&self, _id: &NeoId) -> Result<Option<CachedAsteroid>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _query: &CatalogQuery) -> Result<Vec<CachedAsteroid>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn search(&self, _needle: &str, _limit: usize) -> Result<Vec<CachedAsteroid>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count(&self, _filter: &CatalogFilter) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service(
    catalog: InMemoryCatalog,
    feed: FakeFeed,
) -> (
    CatalogService<InMemoryCatalog, FakeFeed>,
    Arc<InMemoryCatalog>,
    Arc<FakeFeed>,
) {
    let catalog = Arc::new(catalog);
    let feed = Arc::new(feed);
    let service = CatalogService::new(catalog.clone(), feed.clone());
    (service, catalog, feed)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
