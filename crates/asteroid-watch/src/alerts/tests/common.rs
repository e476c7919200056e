use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::alerts::domain::{
    EventKey, NewNotification, NewWatchEntry, Notification, NotificationId, UserId, WatchEntry,
    WatchEntryId,
};
use crate::alerts::generator::{GeneratorConfig, NotificationGenerator};
use crate::alerts::repository::{InsertOutcome, NotificationRepository, WatchRepository};
use crate::alerts::service::AlertService;
use crate::catalog::{
    CachedAsteroid, CatalogFilter, CatalogQuery, CatalogRepository, CloseApproach,
    DiameterRange, NearEarthObject, NeoId,
};
use crate::store::{InMemoryCatalog, InMemoryNotifications, InMemoryWatchlist, RepositoryError};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).expect("valid date")
}

pub(super) fn user() -> UserId {
    UserId("user-7f3a".to_string())
}

pub(super) fn approach(on: NaiveDate, miss_distance_km: f64) -> CloseApproach {
    CloseApproach {
        date: on,
        miss_distance_km,
        relative_velocity_kph: None,
        orbiting_body: "Earth".to_string(),
    }
}

pub(super) fn asteroid(
    id: &str,
    name: &str,
    hazardous: bool,
    diameter_km: (f64, f64),
    approaches: Vec<CloseApproach>,
) -> CachedAsteroid {
    CachedAsteroid::from_object(
        NearEarthObject {
            id: NeoId::from(id),
            name: name.to_string(),
            nasa_jpl_url: None,
            absolute_magnitude: None,
            is_potentially_hazardous: hazardous,
            estimated_diameter: DiameterRange::new(diameter_km.0, diameter_km.1),
            close_approaches: approaches,
            orbital_data: None,
        },
        now(),
    )
}

/// Small, benign object passing 400,000 km away on 2026-10-18. Scores LOW,
/// so it only ever reaches a user through their watch list.
pub(super) fn benign_flyby() -> CachedAsteroid {
    asteroid(
        "54088823",
        "(2020 XR)",
        false,
        (0.02, 0.04),
        vec![approach(date(10, 18), 400_000.0)],
    )
}

/// HIGH tier object (score 70) approaching on 2026-10-19.
pub(super) fn high_risk_flyby() -> CachedAsteroid {
    asteroid(
        "3542519",
        "(2010 PK9)",
        true,
        (0.4, 0.5),
        vec![approach(date(10, 19), 2_000_000.0)],
    )
}

pub(super) fn watch(neo_id: &str, threshold: Option<f64>) -> NewWatchEntry {
    NewWatchEntry {
        user_id: user(),
        neo_id: NeoId::from(neo_id),
        min_distance_threshold_km: threshold,
        notes: None,
        alert_enabled: true,
        created_at: now(),
    }
}

pub(super) struct Stores {
    pub(super) watchlist: Arc<InMemoryWatchlist>,
    pub(super) catalog: Arc<InMemoryCatalog>,
    pub(super) notifications: Arc<InMemoryNotifications>,
}

pub(super) fn stores(rows: Vec<CachedAsteroid>) -> Stores {
    Stores {
        watchlist: Arc::new(InMemoryWatchlist::default()),
        catalog: Arc::new(InMemoryCatalog::with_rows(rows)),
        notifications: Arc::new(InMemoryNotifications::default()),
    }
}

impl Stores {
    pub(super) fn generator(
        &self,
        config: GeneratorConfig,
    ) -> NotificationGenerator<InMemoryWatchlist, InMemoryCatalog, InMemoryNotifications> {
        NotificationGenerator::new(
            self.watchlist.clone(),
            self.catalog.clone(),
            self.notifications.clone(),
            config,
        )
    }

    pub(super) fn service(
        &self,
    ) -> AlertService<InMemoryWatchlist, InMemoryCatalog, InMemoryNotifications> {
        AlertService::new(
            self.watchlist.clone(),
            self.catalog.clone(),
            self.notifications.clone(),
            GeneratorConfig::default(),
        )
    }

    pub(super) fn stored(&self) -> Vec<Notification> {
        self.notifications.all().expect("store readable")
    }
}

/// Store that must never be reached.
pub(super) struct UntouchableStore;

impl WatchRepository for UntouchableStore {
    fn insert(&self, _entry: NewWatchEntry) -> Result<WatchEntry, RepositoryError> {
        panic!("watch store touched")
    }

    fn update(&self, _entry: WatchEntry) -> Result<WatchEntry, RepositoryError> {
        panic!("watch store touched")
    }

    fn remove(&self, _user: &UserId, _neo_id: &NeoId) -> Result<(), RepositoryError> {
        panic!("watch store touched")
    }

    fn get(
        &self,
        _user: &UserId,
        _id: &WatchEntryId,
    ) -> Result<Option<WatchEntry>, RepositoryError> {
        panic!("watch store touched")
    }

    fn find(&self, _user: &UserId, _neo_id: &NeoId) -> Result<Option<WatchEntry>, RepositoryError> {
        panic!("watch store touched")
    }

    fn list_for_user(&self, _user: &UserId) -> Result<Vec<WatchEntry>, RepositoryError> {
        panic!("watch store touched")
    }

    fn count_for_user(&self, _user: &UserId) -> Result<usize, RepositoryError> {
        panic!("watch store touched")
    }
}

impl CatalogRepository for UntouchableStore {
    fn upsert_many(&self, _asteroids: Vec<CachedAsteroid>) -> Result<usize, RepositoryError> {
        panic!("catalog touched")
    }

    fn get(&self, _id: &NeoId) -> Result<Option<CachedAsteroid>, RepositoryError> {
        panic!("catalog touched")
    }

    fn list(&self, _query: &CatalogQuery) -> Result<Vec<CachedAsteroid>, RepositoryError> {
        panic!("catalog touched")
    }

    fn search(&self, _needle: &str, _limit: usize) -> Result<Vec<CachedAsteroid>, RepositoryError> {
        panic!("catalog touched")
    }

    fn count(&self, _filter: &CatalogFilter) -> Result<usize, RepositoryError> {
        panic!("catalog touched")
    }
}

impl NotificationRepository for UntouchableStore {
    fn insert_unique(&self, _notification: NewNotification) -> Result<InsertOutcome, RepositoryError> {
        panic!("notification store touched")
    }

    fn find_by_event_key(
        &self,
        _user: &UserId,
        _key: &EventKey,
    ) -> Result<Option<Notification>, RepositoryError> {
        panic!("notification store touched")
    }

    fn list_for_user(
        &self,
        _user: &UserId,
        _limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError> {
        panic!("notification store touched")
    }

    fn mark_read(&self, _user: &UserId, _id: &NotificationId) -> Result<(), RepositoryError> {
        panic!("notification store touched")
    }

    fn mark_all_read(&self, _user: &UserId) -> Result<usize, RepositoryError> {
        panic!("notification store touched")
    }

    fn delete(&self, _user: &UserId, _id: &NotificationId) -> Result<(), RepositoryError> {
        panic!("notification store touched")
    }

    fn unread_count(&self, _user: &UserId) -> Result<usize, RepositoryError> {
        panic!("notification store touched")
    }
}

/// Watch store whose reads fail.
pub(super) struct OfflineWatchlist;

impl WatchRepository for OfflineWatchlist {
    fn insert(&self, _entry: NewWatchEntry) -> Result<WatchEntry, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _entry: WatchEntry) -> Result<WatchEntry, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _user: &UserId, _neo_id: &NeoId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn get(
        &self,
        _user: &UserId,
        _id: &WatchEntryId,
    ) -> Result<Option<WatchEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find(&self, _user: &UserId, _neo_id: &NeoId) -> Result<Option<WatchEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_for_user(&self, _user: &UserId) -> Result<Vec<WatchEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count_for_user(&self, _user: &UserId) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Catalog that serves point reads but fails listings.
pub(super) struct ListingOutage(pub(super) InMemoryCatalog);

impl CatalogRepository for ListingOutage {
    fn upsert_many(&self, asteroids: Vec<CachedAsteroid>) -> Result<usize, RepositoryError> {
        self.0.upsert_many(asteroids)
    }

    fn get(&self, id: &NeoId) -> Result<Option<CachedAsteroid>, RepositoryError> {
        self.0.get(id)
    }

    fn list(&self, _query: &CatalogQuery) -> Result<Vec<CachedAsteroid>, RepositoryError> {
        Err(RepositoryError::Unavailable("replica lagging".to_string()))
    }

    fn search(&self, needle: &str, limit: usize) -> Result<Vec<CachedAsteroid>, RepositoryError> {
        self.0.search(needle, limit)
    }

    fn count(&self, filter: &CatalogFilter) -> Result<usize, RepositoryError> {
        self.0.count(filter)
    }
}

/// Notification store wrapper with injectable faults.
pub(super) struct FaultyNotifications {
    pub(super) inner: InMemoryNotifications,
    /// Inserts whose event key starts with this prefix fail.
    pub(super) failing_prefix: Option<&'static str>,
    /// Hide existing rows from the advisory lookup, as a concurrent writer would.
    pub(super) blind_lookup: bool,
    /// Lookups for event keys starting with this prefix fail.
    pub(super) failing_lookup_prefix: Option<&'static str>,
    pub(super) insert_attempts: AtomicUsize,
}

impl FaultyNotifications {
    pub(super) fn new(failing_prefix: Option<&'static str>, blind_lookup: bool) -> Self {
        Self {
            inner: InMemoryNotifications::default(),
            failing_prefix,
            blind_lookup,
            failing_lookup_prefix: None,
            insert_attempts: AtomicUsize::new(0),
        }
    }

    pub(super) fn with_failing_lookup(prefix: &'static str) -> Self {
        Self {
            failing_lookup_prefix: Some(prefix),
            ..Self::new(None, false)
        }
    }

    pub(super) fn insert_attempts(&self) -> usize {
        self.insert_attempts.load(Ordering::SeqCst)
    }
}

impl NotificationRepository for FaultyNotifications {
    fn insert_unique(&self, notification: NewNotification) -> Result<InsertOutcome, RepositoryError> {
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);
        let failing = match (self.failing_prefix, notification.event_key()) {
            (Some(prefix), Some(key)) => key.as_str().starts_with(prefix),
            _ => false,
        };
        if failing {
            return Err(RepositoryError::Unavailable("write timeout".to_string()));
        }
        self.inner.insert_unique(notification)
    }

    fn find_by_event_key(
        &self,
        user: &UserId,
        key: &EventKey,
    ) -> Result<Option<Notification>, RepositoryError> {
        if let Some(prefix) = self.failing_lookup_prefix {
            if key.as_str().starts_with(prefix) {
                return Err(RepositoryError::Unavailable("read timeout".to_string()));
            }
        }
        if self.blind_lookup {
            return Ok(None);
        }
        self.inner.find_by_event_key(user, key)
    }

    fn list_for_user(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError> {
        self.inner.list_for_user(user, limit)
    }

    fn mark_read(&self, user: &UserId, id: &NotificationId) -> Result<(), RepositoryError> {
        self.inner.mark_read(user, id)
    }

    fn mark_all_read(&self, user: &UserId) -> Result<usize, RepositoryError> {
        self.inner.mark_all_read(user)
    }

    fn delete(&self, user: &UserId, id: &NotificationId) -> Result<(), RepositoryError> {
        self.inner.delete(user, id)
    }

    fn unread_count(&self, user: &UserId) -> Result<usize, RepositoryError> {
        self.inner.unread_count(user)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
