use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::RepositoryError;
use crate::alerts::{
    EventKey, InsertOutcome, NewNotification, NewWatchEntry, Notification, NotificationId,
    NotificationRepository, UserId, WatchEntry, WatchEntryId, WatchRepository,
};
use crate::catalog::repository::by_score_desc;
use crate::catalog::{CachedAsteroid, CatalogFilter, CatalogQuery, CatalogRepository, NeoId};

fn lock<'a, T>(mutex: &'a Mutex<T>, store: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex.lock().map_err(|_| RepositoryError::poisoned(store))
}

#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    rows: Arc<Mutex<HashMap<NeoId, CachedAsteroid>>>,
}

impl InMemoryCatalog {
    pub fn with_rows(rows: impl IntoIterator<Item = CachedAsteroid>) -> Self {
        let rows = rows
            .into_iter()
            .map(|asteroid| (asteroid.id().clone(), asteroid))
            .collect();
        Self {
            rows: Arc::new(Mutex::new(rows)),
        }
    }

    fn sorted(&self, filter: &CatalogFilter) -> Result<Vec<CachedAsteroid>, RepositoryError> {
        let guard = lock(&self.rows, "catalog")?;
        let mut rows: Vec<CachedAsteroid> = guard
            .values()
            .filter(|asteroid| filter.matches(asteroid))
            .cloned()
            .collect();
        rows.sort_by(by_score_desc);
        Ok(rows)
    }
}

impl CatalogRepository for InMemoryCatalog {
    fn upsert_many(&self, asteroids: Vec<CachedAsteroid>) -> Result<usize, RepositoryError> {
        let mut guard = lock(&self.rows, "catalog")?;
        let count = asteroids.len();
        for asteroid in asteroids {
            guard.insert(asteroid.id().clone(), asteroid);
        }
        Ok(count)
    }

    fn get(&self, id: &NeoId) -> Result<Option<CachedAsteroid>, RepositoryError> {
        let guard = lock(&self.rows, "catalog")?;
        Ok(guard.get(id).cloned())
    }

    fn list(&self, query: &CatalogQuery) -> Result<Vec<CachedAsteroid>, RepositoryError> {
        let rows = self.sorted(&query.filter)?.into_iter().skip(query.offset);
        Ok(match query.limit {
            Some(limit) => rows.take(limit).collect(),
            None => rows.collect(),
        })
    }

    fn search(&self, needle: &str, limit: usize) -> Result<Vec<CachedAsteroid>, RepositoryError> {
        let needle = needle.to_lowercase();
        let mut matches: Vec<CachedAsteroid> = self
            .sorted(&CatalogFilter::default())?
            .into_iter()
            .filter(|asteroid| asteroid.name().to_lowercase().contains(&needle))
            .collect();
        matches.sort_by(|left, right| left.name().cmp(right.name()));
        matches.truncate(limit);
        Ok(matches)
    }

    fn count(&self, filter: &CatalogFilter) -> Result<usize, RepositoryError> {
        let guard = lock(&self.rows, "catalog")?;
        Ok(guard.values().filter(|asteroid| filter.matches(asteroid)).count())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryWatchlist {
    entries: Arc<Mutex<Vec<WatchEntry>>>,
    sequence: Arc<AtomicU64>,
}

impl WatchRepository for InMemoryWatchlist {
    fn insert(&self, entry: NewWatchEntry) -> Result<WatchEntry, RepositoryError> {
        let mut guard = lock(&self.entries, "watchlist")?;
        if guard
            .iter()
            .any(|existing| existing.user_id == entry.user_id && existing.neo_id == entry.neo_id)
        {
            return Err(RepositoryError::Conflict);
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let record = WatchEntry {
            id: WatchEntryId(format!("watch-{sequence:06}")),
            user_id: entry.user_id,
            neo_id: entry.neo_id,
            min_distance_threshold_km: entry.min_distance_threshold_km,
            notes: entry.notes,
            alert_enabled: entry.alert_enabled,
            created_at: entry.created_at,
            updated_at: entry.created_at,
        };
        guard.push(record.clone());
        Ok(record)
    }

    fn update(&self, entry: WatchEntry) -> Result<WatchEntry, RepositoryError> {
        let mut guard = lock(&self.entries, "watchlist")?;
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == entry.id && existing.user_id == entry.user_id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = entry.clone();
        Ok(entry)
    }

    fn remove(&self, user: &UserId, neo_id: &NeoId) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.entries, "watchlist")?;
        let before = guard.len();
        guard.retain(|entry| !(entry.user_id == *user && entry.neo_id == *neo_id));
        if guard.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }

    fn get(&self, user: &UserId, id: &WatchEntryId) -> Result<Option<WatchEntry>, RepositoryError> {
        let guard = lock(&self.entries, "watchlist")?;
        Ok(guard
            .iter()
            .find(|entry| entry.user_id == *user && entry.id == *id)
            .cloned())
    }

    fn find(&self, user: &UserId, neo_id: &NeoId) -> Result<Option<WatchEntry>, RepositoryError> {
        let guard = lock(&self.entries, "watchlist")?;
        Ok(guard
            .iter()
            .find(|entry| entry.user_id == *user && entry.neo_id == *neo_id)
            .cloned())
    }

    fn list_for_user(&self, user: &UserId) -> Result<Vec<WatchEntry>, RepositoryError> {
        let guard = lock(&self.entries, "watchlist")?;
        let mut entries: Vec<WatchEntry> = guard
            .iter()
            .rev()
            .filter(|entry| entry.user_id == *user)
            .cloned()
            .collect();
        entries.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(entries)
    }

    fn count_for_user(&self, user: &UserId) -> Result<usize, RepositoryError> {
        let guard = lock(&self.entries, "watchlist")?;
        Ok(guard.iter().filter(|entry| entry.user_id == *user).count())
    }
}

/// Inbox store. The single lock makes `insert_unique` check-and-write atomic,
/// standing in for a unique index on `(user_id, event_id)`.
#[derive(Default, Clone)]
pub struct InMemoryNotifications {
    records: Arc<Mutex<Vec<Notification>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryNotifications {
    pub fn all(&self) -> Result<Vec<Notification>, RepositoryError> {
        Ok(lock(&self.records, "notifications")?.clone())
    }
}

impl NotificationRepository for InMemoryNotifications {
    fn insert_unique(
        &self,
        notification: NewNotification,
    ) -> Result<InsertOutcome, RepositoryError> {
        let mut guard = lock(&self.records, "notifications")?;
        if let Some(key) = notification.event_key() {
            let duplicate = guard.iter().any(|existing| {
                existing.user_id == notification.user_id && existing.event_key() == Some(key)
            });
            if duplicate {
                return Ok(InsertOutcome::Duplicate);
            }
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let record = Notification::from_new(NotificationId(format!("ntf-{sequence:06}")), notification);
        guard.push(record.clone());
        Ok(InsertOutcome::Inserted(record))
    }

    fn find_by_event_key(
        &self,
        user: &UserId,
        key: &EventKey,
    ) -> Result<Option<Notification>, RepositoryError> {
        let guard = lock(&self.records, "notifications")?;
        Ok(guard
            .iter()
            .find(|record| record.user_id == *user && record.event_key() == Some(key))
            .cloned())
    }

    fn list_for_user(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let guard = lock(&self.records, "notifications")?;
        let mut records: Vec<Notification> = guard
            .iter()
            .rev()
            .filter(|record| record.user_id == *user)
            .cloned()
            .collect();
        records.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        records.truncate(limit);
        Ok(records)
    }

    fn mark_read(&self, user: &UserId, id: &NotificationId) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records, "notifications")?;
        let record = guard
            .iter_mut()
            .find(|record| record.user_id == *user && record.id == *id)
            .ok_or(RepositoryError::NotFound)?;
        record.is_read = true;
        Ok(())
    }

    fn mark_all_read(&self, user: &UserId) -> Result<usize, RepositoryError> {
        let mut guard = lock(&self.records, "notifications")?;
        let mut updated = 0;
        for record in guard
            .iter_mut()
            .filter(|record| record.user_id == *user && !record.is_read)
        {
            record.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }

    fn delete(&self, user: &UserId, id: &NotificationId) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records, "notifications")?;
        let before = guard.len();
        guard.retain(|record| !(record.user_id == *user && record.id == *id));
        if guard.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }

    fn unread_count(&self, user: &UserId) -> Result<usize, RepositoryError> {
        let guard = lock(&self.records, "notifications")?;
        Ok(guard
            .iter()
            .filter(|record| record.user_id == *user && !record.is_read)
            .count())
    }
}
