use super::domain::{
    EventKey, NewNotification, NewWatchEntry, Notification, NotificationId, UserId, WatchEntry,
    WatchEntryId, WatchedAsteroid,
};
use crate::catalog::{CatalogRepository, NeoId};
use crate::store::RepositoryError;

/// Per-user watch entries. `(user_id, neo_id)` is unique.
pub trait WatchRepository: Send + Sync {
    fn insert(&self, entry: NewWatchEntry) -> Result<WatchEntry, RepositoryError>;
    fn update(&self, entry: WatchEntry) -> Result<WatchEntry, RepositoryError>;
    fn remove(&self, user: &UserId, neo_id: &NeoId) -> Result<(), RepositoryError>;
    fn get(&self, user: &UserId, id: &WatchEntryId) -> Result<Option<WatchEntry>, RepositoryError>;
    fn find(&self, user: &UserId, neo_id: &NeoId) -> Result<Option<WatchEntry>, RepositoryError>;
    /// Newest first.
    fn list_for_user(&self, user: &UserId) -> Result<Vec<WatchEntry>, RepositoryError>;
    fn count_for_user(&self, user: &UserId) -> Result<usize, RepositoryError>;

    /// Entries joined with their catalog rows. Any failed read fails the join.
    fn list_with_asteroids(
        &self,
        user: &UserId,
        catalog: &dyn CatalogRepository,
    ) -> Result<Vec<WatchedAsteroid>, RepositoryError> {
        self.list_for_user(user)?
            .into_iter()
            .map(|entry| {
                let asteroid = catalog.get(&entry.neo_id)?;
                Ok(WatchedAsteroid { entry, asteroid })
            })
            .collect()
    }
}

/// Result of an insert guarded by the `(user_id, event key)` constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(Notification),
    Duplicate,
}

/// Per-user notification inbox.
pub trait NotificationRepository: Send + Sync {
    /// Inserts unless the user already holds a notification with the same
    /// event key. The check and the write happen atomically; notifications
    /// without an event key are always inserted.
    fn insert_unique(&self, notification: NewNotification)
        -> Result<InsertOutcome, RepositoryError>;
    fn find_by_event_key(
        &self,
        user: &UserId,
        key: &EventKey,
    ) -> Result<Option<Notification>, RepositoryError>;
    /// Newest first.
    fn list_for_user(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError>;
    fn mark_read(&self, user: &UserId, id: &NotificationId) -> Result<(), RepositoryError>;
    fn mark_all_read(&self, user: &UserId) -> Result<usize, RepositoryError>;
    fn delete(&self, user: &UserId, id: &NotificationId) -> Result<(), RepositoryError>;
    fn unread_count(&self, user: &UserId) -> Result<usize, RepositoryError>;
}
