use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::domain::{
    CustomNotification, NewNotification, NewWatchEntry, Notification, NotificationCategory,
    NotificationId, NotificationMetadata, UserId, WatchEntry, WatchEntryId, WatchRequest,
    WatchUpdate, WatchedAsteroid,
};
use super::generator::{GenerationReport, GeneratorConfig, NotificationGenerator};
use super::repository::{InsertOutcome, NotificationRepository, WatchRepository};
use crate::catalog::{CatalogRepository, NeoId};
use crate::store::RepositoryError;

pub const NOTIFICATION_PAGE_SIZE: usize = 50;

/// Metadata fields owned by the generator; custom payloads cannot set them.
const RESERVED_METADATA_KEYS: [&str; 4] =
    ["event_id", "miss_distance_km", "approach_date", "risk_level"];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WatchValidationError {
    #[error("neo id must not be empty")]
    EmptyNeoId,
    #[error("distance threshold must be a positive number of kilometers, got {0}")]
    InvalidThreshold(f64),
    #[error("notification title must not be empty")]
    EmptyTitle,
}

#[derive(Debug, thiserror::Error)]
pub enum AlertServiceError {
    #[error(transparent)]
    Validation(#[from] WatchValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Inbox view returned after a generator run.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationFeed {
    pub created: usize,
    pub report: GenerationReport,
    pub notifications: Vec<Notification>,
}

/// Watch list management and the notification inbox for one user at a time.
pub struct AlertService<W, C, N> {
    watchlist: Arc<W>,
    catalog: Arc<C>,
    notifications: Arc<N>,
    generator: NotificationGenerator<W, C, N>,
}

impl<W, C, N> AlertService<W, C, N>
where
    W: WatchRepository + 'static,
    C: CatalogRepository + 'static,
    N: NotificationRepository + 'static,
{
    pub fn new(
        watchlist: Arc<W>,
        catalog: Arc<C>,
        notifications: Arc<N>,
        config: GeneratorConfig,
    ) -> Self {
        let generator = NotificationGenerator::new(
            Arc::clone(&watchlist),
            Arc::clone(&catalog),
            Arc::clone(&notifications),
            config,
        );
        Self {
            watchlist,
            catalog,
            notifications,
            generator,
        }
    }

    pub fn generator(&self) -> &NotificationGenerator<W, C, N> {
        &self.generator
    }

    pub fn watch(
        &self,
        user: &UserId,
        request: WatchRequest,
        now: DateTime<Utc>,
    ) -> Result<WatchEntry, AlertServiceError> {
        let neo_id = NeoId(request.neo_id.0.trim().to_string());
        if neo_id.0.is_empty() {
            return Err(WatchValidationError::EmptyNeoId.into());
        }
        validate_threshold(request.min_distance_threshold_km)?;

        let entry = self.watchlist.insert(NewWatchEntry {
            user_id: user.clone(),
            neo_id,
            min_distance_threshold_km: request.min_distance_threshold_km,
            notes: request.notes,
            alert_enabled: true,
            created_at: now,
        })?;
        info!(user = %user, neo_id = %entry.neo_id, "object added to watch list");
        Ok(entry)
    }

    pub fn unwatch(&self, user: &UserId, neo_id: &NeoId) -> Result<(), AlertServiceError> {
        self.watchlist.remove(user, neo_id)?;
        info!(user = %user, neo_id = %neo_id, "object removed from watch list");
        Ok(())
    }

    pub fn update_watch(
        &self,
        user: &UserId,
        id: &WatchEntryId,
        update: WatchUpdate,
        now: DateTime<Utc>,
    ) -> Result<WatchEntry, AlertServiceError> {
        let mut entry = self
            .watchlist
            .get(user, id)?
            .ok_or(RepositoryError::NotFound)?;

        if let Some(threshold) = update.min_distance_threshold_km {
            validate_threshold(threshold)?;
            entry.min_distance_threshold_km = threshold;
        }
        if let Some(notes) = update.notes {
            entry.notes = notes;
        }
        if let Some(alert_enabled) = update.alert_enabled {
            entry.alert_enabled = alert_enabled;
        }
        entry.updated_at = now;

        Ok(self.watchlist.update(entry)?)
    }

    pub fn watchlist(&self, user: &UserId) -> Result<Vec<WatchedAsteroid>, AlertServiceError> {
        Ok(self.watchlist.list_with_asteroids(user, &*self.catalog)?)
    }

    pub fn is_watching(&self, user: &UserId, neo_id: &NeoId) -> Result<bool, AlertServiceError> {
        Ok(self.watchlist.find(user, neo_id)?.is_some())
    }

    pub fn watched_entry(
        &self,
        user: &UserId,
        neo_id: &NeoId,
    ) -> Result<Option<WatchEntry>, AlertServiceError> {
        Ok(self.watchlist.find(user, neo_id)?)
    }

    pub fn watched_count(&self, user: &UserId) -> Result<usize, AlertServiceError> {
        Ok(self.watchlist.count_for_user(user)?)
    }

    /// Generates pending notifications, then returns the newest page of the
    /// inbox. Generation problems are logged by the generator and never fail
    /// the read.
    pub fn notifications(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<NotificationFeed, AlertServiceError> {
        let report = self.generator.run(user, now);
        let notifications = self
            .notifications
            .list_for_user(user, NOTIFICATION_PAGE_SIZE)?;
        Ok(NotificationFeed {
            created: report.created(),
            report,
            notifications,
        })
    }

    pub fn unread_count(&self, user: &UserId) -> Result<usize, AlertServiceError> {
        Ok(self.notifications.unread_count(user)?)
    }

    pub fn mark_read(&self, user: &UserId, id: &NotificationId) -> Result<(), AlertServiceError> {
        Ok(self.notifications.mark_read(user, id)?)
    }

    pub fn mark_all_read(&self, user: &UserId) -> Result<usize, AlertServiceError> {
        Ok(self.notifications.mark_all_read(user)?)
    }

    pub fn delete_notification(
        &self,
        user: &UserId,
        id: &NotificationId,
    ) -> Result<(), AlertServiceError> {
        Ok(self.notifications.delete(user, id)?)
    }

    /// Stores a free-form notification. Custom notifications carry no event
    /// key and are never deduplicated.
    pub fn notify_custom(
        &self,
        user: &UserId,
        custom: CustomNotification,
        now: DateTime<Utc>,
    ) -> Result<Notification, AlertServiceError> {
        if custom.title.trim().is_empty() {
            return Err(WatchValidationError::EmptyTitle.into());
        }

        let mut extra = custom.metadata;
        extra.retain(|key, _| !RESERVED_METADATA_KEYS.contains(&key.as_str()));

        let notification = NewNotification {
            user_id: user.clone(),
            neo_id: custom.neo_id,
            category: NotificationCategory::Custom,
            title: custom.title,
            message: custom.message,
            metadata: NotificationMetadata {
                extra,
                ..NotificationMetadata::default()
            },
            created_at: now,
        };

        match self.notifications.insert_unique(notification)? {
            InsertOutcome::Inserted(notification) => Ok(notification),
            InsertOutcome::Duplicate => Err(RepositoryError::Conflict.into()),
        }
    }
}

fn validate_threshold(threshold: Option<f64>) -> Result<(), WatchValidationError> {
    match threshold {
        Some(value) if !value.is_finite() || value <= 0.0 => {
            Err(WatchValidationError::InvalidThreshold(value))
        }
        _ => Ok(()),
    }
}
