//! Per-user watch lists and the deduplicating notification generator.

pub mod domain;
pub mod format;
pub mod generator;
pub mod repository;
pub mod router;
pub mod service;
pub mod window;

#[cfg(test)]
mod tests;

pub use domain::{
    CustomNotification, EventKey, NewNotification, NewWatchEntry, Notification,
    NotificationCategory, NotificationId, NotificationMetadata, UserId, WatchEntry, WatchEntryId,
    WatchRequest, WatchUpdate, WatchedAsteroid,
};
pub use generator::{GenerationReport, GeneratorConfig, NotificationGenerator};
pub use repository::{InsertOutcome, NotificationRepository, WatchRepository};
pub use router::{alerts_router, USER_HEADER};
pub use service::{AlertService, AlertServiceError, NotificationFeed, WatchValidationError};
pub use window::{ApproachSelection, ApproachWindow, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
