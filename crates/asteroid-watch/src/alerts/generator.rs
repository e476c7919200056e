use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{
    EventKey, NewNotification, NotificationCategory, NotificationMetadata, UserId,
};
use super::format::format_kilometers;
use super::repository::{InsertOutcome, NotificationRepository, WatchRepository};
use super::window::{ApproachSelection, ApproachWindow, DEFAULT_WINDOW_DAYS};
use crate::catalog::{CachedAsteroid, CatalogFilter, CatalogQuery, CatalogRepository, CloseApproach};

pub const CRITICAL_APPROACH_TITLE: &str = "CRITICAL Close Approach";
pub const UPCOMING_APPROACH_TITLE: &str = "Upcoming Close Approach";
pub const GLOBAL_ALERT_TITLE: &str = "GLOBAL ALERT: High Risk Object Detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub window_days: i64,
    pub selection: ApproachSelection,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            selection: ApproachSelection::default(),
        }
    }
}

/// Counters for one generator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GenerationReport {
    pub watch_alerts: usize,
    pub global_alerts: usize,
    /// Events that already had a notification for the user.
    pub duplicates: usize,
    /// Events dropped because a store call failed.
    pub failed_events: usize,
    pub watchlist_unavailable: bool,
    pub catalog_unavailable: bool,
}

impl GenerationReport {
    pub fn created(&self) -> usize {
        self.watch_alerts + self.global_alerts
    }
}

enum Delivery {
    Created,
    Duplicate,
    Failed,
}

/// Pull-based scan producing close-approach notifications for one user.
///
/// Pass A walks the user's watch list, Pass B walks the HIGH and CRITICAL
/// catalog rows. Every notification carries an event key and the store keeps
/// at most one notification per `(user, event key)`, so repeated runs over the
/// same data create nothing new.
pub struct NotificationGenerator<W, C, N> {
    watchlist: Arc<W>,
    catalog: Arc<C>,
    notifications: Arc<N>,
    config: GeneratorConfig,
}

impl<W, C, N> NotificationGenerator<W, C, N>
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
        Self {
            watchlist,
            catalog,
            notifications,
            config,
        }
    }

    pub fn config(&self) -> GeneratorConfig {
        self.config
    }

    /// Runs both passes against the current UTC date and returns the number
    /// of notifications created. Never fails; without a user nothing is read.
    pub fn generate(&self, user: Option<&UserId>) -> usize {
        match user {
            Some(user) => self.run(user, Utc::now()).created(),
            None => 0,
        }
    }

    pub fn run(&self, user: &UserId, now: DateTime<Utc>) -> GenerationReport {
        let window = ApproachWindow::following(now, self.config.window_days);
        let mut report = GenerationReport::default();

        let watched = match self
            .watchlist
            .list_with_asteroids(user, &*self.catalog)
        {
            Ok(watched) => watched,
            Err(err) => {
                warn!(%err, user = %user, "watch list unavailable, skipping notification run");
                report.watchlist_unavailable = true;
                return report;
            }
        };

        for item in watched {
            let Some(asteroid) = item.asteroid else {
                continue;
            };
            let Some(approach) = window.select(&asteroid.object.close_approaches, self.config.selection)
            else {
                continue;
            };

            let breached = item.entry.is_breached_by(approach.miss_distance_km);
            let notification = watch_notification(user, &asteroid, approach, breached, now);
            match self.deliver(notification) {
                Delivery::Created => report.watch_alerts += 1,
                Delivery::Duplicate => report.duplicates += 1,
                Delivery::Failed => report.failed_events += 1,
            }
        }

        let candidates = match self
            .catalog
            .list(&CatalogQuery::all(CatalogFilter::high_risk()))
        {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(%err, user = %user, "catalog unavailable, skipping global alerts");
                report.catalog_unavailable = true;
                return report;
            }
        };

        for asteroid in candidates {
            let Some(approach) = window.select(&asteroid.object.close_approaches, self.config.selection)
            else {
                continue;
            };

            let notification = global_notification(user, &asteroid, approach, now);
            match self.deliver(notification) {
                Delivery::Created => report.global_alerts += 1,
                Delivery::Duplicate => report.duplicates += 1,
                Delivery::Failed => report.failed_events += 1,
            }
        }

        info!(
            user = %user,
            watch_alerts = report.watch_alerts,
            global_alerts = report.global_alerts,
            duplicates = report.duplicates,
            failed = report.failed_events,
            "notification run complete"
        );
        report
    }

    fn deliver(&self, notification: NewNotification) -> Delivery {
        if let Some(key) = notification.event_key() {
            match self
                .notifications
                .find_by_event_key(&notification.user_id, key)
            {
                Ok(Some(_)) => return Delivery::Duplicate,
                Ok(None) => {}
                Err(err) => {
                    warn!(%err, event = %key, "notification lookup failed, skipping event");
                    return Delivery::Failed;
                }
            }
        }

        let event = notification.event_key().cloned();
        match self.notifications.insert_unique(notification) {
            Ok(InsertOutcome::Inserted(_)) => Delivery::Created,
            Ok(InsertOutcome::Duplicate) => {
                debug!(event = ?event, "notification inserted concurrently, ignoring");
                Delivery::Duplicate
            }
            Err(err) => {
                warn!(%err, event = ?event, "notification insert failed, skipping event");
                Delivery::Failed
            }
        }
    }
}

fn watch_notification(
    user: &UserId,
    asteroid: &CachedAsteroid,
    approach: &CloseApproach,
    breached: bool,
    now: DateTime<Utc>,
) -> NewNotification {
    let (category, title) = if breached {
        (NotificationCategory::ThresholdBreach, CRITICAL_APPROACH_TITLE)
    } else {
        (NotificationCategory::CloseApproach, UPCOMING_APPROACH_TITLE)
    };

    NewNotification {
        user_id: user.clone(),
        neo_id: Some(asteroid.id().clone()),
        category,
        title: title.to_string(),
        message: format!(
            "{} will pass within {} km of Earth on {}.",
            asteroid.name(),
            format_kilometers(approach.miss_distance_km),
            approach.date.format("%Y-%m-%d")
        ),
        metadata: NotificationMetadata {
            event_id: Some(EventKey::close_approach(asteroid.id(), approach.date)),
            miss_distance_km: Some(approach.miss_distance_km),
            approach_date: Some(approach.date),
            ..NotificationMetadata::default()
        },
        created_at: now,
    }
}

fn global_notification(
    user: &UserId,
    asteroid: &CachedAsteroid,
    approach: &CloseApproach,
    now: DateTime<Utc>,
) -> NewNotification {
    NewNotification {
        user_id: user.clone(),
        neo_id: Some(asteroid.id().clone()),
        category: NotificationCategory::NewHazardous,
        title: GLOBAL_ALERT_TITLE.to_string(),
        message: format!(
            "Hazardous asteroid {} is approaching Earth! Level: {}. Miss distance: {} km.",
            asteroid.name(),
            asteroid.tier(),
            format_kilometers(approach.miss_distance_km)
        ),
        metadata: NotificationMetadata {
            event_id: Some(EventKey::global_hazardous(asteroid.id(), approach.date)),
            miss_distance_km: Some(approach.miss_distance_km),
            approach_date: Some(approach.date),
            risk_level: Some(asteroid.tier()),
            ..NotificationMetadata::default()
        },
        created_at: now,
    }
}
