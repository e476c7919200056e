use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::catalog::{CachedAsteroid, NeoId, RiskTier};

/// Account identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchEntryId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub String);

/// A user's subscription to one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub id: WatchEntryId,
    pub user_id: UserId,
    pub neo_id: NeoId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_distance_threshold_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub alert_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WatchEntry {
    /// True when a custom threshold is set and the approach comes within it.
    pub fn is_breached_by(&self, miss_distance_km: f64) -> bool {
        self.min_distance_threshold_km
            .is_some_and(|threshold| miss_distance_km <= threshold)
    }
}

/// Watch entry before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWatchEntry {
    pub user_id: UserId,
    pub neo_id: NeoId,
    pub min_distance_threshold_km: Option<f64>,
    pub notes: Option<String>,
    pub alert_enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Watch entry joined with its catalog row, when the object has been cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchedAsteroid {
    #[serde(flatten)]
    pub entry: WatchEntry,
    pub asteroid: Option<CachedAsteroid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    CloseApproach,
    ThresholdBreach,
    NewHazardous,
    Custom,
}

impl NotificationCategory {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationCategory::CloseApproach => "close_approach",
            NotificationCategory::ThresholdBreach => "threshold_breach",
            NotificationCategory::NewHazardous => "new_hazardous",
            NotificationCategory::Custom => "custom",
        }
    }
}

/// Deterministic identifier of a notifiable event.
///
/// Watch alerts and catalog-wide alerts use disjoint prefixes, so the same
/// approach can produce one of each for a user but never two of either.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKey(String);

impl EventKey {
    pub fn close_approach(neo_id: &NeoId, date: NaiveDate) -> Self {
        Self(format!("close-approach-{}-{}", neo_id, date.format("%Y-%m-%d")))
    }

    pub fn global_hazardous(neo_id: &NeoId, date: NaiveDate) -> Self {
        Self(format!("global-hazardous-{}-{}", neo_id, date.format("%Y-%m-%d")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NotificationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miss_distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskTier>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Notification before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: UserId,
    pub neo_id: Option<NeoId>,
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
    pub metadata: NotificationMetadata,
    pub created_at: DateTime<Utc>,
}

impl NewNotification {
    pub fn event_key(&self) -> Option<&EventKey> {
        self.metadata.event_id.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neo_id: Option<NeoId>,
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
    pub metadata: NotificationMetadata,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_new(id: NotificationId, notification: NewNotification) -> Self {
        let NewNotification {
            user_id,
            neo_id,
            category,
            title,
            message,
            metadata,
            created_at,
        } = notification;

        Self {
            id,
            user_id,
            neo_id,
            category,
            title,
            message,
            metadata,
            is_read: false,
            created_at,
        }
    }

    pub fn event_key(&self) -> Option<&EventKey> {
        self.metadata.event_id.as_ref()
    }
}

/// Request body for adding an object to a watchlist.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WatchRequest {
    pub neo_id: NeoId,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub min_distance_threshold_km: Option<f64>,
}

/// Partial update of a watch entry. An explicit `null` clears the field.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WatchUpdate {
    #[serde(default)]
    pub alert_enabled: Option<bool>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub min_distance_threshold_km: Option<Option<f64>>,
}

fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Notification authored outside the generator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomNotification {
    #[serde(default)]
    pub neo_id: Option<NeoId>,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}
