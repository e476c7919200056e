use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::domain::{
    CustomNotification, NotificationId, UserId, WatchEntryId, WatchRequest, WatchUpdate,
};
use super::repository::{NotificationRepository, WatchRepository};
use super::service::{AlertService, AlertServiceError};
use crate::catalog::{CatalogRepository, NeoId};
use crate::store::RepositoryError;

/// Header carrying the caller's identity, set by the authenticating proxy.
pub const USER_HEADER: &str = "x-user-id";

type SharedAlerts<W, C, N> = Arc<AlertService<W, C, N>>;

/// Router for watch lists and notification inboxes.
pub fn alerts_router<W, C, N>(service: SharedAlerts<W, C, N>) -> Router
where
    W: WatchRepository + 'static,
    C: CatalogRepository + 'static,
    N: NotificationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/watchlist",
            get(watchlist_handler::<W, C, N>).post(watch_handler::<W, C, N>),
        )
        .route("/api/v1/watchlist/count", get(watch_count_handler::<W, C, N>))
        .route(
            "/api/v1/watchlist/entries/:entry_id",
            patch(update_watch_handler::<W, C, N>),
        )
        .route(
            "/api/v1/watchlist/:neo_id",
            get(watch_status_handler::<W, C, N>).delete(unwatch_handler::<W, C, N>),
        )
        .route(
            "/api/v1/notifications",
            get(notifications_handler::<W, C, N>).post(custom_notification_handler::<W, C, N>),
        )
        .route(
            "/api/v1/notifications/unread-count",
            get(unread_count_handler::<W, C, N>),
        )
        .route(
            "/api/v1/notifications/read-all",
            post(mark_all_read_handler::<W, C, N>),
        )
        .route(
            "/api/v1/notifications/:id/read",
            post(mark_read_handler::<W, C, N>),
        )
        .route(
            "/api/v1/notifications/:id",
            delete(delete_notification_handler::<W, C, N>),
        )
        .with_state(service)
}

fn caller(headers: &HeaderMap) -> Result<UserId, Response> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| UserId(value.to_string()))
        .ok_or_else(|| {
            let payload = json!({
                "error": format!("missing {USER_HEADER} header"),
            });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        })
}

pub(crate) async fn watchlist_handler<W, C, N>(
    State(service): State<SharedAlerts<W, C, N>>,
    headers: HeaderMap,
) -> Response
where
    W: WatchRepository + 'static,
    C: CatalogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let user = match caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match service.watchlist(&user) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn watch_handler<W, C, N>(
    State(service): State<SharedAlerts<W, C, N>>,
    headers: HeaderMap,
    Json(request): Json<WatchRequest>,
) -> Response
where
    W: WatchRepository + 'static,
    C: CatalogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let user = match caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match service.watch(&user, request, Utc::now()) {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn watch_count_handler<W, C, N>(
    State(service): State<SharedAlerts<W, C, N>>,
    headers: HeaderMap,
) -> Response
where
    W: WatchRepository + 'static,
    C: CatalogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let user = match caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match service.watched_count(&user) {
        Ok(count) => (StatusCode::OK, Json(json!({ "count": count }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn watch_status_handler<W, C, N>(
    State(service): State<SharedAlerts<W, C, N>>,
    headers: HeaderMap,
    Path(neo_id): Path<String>,
) -> Response
where
    W: WatchRepository + 'static,
    C: CatalogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let user = match caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match service.watched_entry(&user, &NeoId(neo_id)) {
        Ok(entry) => {
            let payload = json!({
                "watching": entry.is_some(),
                "entry": entry,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn unwatch_handler<W, C, N>(
    State(service): State<SharedAlerts<W, C, N>>,
    headers: HeaderMap,
    Path(neo_id): Path<String>,
) -> Response
where
    W: WatchRepository + 'static,
    C: CatalogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let user = match caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match service.unwatch(&user, &NeoId(neo_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_watch_handler<W, C, N>(
    State(service): State<SharedAlerts<W, C, N>>,
    headers: HeaderMap,
    Path(entry_id): Path<String>,
    Json(update): Json<WatchUpdate>,
) -> Response
where
    W: WatchRepository + 'static,
    C: CatalogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let user = match caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match service.update_watch(&user, &WatchEntryId(entry_id), update, Utc::now()) {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn notifications_handler<W, C, N>(
    State(service): State<SharedAlerts<W, C, N>>,
    headers: HeaderMap,
) -> Response
where
    W: WatchRepository + 'static,
    C: CatalogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let user = match caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match service.notifications(&user, Utc::now()) {
        Ok(feed) => (StatusCode::OK, Json(feed)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn custom_notification_handler<W, C, N>(
    State(service): State<SharedAlerts<W, C, N>>,
    headers: HeaderMap,
    Json(custom): Json<CustomNotification>,
) -> Response
where
    W: WatchRepository + 'static,
    C: CatalogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let user = match caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match service.notify_custom(&user, custom, Utc::now()) {
        Ok(notification) => (StatusCode::CREATED, Json(notification)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn unread_count_handler<W, C, N>(
    State(service): State<SharedAlerts<W, C, N>>,
    headers: HeaderMap,
) -> Response
where
    W: WatchRepository + 'static,
    C: CatalogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let user = match caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match service.unread_count(&user) {
        Ok(count) => (StatusCode::OK, Json(json!({ "unread": count }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn mark_all_read_handler<W, C, N>(
    State(service): State<SharedAlerts<W, C, N>>,
    headers: HeaderMap,
) -> Response
where
    W: WatchRepository + 'static,
    C: CatalogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let user = match caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match service.mark_all_read(&user) {
        Ok(updated) => (StatusCode::OK, Json(json!({ "updated": updated }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn mark_read_handler<W, C, N>(
    State(service): State<SharedAlerts<W, C, N>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    W: WatchRepository + 'static,
    C: CatalogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let user = match caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match service.mark_read(&user, &NotificationId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_notification_handler<W, C, N>(
    State(service): State<SharedAlerts<W, C, N>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    W: WatchRepository + 'static,
    C: CatalogRepository + 'static,
    N: NotificationRepository + 'static,
{
    let user = match caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match service.delete_notification(&user, &NotificationId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AlertServiceError) -> Response {
    let status = match &error {
        AlertServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AlertServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AlertServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        AlertServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
