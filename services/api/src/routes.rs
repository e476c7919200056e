use crate::infra::AppState;
use asteroid_watch::alerts::{
    alerts_router, AlertService, NotificationRepository, WatchRepository,
};
use asteroid_watch::catalog::{catalog_router, CatalogRepository, CatalogService, FeedProvider};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// Catalog and alert APIs plus health, readiness and metrics endpoints.
pub(crate) fn with_application_routes<C, F, W, N>(
    catalog: Arc<CatalogService<C, F>>,
    alerts: Arc<AlertService<W, C, N>>,
) -> axum::Router
where
    C: CatalogRepository + 'static,
    F: FeedProvider + 'static,
    W: WatchRepository + 'static,
    N: NotificationRepository + 'static,
{
    catalog_router(catalog)
        .merge(alerts_router(alerts))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
