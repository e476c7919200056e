use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{NearEarthObject, NeoId};
use super::feed::{FeedError, FeedProvider, FeedRange};
use super::repository::CatalogRepository;
use super::risk::assess_risk;
use super::service::{CatalogService, CatalogServiceError, PageRequest};

/// Router exposing scoring, ingestion, and catalog reads.
pub fn catalog_router<R, F>(service: Arc<CatalogService<R, F>>) -> Router
where
    R: CatalogRepository + 'static,
    F: FeedProvider + 'static,
{
    Router::new()
        .route("/api/v1/risk/assess", post(assess_handler))
        .route("/api/v1/asteroids", get(page_handler::<R, F>))
        .route("/api/v1/asteroids/feed", post(ingest_handler::<R, F>))
        .route("/api/v1/asteroids/search", get(search_handler::<R, F>))
        .route("/api/v1/asteroids/hazardous", get(hazardous_handler::<R, F>))
        .route("/api/v1/asteroids/stats", get(stats_handler::<R, F>))
        .route("/api/v1/asteroids/:neo_id", get(lookup_handler::<R, F>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IngestRequest {
    #[serde(default)]
    pub(crate) start_date: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) end_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageParams {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    #[serde(default)]
    pub(crate) offset: Option<usize>,
    #[serde(default)]
    pub(crate) hazardous_only: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchParams {
    #[serde(default)]
    pub(crate) q: String,
}

pub(crate) async fn assess_handler(Json(object): Json<NearEarthObject>) -> Response {
    if let Some(approach) = object
        .close_approaches
        .iter()
        .find(|approach| !approach.has_valid_distance())
    {
        let payload = json!({
            "error": format!(
                "miss distance on {} must be a non-negative number of kilometers",
                approach.date
            ),
        });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    }
    (StatusCode::OK, Json(assess_risk(&object))).into_response()
}

pub(crate) async fn ingest_handler<R, F>(
    State(service): State<Arc<CatalogService<R, F>>>,
    Json(request): Json<IngestRequest>,
) -> Response
where
    R: CatalogRepository + 'static,
    F: FeedProvider + 'static,
{
    let today = Utc::now().date_naive();
    let range = match (request.start_date, request.end_date) {
        (None, None) => Ok(FeedRange::trailing_week(today)),
        (Some(start), end) => FeedRange::new(start, end.unwrap_or(today)),
        (None, Some(end)) => FeedRange::week_ending(end),
    };

    let range = match range {
        Ok(range) => range,
        Err(error) => return error_response(CatalogServiceError::Feed(error)),
    };

    match service.ingest_range(range).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn page_handler<R, F>(
    State(service): State<Arc<CatalogService<R, F>>>,
    Query(params): Query<PageParams>,
) -> Response
where
    R: CatalogRepository + 'static,
    F: FeedProvider + 'static,
{
    let request = PageRequest {
        limit: params.limit,
        offset: params.offset.unwrap_or(0),
        hazardous_only: params.hazardous_only,
    };
    match service.page(request) {
        Ok(asteroids) => (StatusCode::OK, Json(asteroids)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn search_handler<R, F>(
    State(service): State<Arc<CatalogService<R, F>>>,
    Query(params): Query<SearchParams>,
) -> Response
where
    R: CatalogRepository + 'static,
    F: FeedProvider + 'static,
{
    match service.search(&params.q) {
        Ok(asteroids) => (StatusCode::OK, Json(asteroids)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn hazardous_handler<R, F>(
    State(service): State<Arc<CatalogService<R, F>>>,
) -> Response
where
    R: CatalogRepository + 'static,
    F: FeedProvider + 'static,
{
    match service.hazardous() {
        Ok(asteroids) => (StatusCode::OK, Json(asteroids)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stats_handler<R, F>(
    State(service): State<Arc<CatalogService<R, F>>>,
) -> Response
where
    R: CatalogRepository + 'static,
    F: FeedProvider + 'static,
{
    match service.stats() {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn lookup_handler<R, F>(
    State(service): State<Arc<CatalogService<R, F>>>,
    Path(neo_id): Path<String>,
) -> Response
where
    R: CatalogRepository + 'static,
    F: FeedProvider + 'static,
{
    let id = NeoId(neo_id);
    match service.lookup(&id).await {
        Some(asteroid) => (StatusCode::OK, Json(asteroid)).into_response(),
        None => {
            let payload = json!({
                "error": "asteroid not found",
                "neo_id": id.0,
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    }
}

fn error_response(error: CatalogServiceError) -> Response {
    let status = match &error {
        CatalogServiceError::Feed(FeedError::InvalidRange { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        CatalogServiceError::Feed(_) => StatusCode::BAD_GATEWAY,
        CatalogServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
