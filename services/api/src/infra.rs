use asteroid_watch::alerts::AlertService;
use asteroid_watch::catalog::{CatalogService, NasaFeedClient};
use asteroid_watch::store::{InMemoryCatalog, InMemoryNotifications, InMemoryWatchlist};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type LiveCatalogService = CatalogService<InMemoryCatalog, NasaFeedClient>;
pub(crate) type LiveAlertService =
    AlertService<InMemoryWatchlist, InMemoryCatalog, InMemoryNotifications>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_kilometers(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .replace(',', "")
        .parse()
        .map_err(|err| format!("failed to parse '{raw}' as kilometers ({err})"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("'{raw}' is not a non-negative distance"))
    }
}
