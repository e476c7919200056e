use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_application_routes;
use asteroid_watch::alerts::AlertService;
use asteroid_watch::catalog::{CatalogService, NasaFeedClient};
use asteroid_watch::config::AppConfig;
use asteroid_watch::error::AppError;
use asteroid_watch::store::{InMemoryCatalog, InMemoryNotifications, InMemoryWatchlist};
use asteroid_watch::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let feed = Arc::new(NasaFeedClient::new(&config.feed)?);
    let catalog = Arc::new(InMemoryCatalog::default());
    let catalog_service = Arc::new(CatalogService::new(catalog.clone(), feed));
    let alert_service = Arc::new(AlertService::new(
        Arc::new(InMemoryWatchlist::default()),
        catalog,
        Arc::new(InMemoryNotifications::default()),
        config.alerts,
    ));

    let app = with_application_routes(catalog_service, alert_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        window_days = config.alerts.window_days,
        selection = %config.alerts.selection,
        "asteroid watch service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
