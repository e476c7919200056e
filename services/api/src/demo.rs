use crate::infra::{parse_date, parse_kilometers, LiveAlertService, LiveCatalogService};
use asteroid_watch::alerts::{
    AlertService, ApproachSelection, GeneratorConfig, Notification, UserId, WatchRequest,
    MAX_WINDOW_DAYS,
};
use asteroid_watch::catalog::{
    assess_risk, CachedAsteroid, CatalogService, CloseApproach, DiameterRange, FeedError,
    FeedProvider, FeedRange, NasaFeedClient, NearEarthObject, NeoId,
};
use asteroid_watch::config::AppConfig;
use asteroid_watch::error::AppError;
use asteroid_watch::store::{InMemoryCatalog, InMemoryNotifications, InMemoryWatchlist};
use asteroid_watch::telemetry;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::Args;
use std::sync::Arc;

const DEMO_USER: &str = "demo-observer";

#[derive(Args, Debug, Default)]
pub(crate) struct IngestArgs {
    /// First day of the feed range (YYYY-MM-DD). Defaults to a week before the end date.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Last day of the feed range (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) end: Option<NaiveDate>,
    /// Number of scored objects to list
    #[arg(long, default_value_t = 10)]
    pub(crate) top: usize,
    /// Print the full ingest summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct AssessArgs {
    /// Display name for the object
    #[arg(long, default_value = "(unnamed)")]
    pub(crate) name: String,
    /// Flag the object as potentially hazardous
    #[arg(long)]
    pub(crate) hazardous: bool,
    /// Minimum estimated diameter in kilometers
    #[arg(long, value_parser = parse_kilometers, default_value = "0")]
    pub(crate) min_diameter_km: f64,
    /// Maximum estimated diameter in kilometers (defaults to the minimum)
    #[arg(long, value_parser = parse_kilometers)]
    pub(crate) max_diameter_km: Option<f64>,
    /// Closest miss distance in kilometers. Omit for an object with no recorded approach.
    #[arg(long, value_parser = parse_kilometers)]
    pub(crate) miss_km: Option<f64>,
    /// Approach date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) approach_date: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the demo date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Days ahead of today that count as upcoming
    #[arg(long)]
    pub(crate) window_days: Option<i64>,
    /// Approach used when an object has several in the window: first | earliest
    #[arg(long)]
    pub(crate) selection: Option<ApproachSelection>,
    /// Print the generated inbox as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_ingest(args: IngestArgs) -> Result<(), AppError> {
    let IngestArgs {
        start,
        end,
        top,
        json,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let end = end.unwrap_or_else(|| Utc::now().date_naive());
    let range = match start {
        Some(start) => FeedRange::new(start, end)?,
        None => FeedRange::week_ending(end)?,
    };

    let feed = Arc::new(NasaFeedClient::new(&config.feed)?);
    let service: LiveCatalogService =
        CatalogService::new(Arc::new(InMemoryCatalog::default()), feed);
    let summary = service.ingest_range(range).await?;

    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Ingest summary unavailable: {err}"),
        }
        return Ok(());
    }

    println!(
        "Feed {} to {}: {} objects fetched, {} cached",
        summary.range.start, summary.range.end, summary.fetched, summary.cached
    );
    if let Some(error) = &summary.cache_error {
        println!("  Catalog write failed: {error}");
    }

    let stats = service.stats()?;
    println!(
        "- {} hazardous | {} critical | {} high",
        stats.hazardous, stats.critical, stats.high
    );

    println!("Highest risk objects:");
    for asteroid in service.page(Default::default())?.iter().take(top) {
        render_asteroid(asteroid);
    }

    Ok(())
}

pub(crate) fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let AssessArgs {
        name,
        hazardous,
        min_diameter_km,
        max_diameter_km,
        miss_km,
        approach_date,
    } = args;

    let max_diameter_km = max_diameter_km.unwrap_or(min_diameter_km);
    if max_diameter_km < min_diameter_km {
        return Err(AppError::InvalidInput(format!(
            "maximum diameter {max_diameter_km} km is below the minimum {min_diameter_km} km"
        )));
    }

    let date = approach_date.unwrap_or_else(|| Utc::now().date_naive());
    let object = NearEarthObject {
        id: NeoId::from("cli"),
        name,
        nasa_jpl_url: None,
        absolute_magnitude: None,
        is_potentially_hazardous: hazardous,
        estimated_diameter: DiameterRange::new(min_diameter_km, max_diameter_km),
        close_approaches: miss_km
            .map(|miss_distance_km| CloseApproach {
                date,
                miss_distance_km,
                relative_velocity_kph: None,
                orbiting_body: "Earth".to_string(),
            })
            .into_iter()
            .collect(),
        orbital_data: None,
    };

    let assessment = assess_risk(&object);
    println!(
        "{}: score {} -> {}",
        object.name,
        assessment.score,
        assessment.tier.label()
    );
    println!(
        "  hazard {} | size {} | proximity {}",
        assessment.factors.hazard, assessment.factors.size, assessment.factors.proximity
    );

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        window_days,
        selection,
        json,
    } = args;

    let now = today.map(start_of_day).unwrap_or_else(Utc::now);
    let today = now.date_naive();

    let mut config = GeneratorConfig::default();
    if let Some(days) = window_days {
        if !(0..=MAX_WINDOW_DAYS).contains(&days) {
            return Err(AppError::InvalidInput(format!(
                "window must be between 0 and {MAX_WINDOW_DAYS} days, got {days}"
            )));
        }
        config.window_days = days;
    }
    if let Some(selection) = selection {
        config.selection = selection;
    }

    println!("Asteroid watch demo ({today})");

    let catalog = Arc::new(InMemoryCatalog::default());
    let catalog_service = CatalogService::new(catalog.clone(), Arc::new(SampleFeed { today }));
    let summary = catalog_service.ingest_recent(today).await?;
    println!(
        "\nSample feed: {} objects scored and cached",
        summary.cached
    );
    for asteroid in catalog_service.page(Default::default())? {
        render_asteroid(&asteroid);
    }

    let service: LiveAlertService = AlertService::new(
        Arc::new(InMemoryWatchlist::default()),
        catalog,
        Arc::new(InMemoryNotifications::default()),
        config,
    );
    let user = UserId(DEMO_USER.to_string());

    println!(
        "\nWatch list for {} (window {} days, {} approach)",
        user, config.window_days, config.selection
    );
    for (neo_id, threshold) in [("54088823", Some(500_000.0)), ("2024817", None)] {
        let request = WatchRequest {
            neo_id: NeoId::from(neo_id),
            notes: None,
            min_distance_threshold_km: threshold,
        };
        match service.watch(&user, request, now) {
            Ok(entry) => match entry.min_distance_threshold_km {
                Some(limit) => println!("- {} alerts inside {limit} km", entry.neo_id),
                None => println!("- {} with no distance threshold", entry.neo_id),
            },
            Err(err) => println!("- {neo_id} could not be watched: {err}"),
        }
    }

    let feed = service.notifications(&user, now)?;
    println!(
        "\nGenerated {} notifications ({} watch list, {} global)",
        feed.created, feed.report.watch_alerts, feed.report.global_alerts
    );
    if json {
        match serde_json::to_string_pretty(&feed.notifications) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Inbox payload unavailable: {err}"),
        }
    } else {
        for notification in &feed.notifications {
            render_notification(notification);
        }
    }

    let repeat = service.notifications(&user, now)?;
    println!(
        "\nSecond run: {} new, {} duplicates suppressed",
        repeat.created, repeat.report.duplicates
    );

    if let Some(first) = repeat.notifications.first() {
        service.mark_read(&user, &first.id)?;
    }
    println!("Unread after reading one: {}", service.unread_count(&user)?);

    Ok(())
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn render_asteroid(asteroid: &CachedAsteroid) {
    let closest = asteroid
        .object
        .closest_approach()
        .map(|approach| format!("{:.0} km on {}", approach.miss_distance_km, approach.date))
        .unwrap_or_else(|| "no recorded approach".to_string());
    println!(
        "  - {} [{}] score {} ({}) | closest {}",
        asteroid.name(),
        asteroid.id(),
        asteroid.score(),
        asteroid.tier().label(),
        closest
    );
}

fn render_notification(notification: &Notification) {
    let status = if notification.is_read { "read" } else { "new" };
    println!(
        "  - [{}] {} ({})",
        notification.category.label(),
        notification.title,
        status
    );
    println!("    {}", notification.message);
}

/// Fixed week of objects dated relative to the demo day.
struct SampleFeed {
    today: NaiveDate,
}

impl SampleFeed {
    fn objects(&self) -> Vec<NearEarthObject> {
        vec![
            sample_object(
                "2000433",
                "433 Eros",
                true,
                (1.1, 1.5),
                vec![self.approach(2, 750_000.0)],
            ),
            sample_object(
                "3542519",
                "(2010 PK9)",
                true,
                (0.4, 0.5),
                vec![self.approach(3, 2_000_000.0)],
            ),
            sample_object(
                "2024817",
                "(2017 AE3)",
                false,
                (0.3, 0.6),
                vec![self.approach(5, 3_600_000.0), self.approach(9, 1_200_000.0)],
            ),
            sample_object(
                "54088823",
                "(2020 XR)",
                false,
                (0.02, 0.04),
                vec![self.approach(1, 400_000.0)],
            ),
            sample_object(
                "2099942",
                "99942 Apophis",
                true,
                (0.3, 0.4),
                vec![self.approach(-3, 90_000.0)],
            ),
        ]
    }

    fn approach(&self, days_ahead: i64, miss_distance_km: f64) -> CloseApproach {
        CloseApproach {
            date: self.today + Duration::days(days_ahead),
            miss_distance_km,
            relative_velocity_kph: Some(54_000.0),
            orbiting_body: "Earth".to_string(),
        }
    }
}

fn sample_object(
    id: &str,
    name: &str,
    hazardous: bool,
    diameter_km: (f64, f64),
    close_approaches: Vec<CloseApproach>,
) -> NearEarthObject {
    NearEarthObject {
        id: NeoId::from(id),
        name: name.to_string(),
        nasa_jpl_url: None,
        absolute_magnitude: None,
        is_potentially_hazardous: hazardous,
        estimated_diameter: DiameterRange::new(diameter_km.0, diameter_km.1),
        close_approaches,
        orbital_data: None,
    }
}

#[async_trait]
impl FeedProvider for SampleFeed {
    async fn fetch_range(&self, _range: FeedRange) -> Result<Vec<NearEarthObject>, FeedError> {
        Ok(self.objects())
    }

    async fn fetch_by_id(&self, id: &NeoId) -> Result<Option<NearEarthObject>, FeedError> {
        Ok(self.objects().into_iter().find(|object| &object.id == id))
    }
}
