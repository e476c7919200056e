use super::common::*;
use chrono::Duration;
use std::sync::Arc;

use crate::alerts::domain::{EventKey, NotificationCategory};
use crate::alerts::generator::{GeneratorConfig, NotificationGenerator, GLOBAL_ALERT_TITLE};
use crate::alerts::repository::WatchRepository;
use crate::alerts::window::ApproachSelection;
use crate::catalog::{NeoId, RiskTier};
use crate::store::{InMemoryCatalog, InMemoryNotifications, InMemoryWatchlist};

#[test]
fn missing_user_creates_nothing_and_touches_no_store() {
    let untouchable = Arc::new(UntouchableStore);
    let generator = NotificationGenerator::new(
        untouchable.clone(),
        untouchable.clone(),
        untouchable,
        GeneratorConfig::default(),
    );

    assert_eq!(generator.generate(None), 0);
}

#[test]
fn watched_approach_in_window_creates_close_approach_notification() {
    let stores = stores(vec![benign_flyby()]);
    stores
        .watchlist
        .insert(watch("54088823", None))
        .expect("watch stored");

    let report = stores.generator(GeneratorConfig::default()).run(&user(), now());

    assert_eq!(report.watch_alerts, 1);
    assert_eq!(report.global_alerts, 0);
    let stored = stores.stored();
    assert_eq!(stored.len(), 1);
    let notification = &stored[0];
    assert_eq!(notification.category, NotificationCategory::CloseApproach);
    assert_eq!(notification.title, "Upcoming Close Approach");
    assert_eq!(
        notification.message,
        "(2020 XR) will pass within 400,000 km of Earth on 2026-10-18."
    );
    assert_eq!(
        notification.metadata.event_id,
        Some(EventKey::close_approach(&NeoId::from("54088823"), date(10, 18)))
    );
    assert_eq!(notification.metadata.miss_distance_km, Some(400_000.0));
    assert_eq!(notification.metadata.approach_date, Some(date(10, 18)));
    assert!(!notification.is_read);
}

#[test]
fn custom_threshold_breach_upgrades_the_alert() {
    let stores = stores(vec![benign_flyby()]);
    stores
        .watchlist
        .insert(watch("54088823", Some(500_000.0)))
        .expect("watch stored");

    stores.generator(GeneratorConfig::default()).run(&user(), now());

    let stored = stores.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].category, NotificationCategory::ThresholdBreach);
    assert_eq!(stored[0].title, "CRITICAL Close Approach");
}

#[test]
fn threshold_above_the_miss_distance_only_is_not_a_breach() {
    let stores = stores(vec![benign_flyby()]);
    stores
        .watchlist
        .insert(watch("54088823", Some(350_000.0)))
        .expect("watch stored");

    stores.generator(GeneratorConfig::default()).run(&user(), now());

    assert_eq!(stores.stored()[0].category, NotificationCategory::CloseApproach);
}

#[test]
fn second_run_creates_nothing_new() {
    let stores = stores(vec![benign_flyby(), high_risk_flyby()]);
    stores
        .watchlist
        .insert(watch("54088823", Some(500_000.0)))
        .expect("watch stored");
    let generator = stores.generator(GeneratorConfig::default());

    let first = generator.run(&user(), now()).created();
    let second = generator.run(&user(), now()).created();

    assert_eq!(first, 2);
    assert_eq!(second, 0);
    assert_eq!(stores.stored().len(), 2);
}

#[test]
fn second_run_reports_duplicates() {
    let stores = stores(vec![high_risk_flyby()]);
    let generator = stores.generator(GeneratorConfig::default());

    generator.run(&user(), now());
    let report = generator.run(&user(), now());

    assert_eq!(report.created(), 0);
    assert_eq!(report.duplicates, 1);
}

#[test]
fn approaches_that_left_the_window_are_never_notified() {
    let stores = stores(vec![benign_flyby()]);
    stores
        .watchlist
        .insert(watch("54088823", None))
        .expect("watch stored");

    let later = now() + Duration::days(9);
    let created = stores
        .generator(GeneratorConfig::default())
        .run(&user(), later)
        .created();

    assert_eq!(created, 0);
    assert!(stores.stored().is_empty());
}

#[test]
fn window_opens_after_today_and_closes_on_the_last_day() {
    let rows = vec![
        asteroid("1", "(today)", false, (0.02, 0.02), vec![approach(date(10, 16), 9.0e6)]),
        asteroid("2", "(edge)", false, (0.02, 0.02), vec![approach(date(10, 23), 9.0e6)]),
        asteroid("3", "(beyond)", false, (0.02, 0.02), vec![approach(date(10, 24), 9.0e6)]),
    ];
    let stores = stores(rows);
    for id in ["1", "2", "3"] {
        stores.watchlist.insert(watch(id, None)).expect("watch stored");
    }

    let report = stores.generator(GeneratorConfig::default()).run(&user(), now());

    assert_eq!(report.watch_alerts, 1);
    assert_eq!(stores.stored()[0].neo_id, Some(NeoId::from("2")));
}

#[test]
fn approach_dated_today_counts_only_at_midnight() {
    let stores = stores(vec![asteroid(
        "1",
        "(today)",
        false,
        (0.02, 0.02),
        vec![approach(date(10, 16), 9.0e6)],
    )]);
    stores.watchlist.insert(watch("1", None)).expect("watch stored");
    let generator = stores.generator(GeneratorConfig::default());

    assert_eq!(generator.run(&user(), now()).created(), 0);

    let midnight = date(10, 16).and_hms_opt(0, 0, 0).unwrap().and_utc();
    assert_eq!(generator.run(&user(), midnight).created(), 1);
}

#[test]
fn oversized_window_still_generates() {
    let stores = stores(vec![high_risk_flyby()]);
    let config = GeneratorConfig {
        window_days: 1_000_000_000_000,
        selection: ApproachSelection::default(),
    };

    let report = stores.generator(config).run(&user(), now());

    assert_eq!(report.global_alerts, 1);
}

#[test]
fn high_risk_catalog_objects_alert_every_user() {
    let stores = stores(vec![high_risk_flyby(), benign_flyby()]);

    let report = stores.generator(GeneratorConfig::default()).run(&user(), now());

    assert_eq!(report.watch_alerts, 0);
    assert_eq!(report.global_alerts, 1);
    let stored = stores.stored();
    let notification = &stored[0];
    assert_eq!(notification.category, NotificationCategory::NewHazardous);
    assert_eq!(notification.title, GLOBAL_ALERT_TITLE);
    assert_eq!(
        notification.message,
        "Hazardous asteroid (2010 PK9) is approaching Earth! Level: HIGH. Miss distance: 2,000,000 km."
    );
    assert_eq!(notification.metadata.risk_level, Some(RiskTier::High));
    assert_eq!(
        notification.metadata.event_id,
        Some(EventKey::global_hazardous(&NeoId::from("3542519"), date(10, 19)))
    );
}

#[test]
fn watched_high_risk_object_yields_one_alert_per_pass() {
    let stores = stores(vec![high_risk_flyby()]);
    stores
        .watchlist
        .insert(watch("3542519", None))
        .expect("watch stored");

    let report = stores.generator(GeneratorConfig::default()).run(&user(), now());

    assert_eq!(report.watch_alerts, 1);
    assert_eq!(report.global_alerts, 1);
    let mut categories: Vec<_> = stores
        .stored()
        .into_iter()
        .map(|notification| notification.category)
        .collect();
    categories.sort_by_key(|category| category.label());
    assert_eq!(
        categories,
        vec![NotificationCategory::CloseApproach, NotificationCategory::NewHazardous]
    );
}

#[test]
fn watch_entries_without_cached_rows_are_skipped() {
    let stores = stores(Vec::new());
    stores
        .watchlist
        .insert(watch("99999999", None))
        .expect("watch stored");

    let report = stores.generator(GeneratorConfig::default()).run(&user(), now());
    assert_eq!(report.created(), 0);
}

#[test]
fn disabled_alerts_still_generate_watch_notifications() {
    let stores = stores(vec![benign_flyby()]);
    let mut entry = watch("54088823", None);
    entry.alert_enabled = false;
    stores.watchlist.insert(entry).expect("watch stored");

    let report = stores.generator(GeneratorConfig::default()).run(&user(), now());
    assert_eq!(report.watch_alerts, 1);
}

#[test]
fn selection_strategy_picks_the_event_date() {
    let unsorted = asteroid(
        "2101955",
        "101955 Bennu",
        false,
        (0.02, 0.02),
        vec![approach(date(10, 22), 6.0e6), approach(date(10, 17), 7.0e6)],
    );

    for (selection, expected) in [
        (ApproachSelection::FirstInSourceOrder, date(10, 22)),
        (ApproachSelection::ChronologicallyEarliest, date(10, 17)),
    ] {
        let stores = stores(vec![unsorted.clone()]);
        stores
            .watchlist
            .insert(watch("2101955", None))
            .expect("watch stored");
        let config = GeneratorConfig {
            window_days: 7,
            selection,
        };

        stores.generator(config).run(&user(), now());

        assert_eq!(stores.stored()[0].metadata.approach_date, Some(expected));
    }
}

#[test]
fn watch_list_outage_writes_nothing() {
    let catalog = Arc::new(InMemoryCatalog::with_rows([high_risk_flyby()]));
    let notifications = Arc::new(InMemoryNotifications::default());
    let generator = NotificationGenerator::new(
        Arc::new(OfflineWatchlist),
        catalog,
        notifications.clone(),
        GeneratorConfig::default(),
    );

    let report = generator.run(&user(), now());

    assert_eq!(report.created(), 0);
    assert!(report.watchlist_unavailable);
    assert!(notifications.all().expect("store readable").is_empty());
}

#[test]
fn catalog_listing_outage_keeps_watch_alerts() {
    let watchlist = Arc::new(InMemoryWatchlist::default());
    watchlist
        .insert(watch("54088823", None))
        .expect("watch stored");
    let catalog = Arc::new(ListingOutage(InMemoryCatalog::with_rows([
        benign_flyby(),
        high_risk_flyby(),
    ])));
    let notifications = Arc::new(InMemoryNotifications::default());
    let generator = NotificationGenerator::new(
        watchlist,
        catalog,
        notifications.clone(),
        GeneratorConfig::default(),
    );

    let report = generator.run(&user(), now());

    assert_eq!(report.watch_alerts, 1);
    assert_eq!(report.global_alerts, 0);
    assert!(report.catalog_unavailable);
    assert_eq!(generator.run(&user(), now()).created(), 0);
}

#[test]
fn failed_insert_skips_only_that_event() {
    let stores = stores(vec![benign_flyby(), high_risk_flyby()]);
    stores
        .watchlist
        .insert(watch("54088823", None))
        .expect("watch stored");
    let notifications = Arc::new(FaultyNotifications::new(Some("close-approach-"), false));
    let generator = NotificationGenerator::new(
        stores.watchlist.clone(),
        stores.catalog.clone(),
        notifications.clone(),
        GeneratorConfig::default(),
    );

    let report = generator.run(&user(), now());

    assert_eq!(report.failed_events, 1);
    assert_eq!(report.global_alerts, 1);
    assert_eq!(report.created(), 1);
    assert_eq!(notifications.insert_attempts(), 2);
}

#[test]
fn store_constraint_absorbs_duplicates_missed_by_lookup() {
    let stores = stores(vec![high_risk_flyby()]);
    let notifications = Arc::new(FaultyNotifications::new(None, true));
    let generator = NotificationGenerator::new(
        stores.watchlist.clone(),
        stores.catalog.clone(),
        notifications.clone(),
        GeneratorConfig::default(),
    );

    assert_eq!(generator.run(&user(), now()).created(), 1);
    assert_eq!(generator.run(&user(), now()).created(), 0);
    assert_eq!(notifications.insert_attempts(), 2);
    assert_eq!(
        notifications
            .inner
            .all()
            .expect("store readable")
            .len(),
        1
    );
}

#[test]
fn notifications_are_scoped_per_user() {
    let stores = stores(vec![high_risk_flyby()]);
    let generator = stores.generator(GeneratorConfig::default());
    let other = crate::alerts::UserId("user-91bc".to_string());

    assert_eq!(generator.run(&user(), now()).created(), 1);
    assert_eq!(generator.run(&other, now()).created(), 1);
}

#[test]
fn failed_existence_check_skips_the_event_without_inserting() {
    let stores = stores(vec![benign_flyby(), high_risk_flyby()]);
    stores
        .watchlist
        .insert(watch("54088823", None))
        .expect("watch stored");
    let notifications = Arc::new(FaultyNotifications::with_failing_lookup("close-approach-"));
    let generator = NotificationGenerator::new(
        stores.watchlist.clone(),
        stores.catalog.clone(),
        notifications.clone(),
        GeneratorConfig::default(),
    );

    let report = generator.run(&user(), now());

    assert_eq!(report.failed_events, 1);
    assert_eq!(report.watch_alerts, 0);
    assert_eq!(report.global_alerts, 1);
    assert_eq!(notifications.insert_attempts(), 1);
    let stored = notifications.inner.all().expect("store readable");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].category, NotificationCategory::NewHazardous);
}

#[test]
fn global_alerts_are_delivered_highest_score_first() {
    // Ids sort the other way round, so only score ordering passes.
    let critical = asteroid(
        "3999999",
        "(2026 CK1)",
        true,
        (1.2, 1.6),
        vec![approach(date(10, 20), 600_000.0)],
    );
    let stores = stores(vec![high_risk_flyby(), critical]);

    let report = stores.generator(GeneratorConfig::default()).run(&user(), now());

    assert_eq!(report.global_alerts, 2);
    let levels: Vec<_> = stores
        .stored()
        .into_iter()
        .map(|notification| (notification.neo_id, notification.metadata.risk_level))
        .collect();
    assert_eq!(
        levels,
        vec![
            (Some(NeoId::from("3999999")), Some(RiskTier::Critical)),
            (Some(NeoId::from("3542519")), Some(RiskTier::High)),
        ]
    );
}
