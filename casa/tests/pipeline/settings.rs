use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use casa::{CasaError, EnvConfig, SettingsStore};
use casa_core::{SettingsKind, SheetSource, SslMode};
use casa_mock::{MemorySink, MockConnector};

use crate::helpers::settings_source::fetches;
use crate::helpers::{StaticSheets, casa_with};

fn sheet(id: &str, gid: &str) -> SheetSource {
    SheetSource {
        sheet_id: id.into(),
        gid: gid.into(),
        kind: SettingsKind::ListingFilter,
    }
}

fn filter_sheets() -> StaticSheets {
    StaticSheets::new()
        .with_table(
            "s1",
            "0",
            &[
                &[
                    ("area", "Almere"),
                    ("price_min", "300000"),
                    ("price_max", "500000"),
                    ("days_old", "3"),
                    ("object_type", "house"),
                ],
                // min above max: skipped
                &[("area", "utrecht"), ("price_min", "9"), ("price_max", "1")],
            ],
        )
        .with_table(
            "s2",
            "7",
            &[&[
                ("area", "amsterdam,diemen"),
                ("price_min", "250000"),
                ("price_max", "400000"),
            ]],
        )
}

#[tokio::test]
async fn filters_load_lazily_and_are_cached() {
    let source = filter_sheets();
    let counter = source.fetch_counter();
    let store = SettingsStore::new(Arc::new(source), vec![sheet("s1", "0"), sheet("s2", "7")]);
    assert!(!store.is_cached(SettingsKind::ListingFilter));
    assert_eq!(fetches(&counter), 0);

    let filters = store.filters().await.unwrap();
    assert_eq!(filters.len(), 2);
    assert_eq!(fetches(&counter), 2);
    assert!(filters.iter().any(|f| f.area().contains("diemen")));
    assert!(filters.iter().all(|f| f.days_old() == 3));

    store.filters().await.unwrap();
    assert_eq!(fetches(&counter), 2);
}

#[tokio::test]
async fn invalidate_and_reload_refetch() {
    let source = filter_sheets();
    let counter = source.fetch_counter();
    let store = SettingsStore::new(Arc::new(source), vec![sheet("s1", "0")]);

    store.preload_all().await.unwrap();
    assert!(store.is_cached(SettingsKind::ListingFilter));
    assert_eq!(fetches(&counter), 1);

    store.invalidate(SettingsKind::ListingFilter).await;
    store.filters().await.unwrap();
    assert_eq!(fetches(&counter), 2);

    // raw rows, including the one that does not form a filter
    assert_eq!(store.reload(SettingsKind::ListingFilter).await.unwrap(), 2);
    assert_eq!(fetches(&counter), 3);
}

#[tokio::test]
async fn fetch_error_propagates_and_is_not_cached() {
    let source = filter_sheets();
    let counter = source.fetch_counter();
    let store = SettingsStore::new(Arc::new(source), vec![sheet("missing", "0")]);

    assert!(store.filters().await.unwrap_err().is_not_found());
    assert!(store.filters().await.is_err());
    assert_eq!(fetches(&counter), 2);
}

#[tokio::test]
async fn run_from_settings_uses_stored_filters() {
    let store = SettingsStore::new(Arc::new(filter_sheets()), vec![sheet("s1", "0")]);
    let sink = MemorySink::new();
    let casa = casa_with(Arc::new(MockConnector::new()), &sink);

    let summary = casa.run_from_settings(&store).await.unwrap();
    assert_eq!(summary.succeeded, 2);
    assert_eq!(sink.len().await, 2);
}

fn env(pairs: &[(&str, &str)]) -> Result<EnvConfig, CasaError> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    EnvConfig::from_lookup(|k| map.get(k).cloned())
}

#[test]
fn env_defaults_when_unset() {
    let cfg = env(&[]).unwrap();
    assert!(cfg.postgres.is_none());
    assert!(cfg.sheets.is_empty());
    assert_eq!(cfg.casa.retry.max_attempts, 3);
    assert_eq!(cfg.casa.provider_timeout, None);
    assert_eq!(cfg.casa.max_concurrency, None);
}

#[test]
fn env_reads_postgres_section() {
    let cfg = env(&[
        ("CASA_PG_HOST", "db.local"),
        ("CASA_PG_USER", "casa"),
        ("CASA_PG_PASSWORD", "secret"),
        ("CASA_PG_DATABASE", "listings"),
        ("CASA_PG_SSLMODE", "disable"),
    ])
    .unwrap();
    let pg = cfg.postgres.unwrap();
    assert_eq!(pg.port, 5432);
    assert_eq!(pg.sslmode, SslMode::Disable);
    assert_eq!(pg.schema, "casa");
}

#[test]
fn env_rejects_incomplete_postgres_section() {
    let err = env(&[("CASA_PG_HOST", "db.local"), ("CASA_PG_USER", "casa")]).unwrap_err();
    assert!(matches!(err, CasaError::Config(msg) if msg.contains("CASA_PG_PASSWORD")));
}

#[test]
fn env_sheet_scan_stops_at_first_gap() {
    let cfg = env(&[
        ("CASA_SHEETS_1_SHEET_ID", "a"),
        ("CASA_SHEETS_1_GID", "0"),
        ("CASA_SHEETS_1_KIND", "listing_filter"),
        ("CASA_SHEETS_2_SHEET_ID", "b"),
        ("CASA_SHEETS_2_GID", "1"),
        ("CASA_SHEETS_2_KIND", "search_filter"),
        ("CASA_SHEETS_4_SHEET_ID", "d"),
        ("CASA_SHEETS_4_GID", "3"),
        ("CASA_SHEETS_4_KIND", "listing_filter"),
    ])
    .unwrap();
    let ids: Vec<&str> = cfg.sheets.iter().map(|s| s.sheet_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn env_unknown_settings_kind_is_a_config_error() {
    let err = env(&[
        ("CASA_SHEETS_1_SHEET_ID", "a"),
        ("CASA_SHEETS_1_GID", "0"),
        ("CASA_SHEETS_1_KIND", "funda.models.Filter"),
    ])
    .unwrap_err();
    assert!(matches!(err, CasaError::Config(_)));
}

#[test]
fn env_parses_runtime_knobs() {
    let cfg = env(&[
        ("CASA_PROVIDER_TIMEOUT_SECS", "20"),
        ("CASA_MAX_CONCURRENCY", "8"),
    ])
    .unwrap();
    assert_eq!(cfg.casa.provider_timeout, Some(Duration::from_secs(20)));
    assert_eq!(cfg.casa.max_concurrency, Some(8));

    assert!(env(&[("CASA_MAX_CONCURRENCY", "many")]).is_err());
}

#[test]
fn env_rejects_zero_concurrency_cap() {
    let err = env(&[("CASA_MAX_CONCURRENCY", "0")]).unwrap_err();
    assert!(matches!(err, CasaError::Config(msg) if msg.contains("CASA_MAX_CONCURRENCY")));
}
