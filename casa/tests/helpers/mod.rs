// Re-export helpers so tests can `use crate::helpers::*;`
pub mod settings_source;

pub use settings_source::StaticSheets;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use casa::{Casa, CasaError, SearchFilter};
use casa_core::{
    Address, CasaConnector, EnergyLabel, HistoryEntry, ListingId, NaiveDate, RawListingDetail,
    ValuationHistory,
};
use casa_mock::MemorySink;
use rust_decimal::Decimal;

/// The filter from the reference scenario: houses in Almere between 300k and 500k.
pub fn almere_filter() -> SearchFilter {
    SearchFilter::new(
        ["almere"],
        Decimal::from(300_000),
        Decimal::from(500_000),
        3,
        ["house"],
    )
    .expect("valid filter")
}

/// A filter that only differs from others by its area name.
pub fn area_filter(area: &str) -> SearchFilter {
    SearchFilter::new([area], Decimal::from(1), Decimal::from(2), 3, ["house"])
        .expect("valid filter")
}

/// Route `tracing` output to the test harness; `RUST_LOG=casa=debug` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn id(n: u32) -> ListingId {
    ListingId::new(format!("https://catalog.test/koop/almere/huis-{n}/"))
}

/// A detail that assembles into a valid record.
pub fn detail(id: &ListingId, street: &str) -> RawListingDetail {
    RawListingDetail {
        url: id.to_string(),
        asking_price: Decimal::from(350_000),
        offered_since: NaiveDate::from_ymd_opt(2024, 5, 28).expect("date"),
        year_built: 2001,
        area_to_live: 90,
        area_of_plot: Some(120),
        area_extras: BTreeMap::new(),
        volume: 300,
        number_of_rooms: 4,
        number_of_floors: 2,
        energy_label: EnergyLabel::B,
        energy_label_metadata: Some(EnergyLabel::B),
        property_type: "house".into(),
        name: street.into(),
        postal_code: "1324HA".into(),
        city: "Almere".into(),
        latitude: Decimal::new(5_238_112, 5),
        longitude: Decimal::new(522_904, 5),
        ..Default::default()
    }
}

pub fn address_of(d: &RawListingDetail) -> Address {
    Address::from_detail(d).expect("fixture has an address")
}

pub fn one_year_history() -> ValuationHistory {
    ValuationHistory {
        url: Some("https://history.test/1".into()),
        entries: vec![HistoryEntry {
            year: 2023,
            reference_date: NaiveDate::from_ymd_opt(2023, 1, 1).expect("date"),
            value: Decimal::from(340_000),
        }],
    }
}

pub fn transient() -> CasaError {
    CasaError::transient("P0", "503 Service Unavailable")
}

/// Build an orchestrator over one connector serving every role.
pub fn casa_with(conn: Arc<dyn CasaConnector>, sink: &MemorySink) -> Casa {
    Casa::builder()
        .with_connector(conn)
        .with_sink(Arc::new(sink.clone()))
        .build()
        .expect("all roles registered")
}

/// Same as [`casa_with`] with a per-call timeout.
pub fn casa_with_timeout(conn: Arc<dyn CasaConnector>, sink: &MemorySink, t: Duration) -> Casa {
    Casa::builder()
        .with_connector(conn)
        .with_sink(Arc::new(sink.clone()))
        .provider_timeout(t)
        .build()
        .expect("all roles registered")
}
