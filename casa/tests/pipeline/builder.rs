use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use casa::{Casa, CasaConfig, CasaError, RetryConfig};
use casa_core::connector::{CasaConnector, CatalogProvider};
use casa_core::{ListingId, RawListingDetail, SearchFilter};
use casa_mock::{MemorySink, MockConnector};

struct CatalogOnly;

#[async_trait]
impl CatalogProvider for CatalogOnly {
    async fn search(&self, _f: &SearchFilter) -> Result<Vec<ListingId>, CasaError> {
        Ok(vec![])
    }

    async fn fetch_detail(&self, id: &ListingId) -> Result<RawListingDetail, CasaError> {
        Err(CasaError::not_found(id.to_string()))
    }
}

impl CasaConnector for CatalogOnly {
    fn name(&self) -> &'static str {
        "catalog-only"
    }

    fn as_catalog_provider(&self) -> Option<&dyn CatalogProvider> {
        Some(self as &dyn CatalogProvider)
    }
}

fn invalid_arg(res: Result<Casa, CasaError>) -> String {
    match res {
        Err(CasaError::InvalidArg(msg)) => msg,
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("build should fail"),
    }
}

#[test]
fn build_requires_a_sink() {
    let msg = invalid_arg(
        Casa::builder()
            .with_connector(Arc::new(MockConnector::new()))
            .build(),
    );
    assert!(msg.contains("sink"));
}

#[test]
fn build_requires_every_role() {
    let msg = invalid_arg(
        Casa::builder()
            .with_connector(Arc::new(CatalogOnly))
            .with_sink(Arc::new(MemorySink::new()))
            .build(),
    );
    assert!(msg.contains("estimate"));
}

#[test]
fn build_rejects_zero_concurrency() {
    let msg = invalid_arg(
        Casa::builder()
            .with_connector(Arc::new(MockConnector::new()))
            .with_sink(Arc::new(MemorySink::new()))
            .max_concurrency(0)
            .build(),
    );
    assert!(msg.contains("max_concurrency"));
}

#[test]
fn roles_may_come_from_different_connectors() {
    let casa = Casa::builder()
        .with_connector(Arc::new(CatalogOnly))
        .with_connector(Arc::new(MockConnector::new()))
        .with_sink(Arc::new(MemorySink::new()))
        .retry(RetryConfig::new(5, Duration::from_millis(10), Duration::from_millis(20)))
        .provider_timeout(Duration::from_secs(30))
        .build()
        .unwrap();
    assert_eq!(casa.config().retry.max_attempts, 5);
    assert_eq!(casa.config().provider_timeout, Some(Duration::from_secs(30)));
}

#[tokio::test]
async fn first_registered_catalog_wins() {
    let casa = Casa::builder()
        .with_connector(Arc::new(CatalogOnly))
        .with_connector(Arc::new(MockConnector::new()))
        .with_sink(Arc::new(MemorySink::new()))
        .config(CasaConfig::default())
        .build()
        .unwrap();
    // CatalogOnly finds nothing even though the fixture connector would
    let ids = casa.discover(&[crate::helpers::almere_filter()]).await;
    assert!(ids.is_empty());
}
