//! Mock casa connectors and sink for tests.
//!
//! - [`MockConnector`] serves all three source roles from static fixtures.
//! - [`DynamicMockConnector`] defers every call to a test-controlled script.
//! - [`MemorySink`] is an idempotent in-memory `ListingSink`.
use std::time::Duration;

use async_trait::async_trait;
use casa_core::connector::{CasaConnector, CatalogProvider, EstimateProvider, HistoryProvider};
use casa_core::{
    Address, CasaError, ListingId, RawListingDetail, SearchFilter, ValuationEstimate,
    ValuationHistory,
};

mod dynamic;
mod fixtures;
mod sink;

pub use dynamic::{DynamicMockConnector, DynamicMockController, MockBehavior, MockCall};
pub use fixtures::listings::{L1, L2, L3};
pub use sink::MemorySink;

/// Fixture detail for one of [`L1`], [`L2`], [`L3`].
#[must_use]
pub fn fixture_detail(id: &str) -> Option<RawListingDetail> {
    fixtures::listings::by_id(id)
}

/// Mock connector for CI-safe tests. Provides deterministic data from static fixtures.
///
/// Magic inputs:
/// - a listing id containing `FAIL` fails the detail fetch with a fatal error;
/// - a listing id containing `GONE` reports the listing as removed;
/// - a listing id containing `TIMEOUT` sleeps before answering;
/// - a filter area named `fail` fails the search.
pub struct MockConnector;

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    async fn maybe_fail_or_timeout(id: &str, capability: &'static str) -> Result<(), CasaError> {
        if id.contains("FAIL") {
            return Err(CasaError::connector(
                "casa-mock",
                format!("forced failure: {capability}"),
            ));
        }
        if id.contains("GONE") {
            return Err(CasaError::not_found(format!("listing {id}")));
        }
        if id.contains("TIMEOUT") {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        Ok(())
    }
}

#[async_trait]
impl CasaConnector for MockConnector {
    fn name(&self) -> &'static str {
        "casa-mock"
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    fn as_catalog_provider(&self) -> Option<&dyn CatalogProvider> {
        Some(self as &dyn CatalogProvider)
    }

    fn as_estimate_provider(&self) -> Option<&dyn EstimateProvider> {
        Some(self as &dyn EstimateProvider)
    }

    fn as_history_provider(&self) -> Option<&dyn HistoryProvider> {
        Some(self as &dyn HistoryProvider)
    }
}

#[async_trait]
impl CatalogProvider for MockConnector {
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<ListingId>, CasaError> {
        if filter.area().contains("fail") {
            return Err(CasaError::connector("casa-mock", "forced failure: search"));
        }
        Ok(fixtures::listings::search(filter))
    }

    async fn fetch_detail(&self, id: &ListingId) -> Result<RawListingDetail, CasaError> {
        Self::maybe_fail_or_timeout(id.as_str(), "detail").await?;
        fixtures::listings::by_id(id.as_str())
            .ok_or_else(|| CasaError::not_found(format!("listing {id}")))
    }
}

#[async_trait]
impl EstimateProvider for MockConnector {
    async fn lookup_estimate(
        &self,
        address: &Address,
    ) -> Result<Option<ValuationEstimate>, CasaError> {
        Ok(fixtures::valuations::estimate_for(address))
    }
}

#[async_trait]
impl HistoryProvider for MockConnector {
    async fn lookup_history(
        &self,
        address: &Address,
    ) -> Result<Option<ValuationHistory>, CasaError> {
        Ok(fixtures::valuations::history_for(address))
    }
}
