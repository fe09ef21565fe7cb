use std::collections::HashMap;

use async_trait::async_trait;

use crate::CasaError;
use casa_types::{
    Address, CanonicalRecord, ListingId, RawListingDetail, SearchFilter, SheetSource, UpsertAck,
    ValuationEstimate, ValuationHistory,
};

/// Focused role trait for connectors that serve the primary listing catalog.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Return the ids of listings matching one filter.
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<ListingId>, CasaError>;

    /// Fetch the full detail of one listing.
    ///
    /// Expected error classes:
    /// - `NotFound` when the listing was removed since discovery.
    /// - `Transient` for rate limiting and server-side failures (retried by the caller).
    /// - Anything else is terminal for the call.
    async fn fetch_detail(&self, id: &ListingId) -> Result<RawListingDetail, CasaError>;
}

/// Focused role trait for connectors that provide a market value estimate.
#[async_trait]
pub trait EstimateProvider: Send + Sync {
    /// Look up an estimate by postal address.
    ///
    /// `Ok(None)` means the source has no match for the address (for example a
    /// newly built property); this is not an error.
    async fn lookup_estimate(
        &self,
        address: &Address,
    ) -> Result<Option<ValuationEstimate>, CasaError>;
}

/// Focused role trait for connectors that provide assessed-value history.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Look up the assessment history by postal address.
    ///
    /// `Ok(None)` means the address could not be matched.
    async fn lookup_history(&self, address: &Address)
    -> Result<Option<ValuationHistory>, CasaError>;
}

/// Destination for canonical records.
///
/// Implementations must be safe to call concurrently for different listings and
/// idempotent for the same listing: writing an identical record twice leaves the
/// store in the same observable state as writing it once.
#[async_trait]
pub trait ListingSink: Send + Sync {
    /// Sink name for logs and error tagging.
    fn name(&self) -> &'static str;

    /// Insert or update the record keyed by its listing id.
    async fn upsert(&self, record: &CanonicalRecord) -> Result<UpsertAck, CasaError>;
}

/// One settings row: column header to cell text.
pub type SettingsRow = HashMap<String, String>;

/// Remote table of settings rows (for example a published spreadsheet tab).
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Fetch every data row of one table.
    async fn fetch_rows(&self, source: &SheetSource) -> Result<Vec<SettingsRow>, CasaError>;
}

/// Typed key for identifying connectors in logs and configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectorKey(pub &'static str);

impl ConnectorKey {
    /// Construct a new typed connector key from a static name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the inner static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

/// Primary interface a data source implements.
///
/// A connector advertises which roles it can serve through the `as_*` accessors;
/// the orchestrator picks the first registered connector for each role.
#[async_trait]
pub trait CasaConnector: Send + Sync {
    /// Stable connector name.
    fn name(&self) -> &'static str;

    /// Typed key derived from [`CasaConnector::name`].
    fn key(&self) -> ConnectorKey {
        ConnectorKey::new(self.name())
    }

    /// Human-readable vendor label.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Catalog role, if served.
    fn as_catalog_provider(&self) -> Option<&dyn CatalogProvider> {
        None
    }

    /// Estimate role, if served.
    fn as_estimate_provider(&self) -> Option<&dyn EstimateProvider> {
        None
    }

    /// History role, if served.
    fn as_history_provider(&self) -> Option<&dyn HistoryProvider> {
        None
    }
}
