use chrono::Utc;

use crate::Casa;
use crate::retry::with_retry;
use casa_core::{
    Address, Assembled, CasaError, EnrichmentOutcome, ListingId, RawListingDetail, SkipReason,
    ValuationEstimate, ValuationHistory, assemble, validate_record,
};

impl Casa {
    /// Enrich one listing: fetch its detail, look up both valuations by address,
    /// reconcile, assemble and validate.
    ///
    /// Never panics on source errors and never returns early for a sibling's
    /// failure; every outcome is reported through [`EnrichmentOutcome`].
    #[tracing::instrument(name = "casa::enrich", skip(self, id), fields(listing = %id))]
    pub async fn enrich(&self, id: &ListingId) -> EnrichmentOutcome {
        match self.try_enrich(id).await {
            Ok(outcome) => outcome,
            Err(e) => EnrichmentOutcome::Failed(e),
        }
    }

    async fn try_enrich(&self, id: &ListingId) -> Result<EnrichmentOutcome, CasaError> {
        let detail = match self.fetch_detail(id).await {
            Ok(d) => d,
            Err(e) if e.is_not_found() => {
                return Ok(EnrichmentOutcome::Skipped(SkipReason::ListingUnavailable));
            }
            Err(e) => return Err(e),
        };

        let Some(address) = Address::from_detail(&detail) else {
            return Ok(EnrichmentOutcome::Skipped(SkipReason::AddressUnresolvable));
        };

        let (estimate, history) = tokio::join!(
            self.lookup_estimate(&address),
            self.lookup_history(&address)
        );
        let (estimate, history) = (estimate?, history?);
        if estimate.is_none() {
            tracing::debug!(address = %address, "no estimate for address");
        }

        let Assembled {
            record,
            label_mismatch,
        } = assemble(id.clone(), address, detail, estimate, history, Utc::now());
        if let Some(m) = label_mismatch {
            tracing::warn!(
                listing = %id,
                field = m.field,
                primary = %m.primary,
                secondary = %m.secondary,
                "energy label mismatch; keeping page badge value"
            );
        }

        validate_record(&record)?;
        Ok(EnrichmentOutcome::Success(Box::new(record)))
    }

    async fn fetch_detail(&self, id: &ListingId) -> Result<RawListingDetail, CasaError> {
        let catalog = self.catalog_provider()?;
        let name = self.catalog.name();
        let timeout = self.cfg.provider_timeout;
        with_retry(&self.cfg.retry, id, "fetch_detail", id.as_str(), move || {
            Self::provider_call_with_timeout(name, "detail", timeout, catalog.fetch_detail(id))
        })
        .await
    }

    async fn lookup_estimate(
        &self,
        address: &Address,
    ) -> Result<Option<ValuationEstimate>, CasaError> {
        let provider = self.estimate_provider()?;
        let res = Self::provider_call_with_timeout(
            self.estimate.name(),
            "estimate",
            self.cfg.provider_timeout,
            provider.lookup_estimate(address),
        )
        .await;
        match res {
            Err(e) if e.is_not_found() => Ok(None),
            other => other,
        }
    }

    async fn lookup_history(&self, address: &Address) -> Result<ValuationHistory, CasaError> {
        let provider = self.history_provider()?;
        let res = Self::provider_call_with_timeout(
            self.history.name(),
            "history",
            self.cfg.provider_timeout,
            provider.lookup_history(address),
        )
        .await;
        match res {
            Ok(found) => Ok(found.unwrap_or_default()),
            Err(e) if e.is_not_found() => Ok(ValuationHistory::empty()),
            Err(e) => Err(e),
        }
    }
}
