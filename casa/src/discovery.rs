use std::collections::BTreeSet;

use futures::future::join_all;

use crate::Casa;
use casa_core::{ListingId, SearchFilter};

impl Casa {
    /// Turn filters into a deduplicated worklist.
    ///
    /// Filters are searched concurrently. A filter whose search fails contributes
    /// nothing; the error is logged and the remaining filters still count.
    #[tracing::instrument(
        name = "casa::discover",
        skip(self, filters),
        fields(filters = filters.len()),
    )]
    pub async fn discover(&self, filters: &[SearchFilter]) -> BTreeSet<ListingId> {
        let catalog = match self.catalog_provider() {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "catalog role unavailable; nothing discovered");
                return BTreeSet::new();
            }
        };
        let name = self.catalog.name();
        let timeout = self.cfg.provider_timeout;

        let searches = filters.iter().map(|f| async move {
            let res =
                Self::provider_call_with_timeout(name, "search", timeout, catalog.search(f)).await;
            (f, res)
        });

        let mut out = BTreeSet::new();
        for (filter, res) in join_all(searches).await {
            match res {
                Ok(ids) => {
                    tracing::debug!(area = ?filter.area(), found = ids.len(), "filter searched");
                    out.extend(ids);
                }
                Err(e) => {
                    tracing::warn!(area = ?filter.area(), error = %e, "filter search failed; skipping");
                }
            }
        }
        tracing::info!(listings = out.len(), "discovery complete");
        out
    }
}
