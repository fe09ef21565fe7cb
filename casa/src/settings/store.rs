use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::try_join_all;
use moka::future::Cache;

use casa_core::{CasaError, SearchFilter, SettingsKind, SettingsRow, SettingsSource, SheetSource};

type Rows = Arc<Vec<SettingsRow>>;

/// Process-wide cache of externally managed settings, keyed by kind.
///
/// Rows are loaded lazily on first use and stay cached until invalidated.
/// The store is owned by the caller and passed to [`crate::Casa::run_from_settings`].
#[derive(Clone)]
pub struct SettingsStore {
    source: Arc<dyn SettingsSource>,
    sheets: Vec<SheetSource>,
    cache: Cache<SettingsKind, Rows>,
}

impl SettingsStore {
    /// Create a store reading `sheets` through `source`.
    #[must_use]
    pub fn new(source: Arc<dyn SettingsSource>, sheets: Vec<SheetSource>) -> Self {
        Self {
            source,
            sheets,
            cache: Cache::builder().max_capacity(64).build(),
        }
    }

    /// Configured sheets.
    #[must_use]
    pub fn sheets(&self) -> &[SheetSource] {
        &self.sheets
    }

    /// Whether rows of `kind` are currently cached.
    #[must_use]
    pub fn is_cached(&self, kind: SettingsKind) -> bool {
        self.cache.contains_key(&kind)
    }

    async fn load(&self, kind: SettingsKind) -> Result<Rows, CasaError> {
        let tabs: Vec<&SheetSource> = self.sheets.iter().filter(|s| s.kind == kind).collect();
        if tabs.is_empty() {
            tracing::warn!(kind = %kind, "no sheet configured for settings kind");
        }
        let fetched = try_join_all(tabs.iter().map(|s| self.source.fetch_rows(s))).await?;
        let rows: Vec<SettingsRow> = fetched.into_iter().flatten().collect();
        tracing::info!(kind = %kind, sheets = tabs.len(), rows = rows.len(), "settings loaded");
        Ok(Arc::new(rows))
    }

    /// Rows of one kind, loading them on first use.
    ///
    /// # Errors
    /// Returns the source's error when the rows are not cached and cannot be fetched.
    pub async fn rows(&self, kind: SettingsKind) -> Result<Rows, CasaError> {
        self.cache
            .try_get_with(kind, self.load(kind))
            .await
            .map_err(|e| (*e).clone())
    }

    /// Active search filters.
    ///
    /// Rows that do not form a valid filter are skipped with a warning.
    ///
    /// # Errors
    /// Returns the source's error when the rows cannot be fetched.
    pub async fn filters(&self) -> Result<Vec<SearchFilter>, CasaError> {
        let rows = self.rows(SettingsKind::ListingFilter).await?;
        let mut out = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            match SearchFilter::from_row(row) {
                Ok(f) => out.push(f),
                Err(e) => tracing::warn!(row = i + 1, error = %e, "skipping invalid filter row"),
            }
        }
        Ok(out)
    }

    /// Load every configured kind up front.
    ///
    /// # Errors
    /// Returns the first fetch error.
    pub async fn preload_all(&self) -> Result<(), CasaError> {
        let kinds: BTreeSet<SettingsKind> = self.sheets.iter().map(|s| s.kind).collect();
        for kind in kinds {
            self.rows(kind).await?;
        }
        Ok(())
    }

    /// Drop the cached rows of one kind; the next read fetches them again.
    pub async fn invalidate(&self, kind: SettingsKind) {
        self.cache.invalidate(&kind).await;
    }

    /// Invalidate and immediately refetch one kind, returning the row count.
    ///
    /// # Errors
    /// Returns the source's error; the kind is left uncached in that case.
    pub async fn reload(&self, kind: SettingsKind) -> Result<usize, CasaError> {
        self.invalidate(kind).await;
        Ok(self.rows(kind).await?.len())
    }
}
