use std::sync::Arc;
use std::time::Duration;

use casa_core::connector::{CatalogProvider, EstimateProvider, HistoryProvider};
use casa_core::{CasaConfig, CasaConnector, CasaError, ListingSink, RetryConfig};

/// Orchestrator that enriches catalog listings with valuation data and persists them.
///
/// Cheap to clone: connectors and the sink are shared behind `Arc`.
#[derive(Clone)]
pub struct Casa {
    pub(crate) catalog: Arc<dyn CasaConnector>,
    pub(crate) estimate: Arc<dyn CasaConnector>,
    pub(crate) history: Arc<dyn CasaConnector>,
    pub(crate) sink: Arc<dyn ListingSink>,
    pub(crate) cfg: CasaConfig,
}

/// Builder for constructing a `Casa` orchestrator with custom configuration.
pub struct CasaBuilder {
    connectors: Vec<Arc<dyn CasaConnector>>,
    sink: Option<Arc<dyn ListingSink>>,
    cfg: CasaConfig,
}

impl Default for CasaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CasaBuilder {
    /// Create a new builder with default configuration.
    ///
    /// Defaults: three detail-fetch attempts with a 1-3s jittered wait, no
    /// per-call timeout, unbounded fan-out.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connectors: vec![],
            sink: None,
            cfg: CasaConfig::default(),
        }
    }

    /// Register a source connector.
    ///
    /// For each role (catalog, estimate, history) the first registered connector
    /// that serves it is used. One connector may serve several roles.
    #[must_use]
    pub fn with_connector(mut self, c: Arc<dyn CasaConnector>) -> Self {
        self.connectors.push(c);
        self
    }

    /// Set the persistence sink. A later call replaces an earlier one.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ListingSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: CasaConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Set the detail-fetch retry policy.
    #[must_use]
    pub const fn retry(mut self, retry: RetryConfig) -> Self {
        self.cfg.retry = retry;
        self
    }

    /// Bound every adapter and sink call. A call that exceeds it fails with
    /// `ProviderTimeout`, which the detail fetch treats as transient.
    #[must_use]
    pub const fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.provider_timeout = Some(timeout);
        self
    }

    /// Cap the number of pipelines running at once.
    #[must_use]
    pub const fn max_concurrency(mut self, n: usize) -> Self {
        self.cfg.max_concurrency = Some(n);
        self
    }

    fn pick(
        &self,
        role: &str,
        serves: impl Fn(&dyn CasaConnector) -> bool,
    ) -> Result<Arc<dyn CasaConnector>, CasaError> {
        self.connectors
            .iter()
            .find(|c| serves(c.as_ref()))
            .cloned()
            .ok_or_else(|| {
                CasaError::InvalidArg(format!(
                    "no registered connector serves the {role} role; add one via with_connector(...)"
                ))
            })
    }

    /// Build the `Casa` orchestrator.
    ///
    /// # Errors
    /// Returns `InvalidArg` if a source role has no connector, if no sink was
    /// set, or if `max_concurrency` is zero.
    pub fn build(self) -> Result<Casa, CasaError> {
        let catalog = self.pick("catalog", |c| c.as_catalog_provider().is_some())?;
        let estimate = self.pick("estimate", |c| c.as_estimate_provider().is_some())?;
        let history = self.pick("history", |c| c.as_history_provider().is_some())?;
        let Some(sink) = self.sink else {
            return Err(CasaError::InvalidArg(
                "no sink configured; set one via with_sink(...)".to_string(),
            ));
        };
        if self.cfg.max_concurrency == Some(0) {
            return Err(CasaError::InvalidArg(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(Casa {
            catalog,
            estimate,
            history,
            sink,
            cfg: self.cfg,
        })
    }
}

impl Casa {
    /// Start building a new `Casa` instance.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    ///
    /// let casa = casa::Casa::builder()
    ///     .with_connector(Arc::new(FundaConnector::new(parser)?))
    ///     .with_connector(Arc::new(KadasterConnector::new()?))
    ///     .with_connector(Arc::new(WozConnector::new()?))
    ///     .with_sink(Arc::new(PgSink::connect(&pg).await?))
    ///     .build()?;
    /// let summary = casa.run(&filters).await;
    /// ```
    #[must_use]
    pub fn builder() -> CasaBuilder {
        CasaBuilder::new()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &CasaConfig {
        &self.cfg
    }

    /// Wrap a provider future with the optional timeout and standardized error mapping.
    #[tracing::instrument(
        name = "casa::core::provider_call_with_timeout",
        level = "trace",
        skip(fut),
        fields(
            connector = connector_name,
            capability = capability,
            timeout_ms = timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
        ),
    )]
    pub(crate) async fn provider_call_with_timeout<T, Fut>(
        connector_name: &'static str,
        capability: &'static str,
        timeout: Option<Duration>,
        fut: Fut,
    ) -> Result<T, CasaError>
    where
        Fut: core::future::Future<Output = Result<T, CasaError>>,
    {
        match timeout {
            Some(t) => (tokio::time::timeout(t, fut).await)
                .unwrap_or_else(|_| Err(CasaError::provider_timeout(connector_name, capability))),
            None => fut.await,
        }
    }

    pub(crate) fn catalog_provider(&self) -> Result<&dyn CatalogProvider, CasaError> {
        self.catalog
            .as_catalog_provider()
            .ok_or_else(|| CasaError::unsupported("catalog"))
    }

    pub(crate) fn estimate_provider(&self) -> Result<&dyn EstimateProvider, CasaError> {
        self.estimate
            .as_estimate_provider()
            .ok_or_else(|| CasaError::unsupported("estimate"))
    }

    pub(crate) fn history_provider(&self) -> Result<&dyn HistoryProvider, CasaError> {
        self.history
            .as_history_provider()
            .ok_or_else(|| CasaError::unsupported("history"))
    }
}
