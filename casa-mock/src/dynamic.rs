use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use casa_core::connector::{CasaConnector, CatalogProvider, EstimateProvider, HistoryProvider};
use casa_core::{
    Address, CasaError, ListingId, RawListingDetail, SearchFilter, ValuationEstimate,
    ValuationHistory,
};

/// Instruction for how a method should behave for a given input.
#[derive(Clone, Debug)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(CasaError),
    /// Hang indefinitely (simulate a stalled upstream).
    Hang,
    /// Panic inside the call (simulate a bug in an adapter).
    Panic,
}

/// One recorded call against the dynamic mock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockCall {
    /// "search", "detail", "estimate" or "history".
    pub capability: &'static str,
    /// Rendered input (listing id, address, or filter areas).
    pub key: String,
    /// Tokio clock at call time (virtual under paused time).
    pub at: Instant,
}

#[derive(Default)]
struct InternalState {
    search_rules: HashMap<SearchFilter, MockBehavior<Vec<ListingId>>>,
    // consumed front to back; the last step repeats
    detail_scripts: HashMap<ListingId, VecDeque<MockBehavior<RawListingDetail>>>,
    estimate_rules: HashMap<Address, MockBehavior<Option<ValuationEstimate>>>,
    history_rules: HashMap<Address, MockBehavior<Option<ValuationHistory>>>,
    calls: Vec<MockCall>,
}

impl InternalState {
    fn record(&mut self, capability: &'static str, key: String) {
        self.calls.push(MockCall {
            capability,
            key,
            at: Instant::now(),
        });
    }

    fn next_detail(&mut self, id: &ListingId) -> Option<MockBehavior<RawListingDetail>> {
        let script = self.detail_scripts.get_mut(id)?;
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockController {
    /// Set the behavior for `search` calls with exactly this filter.
    pub async fn set_search_behavior(
        &self,
        filter: SearchFilter,
        behavior: MockBehavior<Vec<ListingId>>,
    ) {
        let mut guard = self.state.lock().await;
        guard.search_rules.insert(filter, behavior);
    }

    /// Set a single behavior for every `fetch_detail` call on this listing.
    pub async fn set_detail_behavior(
        &self,
        id: ListingId,
        behavior: MockBehavior<RawListingDetail>,
    ) {
        self.script_detail(id, vec![behavior]).await;
    }

    /// Script successive `fetch_detail` calls on this listing.
    ///
    /// Each call consumes one step; once a single step remains it is repeated.
    pub async fn script_detail(&self, id: ListingId, steps: Vec<MockBehavior<RawListingDetail>>) {
        let mut guard = self.state.lock().await;
        guard.detail_scripts.insert(id, steps.into());
    }

    /// Set the behavior for `lookup_estimate` calls on this address.
    pub async fn set_estimate_behavior(
        &self,
        address: Address,
        behavior: MockBehavior<Option<ValuationEstimate>>,
    ) {
        let mut guard = self.state.lock().await;
        guard.estimate_rules.insert(address, behavior);
    }

    /// Set the behavior for `lookup_history` calls on this address.
    pub async fn set_history_behavior(
        &self,
        address: Address,
        behavior: MockBehavior<Option<ValuationHistory>>,
    ) {
        let mut guard = self.state.lock().await;
        guard.history_rules.insert(address, behavior);
    }

    /// Return a copy of the call log.
    pub async fn calls(&self) -> Vec<MockCall> {
        let guard = self.state.lock().await;
        guard.calls.clone()
    }

    /// Call times of `fetch_detail` for one listing, in order.
    pub async fn detail_attempts(&self, id: &ListingId) -> Vec<Instant> {
        let guard = self.state.lock().await;
        guard
            .calls
            .iter()
            .filter(|c| c.capability == "detail" && c.key == id.as_str())
            .map(|c| c.at)
            .collect()
    }

    /// Clear all configured behaviors and the call log.
    pub async fn clear_all_behaviors(&self) {
        let mut guard = self.state.lock().await;
        guard.search_rules.clear();
        guard.detail_scripts.clear();
        guard.estimate_rules.clear();
        guard.history_rules.clear();
        guard.calls.clear();
    }
}

/// A connector that defers all behavior to an external controller.
///
/// Unconfigured inputs behave like an empty upstream: search finds nothing,
/// detail reports the listing as removed, and both lookups find no match.
pub struct DynamicMockConnector {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockConnector {
    /// Create a new dynamic mock connector and its controller.
    #[must_use]
    pub fn new_with_controller(
        name: &'static str,
    ) -> (Arc<dyn CasaConnector>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = DynamicMockController {
            state: Arc::clone(&state),
        };
        let me = Arc::new(Self { name, state });
        (me as Arc<dyn CasaConnector>, controller)
    }
}

async fn play<T>(behavior: Option<MockBehavior<T>>, default: T) -> Result<T, CasaError> {
    match behavior {
        Some(MockBehavior::Return(v)) => Ok(v),
        Some(MockBehavior::Fail(e)) => Err(e),
        Some(MockBehavior::Hang) => {
            std::future::pending::<()>().await;
            unreachable!()
        }
        Some(MockBehavior::Panic) => panic!("scripted panic"),
        None => Ok(default),
    }
}

#[async_trait]
impl CasaConnector for DynamicMockConnector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "DynamicMock"
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
impl CatalogProvider for DynamicMockConnector {
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<ListingId>, CasaError> {
        // Acquire behavior snapshot without holding the lock across await points
        let behavior = {
            let mut guard = self.state.lock().await;
            let areas: Vec<&str> = filter.area().iter().map(String::as_str).collect();
            guard.record("search", areas.join(","));
            guard.search_rules.get(filter).cloned()
        };
        play(behavior, Vec::new()).await
    }

    async fn fetch_detail(&self, id: &ListingId) -> Result<RawListingDetail, CasaError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.record("detail", id.to_string());
            guard.next_detail(id)
        };
        if behavior.is_none() {
            return Err(CasaError::not_found(format!("listing {id}")));
        }
        play(behavior, RawListingDetail::default()).await
    }
}

#[async_trait]
impl EstimateProvider for DynamicMockConnector {
    async fn lookup_estimate(
        &self,
        address: &Address,
    ) -> Result<Option<ValuationEstimate>, CasaError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.record("estimate", address.to_string());
            guard.estimate_rules.get(address).cloned()
        };
        play(behavior, None).await
    }
}

#[async_trait]
impl HistoryProvider for DynamicMockConnector {
    async fn lookup_history(
        &self,
        address: &Address,
    ) -> Result<Option<ValuationHistory>, CasaError> {
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.record("history", address.to_string());
            guard.history_rules.get(address).cloned()
        };
        play(behavior, None).await
    }
}
