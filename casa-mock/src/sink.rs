use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use casa_core::connector::ListingSink;
use casa_core::{CanonicalRecord, CasaError, ListingId, UpsertAck};

#[derive(Default)]
struct SinkState {
    records: BTreeMap<ListingId, CanonicalRecord>,
    fail_ids: HashSet<ListingId>,
}

/// In-memory idempotent sink keyed by listing id.
///
/// Clones share the same store, so a test can keep one handle for inspection
/// and hand another to the orchestrator.
#[derive(Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<SinkState>>,
    upserts: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every future write for this listing with a persistence error.
    pub async fn fail_on(&self, id: ListingId) {
        let mut guard = self.state.lock().await;
        guard.fail_ids.insert(id);
    }

    /// Stored record for one listing.
    pub async fn get(&self, id: &ListingId) -> Option<CanonicalRecord> {
        let guard = self.state.lock().await;
        guard.records.get(id).cloned()
    }

    /// Snapshot of all stored records, ordered by id.
    pub async fn records(&self) -> Vec<CanonicalRecord> {
        let guard = self.state.lock().await;
        guard.records.values().cloned().collect()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    /// True when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.records.is_empty()
    }

    /// Number of `upsert` calls, including rejected and unchanged ones.
    #[must_use]
    pub fn upsert_calls(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    /// Number of upserts that changed the store.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListingSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn upsert(&self, record: &CanonicalRecord) -> Result<UpsertAck, CasaError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.state.lock().await;
        if guard.fail_ids.contains(&record.id) {
            return Err(CasaError::persistence(
                self.name(),
                format!("forced failure for {}", record.id),
            ));
        }
        let existing = guard
            .records
            .get(&record.id)
            .map(|e| (e.same_content(record), e.created_at));
        let ack = match existing {
            Some((true, _)) => return Ok(UpsertAck::Unchanged),
            Some((false, created_at)) => {
                let mut next = record.clone();
                next.created_at = created_at;
                guard.records.insert(record.id.clone(), next);
                UpsertAck::Updated
            }
            None => {
                guard.records.insert(record.id.clone(), record.clone());
                UpsertAck::Inserted
            }
        };
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(ack)
    }
}
