use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinError, JoinSet};

use crate::Casa;
use crate::settings::SettingsStore;
use casa_core::{CasaError, EnrichmentOutcome, ListingId, RunSummary, SearchFilter};

/// Final state of one listing within a run.
enum Settled {
    Persisted,
    Skipped,
    Failed(CasaError),
}

/// Run bookkeeping: the listing each task settles and the summary so far.
#[derive(Default)]
struct Tally {
    pending: HashMap<task::Id, ListingId>,
    summary: RunSummary,
}

impl Tally {
    fn spawned(&mut self, task: task::Id, id: ListingId) {
        self.pending.insert(task, id);
    }

    fn joined(&mut self, joined: Result<(task::Id, Settled), JoinError>) {
        let (task, settled) = match joined {
            Ok(done) => done,
            // tasks are never aborted and panics are caught inside them
            Err(e) => {
                if let Some(id) = self.pending.get(&e.id()) {
                    tracing::error!(listing = %id, error = %e, "pipeline task did not complete");
                }
                let err = CasaError::Other(format!("pipeline task did not complete: {e}"));
                (e.id(), Settled::Failed(err))
            }
        };
        // registered right after spawn, before the first join
        let Some(id) = self.pending.remove(&task) else {
            return;
        };
        match settled {
            Settled::Persisted => self.summary.succeeded += 1,
            Settled::Skipped => self.summary.skipped += 1,
            Settled::Failed(e) => {
                self.summary.failed += 1;
                self.summary.failures.push((id, e));
            }
        }
    }

    fn finish(mut self) -> RunSummary {
        self.summary.failures.sort_by(|a, b| a.0.cmp(&b.0));
        self.summary
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Casa {
    /// Discover listings for `filters` and enrich and persist each one.
    ///
    /// One task per listing; a failed, skipped or panicking listing never cancels
    /// the others. Always returns once every task has settled.
    #[tracing::instrument(name = "casa::run", skip(self, filters), fields(filters = filters.len()))]
    pub async fn run(&self, filters: &[SearchFilter]) -> RunSummary {
        let worklist = self.discover(filters).await;
        self.run_listings(worklist).await
    }

    /// Load the listing filters from `store` and run them.
    ///
    /// # Errors
    /// Returns the store's error when the filters cannot be loaded; per-listing
    /// failures are reported in the summary instead.
    pub async fn run_from_settings(&self, store: &SettingsStore) -> Result<RunSummary, CasaError> {
        let filters = store.filters().await?;
        Ok(self.run(&filters).await)
    }

    /// Enrich and persist an explicit worklist, skipping discovery.
    pub async fn run_listings<I>(&self, ids: I) -> RunSummary
    where
        I: IntoIterator<Item = ListingId>,
    {
        let limiter = self.cfg.max_concurrency.map(|n| Arc::new(Semaphore::new(n)));
        let mut set = JoinSet::new();
        let mut tally = Tally::default();
        for id in ids {
            let casa = self.clone();
            let limiter = limiter.clone();
            let key = id.clone();
            let handle = set.spawn(async move {
                // closed only on drop, so a failed acquire just runs unthrottled
                let _permit = match limiter {
                    Some(sem) => sem.acquire_owned().await.ok(),
                    None => None,
                };
                match AssertUnwindSafe(casa.settle(&id)).catch_unwind().await {
                    Ok(s) => s,
                    Err(payload) => {
                        let msg = panic_message(&payload);
                        tracing::error!(listing = %id, panic = %msg, "pipeline panicked");
                        Settled::Failed(CasaError::Other(format!("pipeline panicked: {msg}")))
                    }
                }
            });
            tally.spawned(handle.id(), key);
        }

        while let Some(joined) = set.join_next_with_id().await {
            tally.joined(joined);
        }
        let summary = tally.finish();
        tracing::info!(
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            "run complete"
        );
        summary
    }

    /// Enrich one listing and hand a success to the sink.
    async fn settle(&self, id: &ListingId) -> Settled {
        let record = match self.enrich(id).await {
            EnrichmentOutcome::Success(record) => record,
            EnrichmentOutcome::Skipped(reason) => {
                tracing::info!(listing = %id, reason = %reason, "listing skipped");
                return Settled::Skipped;
            }
            EnrichmentOutcome::Failed(e) => {
                tracing::warn!(listing = %id, error = %e, "listing failed");
                return Settled::Failed(e);
            }
        };

        let sink_name = self.sink.name();
        let res = Self::provider_call_with_timeout(
            sink_name,
            "upsert",
            self.cfg.provider_timeout,
            self.sink.upsert(&record),
        )
        .await;
        match res {
            Ok(ack) => {
                tracing::debug!(listing = %id, ack = ?ack, "record persisted");
                Settled::Persisted
            }
            Err(e) => {
                let e = match e {
                    e @ CasaError::Persistence { .. } => e,
                    other => CasaError::persistence(sink_name, other.to_string()),
                };
                tracing::warn!(listing = %id, error = %e, "persisting record failed");
                Settled::Failed(e)
            }
        }
    }
}
