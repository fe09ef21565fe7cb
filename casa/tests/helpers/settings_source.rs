use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use casa_core::{CasaError, SettingsRow, SettingsSource, SheetSource};

/// In-memory settings tables keyed by `(sheet_id, gid)`, counting fetches.
#[derive(Default)]
pub struct StaticSheets {
    tables: HashMap<(String, String), Vec<SettingsRow>>,
    fetches: Arc<AtomicUsize>,
}

impl StaticSheets {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table(mut self, sheet_id: &str, gid: &str, rows: &[&[(&str, &str)]]) -> Self {
        let rows = rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect()
            })
            .collect();
        self.tables
            .insert((sheet_id.to_string(), gid.to_string()), rows);
        self
    }

    /// Shared fetch counter; clone before handing the source to a store.
    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }
}

#[async_trait]
impl SettingsSource for StaticSheets {
    async fn fetch_rows(&self, source: &SheetSource) -> Result<Vec<SettingsRow>, CasaError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.tables
            .get(&(source.sheet_id.clone(), source.gid.clone()))
            .cloned()
            .ok_or_else(|| CasaError::not_found(format!("sheet {}#{}", source.sheet_id, source.gid)))
    }
}

#[allow(dead_code)]
pub fn fetches(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
