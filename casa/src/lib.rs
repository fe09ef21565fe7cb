//! Casa enriches real-estate listings from a primary catalog with valuation data
//! from independent secondary sources, and persists one merged record per listing.
//!
//! Overview
//! - Discovery turns search filters into a deduplicated set of listing ids.
//! - Each listing runs its own pipeline: detail fetch with bounded, jittered retry;
//!   address derivation; concurrent estimate and history lookups; reconciliation,
//!   assembly and validation.
//! - The orchestrator fans pipelines out as independent tasks and forwards each
//!   success to the sink. One listing's failure (or panic) never cancels another.
//!
//! Key behaviors
//! - Only transient errors (and per-call timeouts) are retried, and only for the
//!   detail fetch. A removed listing is skipped, not failed.
//! - "No match" from a valuation source degrades the record (no estimate, empty
//!   history); a transport failure from one fails the listing.
//! - Every run completes and reports succeeded/skipped/failed counts.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use casa::{Casa, EnvConfig, SettingsStore};
//!
//! let env = EnvConfig::from_env()?;
//! let store = SettingsStore::new(Arc::new(GoogleSheetsSource::new()?), env.sheets.clone());
//! let casa = Casa::builder()
//!     .with_connector(Arc::new(FundaConnector::new(parser)?))
//!     .with_connector(Arc::new(KadasterConnector::new()?))
//!     .with_connector(Arc::new(WozConnector::new()?))
//!     .with_sink(Arc::new(sink))
//!     .config(env.casa)
//!     .build()?;
//! let summary = casa.run_from_settings(&store).await?;
//! println!("{} ok, {} skipped, {} failed", summary.succeeded, summary.skipped, summary.failed);
//! ```
#![warn(missing_docs)]

mod core;
mod discovery;
mod pipeline;
mod retry;
mod run;
/// Environment configuration and the settings store.
pub mod settings;

pub use crate::core::{Casa, CasaBuilder};
pub use settings::{EnvConfig, SettingsStore};

pub use casa_core::{
    CanonicalRecord, CasaConfig, CasaError, EnrichmentOutcome, ListingId, RetryConfig, RunSummary,
    SearchFilter, SkipReason, UpsertAck,
};
