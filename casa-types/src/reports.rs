//! Outcome envelopes produced by the orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CasaError;
use crate::filter::ListingId;
use crate::listing::CanonicalRecord;

/// Why a listing was skipped rather than enriched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The catalog no longer serves the listing.
    ListingUnavailable,
    /// The detail page lacks a usable postal address.
    AddressUnresolvable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ListingUnavailable => "listing no longer available",
            Self::AddressUnresolvable => "address unresolvable",
        })
    }
}

/// Result of enriching one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// A validated record ready for persistence.
    Success(Box<CanonicalRecord>),
    /// Expected absence; nothing to persist.
    Skipped(SkipReason),
    /// Validation or unrecoverable fetch error.
    Failed(CasaError),
}

impl EnrichmentOutcome {
    /// Borrow the record of a successful outcome.
    #[must_use]
    pub fn record(&self) -> Option<&CanonicalRecord> {
        match self {
            Self::Success(r) => Some(r),
            _ => None,
        }
    }
}

/// Acknowledgement returned by a persistence sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertAck {
    /// No record with this key existed.
    Inserted,
    /// A record with this key existed with different content.
    Updated,
    /// An identical record already existed; nothing was written.
    Unchanged,
}

/// Counts for one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Listings enriched and acknowledged by the sink.
    pub succeeded: usize,
    /// Listings skipped (removed, no address).
    pub skipped: usize,
    /// Listings that failed to fetch, validate or persist.
    pub failed: usize,
    /// Error per failed listing.
    pub failures: Vec<(ListingId, CasaError)>,
}

impl RunSummary {
    /// Total listings processed.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }
}
