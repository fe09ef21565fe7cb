//! Casa-specific data transfer objects and configuration primitives.
#![warn(missing_docs)]

mod config;
mod error;
mod filter;
mod listing;
mod reports;
mod settings;

pub use config::{CasaConfig, PostgresConfig, RetryConfig, SslMode};
pub use error::CasaError;
pub use filter::{ListingId, SearchFilter};
pub use listing::{
    Address, Availability, CanonicalRecord, EnergyLabel, HistoryEntry, ListingDetail,
    ListingFeatures, ListingImage, RawListingDetail, ValuationEstimate, ValuationHistory,
};
pub use reports::{EnrichmentOutcome, RunSummary, SkipReason, UpsertAck};
pub use settings::{SettingsKind, SheetSource};

pub use chrono::{DateTime, NaiveDate, Utc};
pub use rust_decimal::Decimal;
