//! casa-core
//!
//! Contracts and pure logic shared across the casa ecosystem.
//!
//! - `connector`: the `CasaConnector` trait, source role traits and the sink trait.
//! - `reconcile`: resolution of fields reported twice by the catalog page.
//! - `assemble`: merging per-source parts into a `CanonicalRecord`.
//! - `validate`: record invariants checked before persistence.
//!
//! Nothing here performs I/O; adapters live in `casa-http` and `casa-postgres`,
//! orchestration lives in `casa`.
#![warn(missing_docs)]

/// Record assembly from per-source parts.
pub mod assemble;
/// Connector role traits and the primary `CasaConnector` interface.
pub mod connector;
pub mod reconcile;
pub mod validate;

pub use assemble::{Assembled, assemble, price_per_m2};
pub use connector::{
    CasaConnector, CatalogProvider, ConnectorKey, EstimateProvider, HistoryProvider, ListingSink,
    SettingsRow, SettingsSource,
};
pub use reconcile::{Mismatch, Reconciled, reconcile_energy_label};
pub use validate::validate_record;

pub use casa_types::*;
