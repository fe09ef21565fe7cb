//! Settings kinds and their static registry.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CasaError;

/// Kind of externally managed settings rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum SettingsKind {
    /// Catalog search filters.
    ListingFilter,
}

/// Configuration keys accepted for each kind.
const REGISTRY: &[(&str, SettingsKind)] = &[
    ("listing_filter", SettingsKind::ListingFilter),
    ("search_filter", SettingsKind::ListingFilter),
];

impl SettingsKind {
    /// Resolve a configuration key to a kind.
    ///
    /// # Errors
    /// Returns `Config` for keys absent from the registry.
    pub fn from_key(key: &str) -> Result<Self, CasaError> {
        let k = key.trim().to_ascii_lowercase();
        REGISTRY
            .iter()
            .find(|(name, _)| *name == k)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| {
                CasaError::Config(format!(
                    "unknown settings kind '{key}'; expected one of: {}",
                    REGISTRY
                        .iter()
                        .map(|(n, _)| *n)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }

    /// Canonical configuration key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::ListingFilter => "listing_filter",
        }
    }
}

impl fmt::Display for SettingsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A public spreadsheet tab holding settings rows of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSource {
    /// Spreadsheet id.
    pub sheet_id: String,
    /// Tab id.
    pub gid: String,
    /// Kind of rows stored in the tab.
    pub kind: SettingsKind,
}
