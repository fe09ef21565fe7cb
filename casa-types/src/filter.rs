//! Search filters and listing identity.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CasaError;

/// Stable identifier of a catalog entry: the listing's source URL.
///
/// Used as the dedup key across filters and as the natural key for persistence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    /// Wrap a listing URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Borrow the underlying URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListingId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ListingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One row of search criteria for the catalog.
///
/// Region names and category tags are normalized to lowercase on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchFilter {
    area: BTreeSet<String>,
    price_min: Decimal,
    price_max: Decimal,
    days_old: u32,
    object_type: BTreeSet<String>,
}

impl SearchFilter {
    /// Build a validated filter.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `area` is empty, a price is not strictly positive,
    /// or `price_min > price_max`.
    pub fn new<A, O>(
        area: A,
        price_min: Decimal,
        price_max: Decimal,
        days_old: u32,
        object_type: O,
    ) -> Result<Self, CasaError>
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        O: IntoIterator,
        O::Item: AsRef<str>,
    {
        let area = normalize(area);
        let object_type = normalize(object_type);
        if area.is_empty() {
            return Err(CasaError::InvalidArg("filter area must not be empty".into()));
        }
        if price_min <= Decimal::ZERO || price_max <= Decimal::ZERO {
            return Err(CasaError::InvalidArg(format!(
                "filter prices must be positive: {price_min}-{price_max}"
            )));
        }
        if price_min > price_max {
            return Err(CasaError::InvalidArg(format!(
                "price_min {price_min} exceeds price_max {price_max}"
            )));
        }
        Ok(Self {
            area,
            price_min,
            price_max,
            days_old,
            object_type,
        })
    }

    /// Build a filter from a spreadsheet row (header → cell).
    ///
    /// `area` and `object_type` are comma-separated lists; `days_old` defaults to 3
    /// when the column is missing or blank.
    ///
    /// # Errors
    /// Returns `InvalidArg` for missing or unparseable columns and for any
    /// violation checked by [`SearchFilter::new`].
    pub fn from_row(row: &HashMap<String, String>) -> Result<Self, CasaError> {
        let cell = |name: &str| -> Result<&str, CasaError> {
            row.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| CasaError::InvalidArg(format!("missing column {name}")))
        };
        let price = |name: &str| -> Result<Decimal, CasaError> {
            let raw = cell(name)?;
            raw.parse::<Decimal>()
                .map_err(|e| CasaError::InvalidArg(format!("{name}={raw}: {e}")))
        };
        let days_old = match row.get("days_old").map(|v| v.trim()) {
            None | Some("") => 3,
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|e| CasaError::InvalidArg(format!("days_old={raw}: {e}")))?,
        };
        let object_type = row.get("object_type").map(String::as_str).unwrap_or("");
        Self::new(
            cell("area")?.split(','),
            price("price_min")?,
            price("price_max")?,
            days_old,
            object_type.split(','),
        )
    }

    /// Region names to search in.
    #[must_use]
    pub const fn area(&self) -> &BTreeSet<String> {
        &self.area
    }

    /// Lower price bound (inclusive).
    #[must_use]
    pub const fn price_min(&self) -> Decimal {
        self.price_min
    }

    /// Upper price bound (inclusive).
    #[must_use]
    pub const fn price_max(&self) -> Decimal {
        self.price_max
    }

    /// Maximum publication age in days.
    #[must_use]
    pub const fn days_old(&self) -> u32 {
        self.days_old
    }

    /// Category tags (e.g. "house", "apartment").
    #[must_use]
    pub const fn object_type(&self) -> &BTreeSet<String> {
        &self.object_type
    }
}

fn normalize<I>(items: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
