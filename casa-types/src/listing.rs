//! Listing, valuation and canonical record types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CasaError;
use crate::filter::ListingId;

/// Energy-efficiency label of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EnergyLabel {
    /// A+++++
    #[serde(rename = "A+++++")]
    A5Plus,
    /// A++++
    #[serde(rename = "A++++")]
    A4Plus,
    /// A+++
    #[serde(rename = "A+++")]
    A3Plus,
    /// A++
    #[serde(rename = "A++")]
    A2Plus,
    /// A+
    #[serde(rename = "A+")]
    APlus,
    /// A
    A,
    /// B
    B,
    /// C
    C,
    /// D
    D,
    /// E
    E,
    /// F
    F,
    /// G
    G,
    /// No label published.
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl EnergyLabel {
    /// All labels, best first.
    pub const ALL: [Self; 13] = [
        Self::A5Plus,
        Self::A4Plus,
        Self::A3Plus,
        Self::A2Plus,
        Self::APlus,
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::F,
        Self::G,
        Self::Unknown,
    ];

    /// Canonical textual form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A5Plus => "A+++++",
            Self::A4Plus => "A++++",
            Self::A3Plus => "A+++",
            Self::A2Plus => "A++",
            Self::APlus => "A+",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
            Self::G => "G",
            Self::Unknown => "unknown",
        }
    }

    /// True for the `A+` .. `A+++++` tiers.
    #[must_use]
    pub const fn is_a_plus_tier(self) -> bool {
        matches!(
            self,
            Self::APlus | Self::A2Plus | Self::A3Plus | Self::A4Plus | Self::A5Plus
        )
    }
}

impl fmt::Display for EnergyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnergyLabel {
    type Err = CasaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.is_empty() || t.eq_ignore_ascii_case("unknown") {
            return Ok(Self::Unknown);
        }
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(t))
            .ok_or_else(|| CasaError::Data(format!("unknown energy label: {t}")))
    }
}

/// Availability of a listing on the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Open for offers.
    #[default]
    Available,
    /// Under negotiation.
    Negotiated,
    /// Sold.
    Sold,
}

/// Feature flags advertised for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ListingFeatures {
    /// Roof terrace present.
    pub has_roof_terrace: bool,
    /// Garden present.
    pub has_garden: bool,
    /// Balcony present.
    pub has_balcony: bool,
    /// Solar panels installed.
    pub has_solar_panels: bool,
    /// Parking on own grounds.
    pub has_parking_on_site: bool,
    /// Parking on closed grounds.
    pub has_parking_on_closed_site: bool,
    /// Advertised as energy efficient.
    pub is_energy_efficient: bool,
}

/// A photo reference on the catalog page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingImage {
    /// Display name, e.g. "Photo 1 / 30".
    pub name: String,
    /// Image URL.
    pub url: String,
}

/// Typed output of the catalog detail fetch.
///
/// `energy_label` comes from the page badge; `energy_label_metadata` is the same
/// logical field as reported by the page's structured metadata block. The two may
/// disagree and are reconciled during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawListingDetail {
    /// Canonical URL after redirects.
    pub url: String,
    /// Asking price.
    pub asking_price: Decimal,
    /// Availability status.
    pub availability: Availability,
    /// Date first offered.
    pub offered_since: NaiveDate,
    /// Construction year.
    pub year_built: i32,
    /// Living area in m².
    pub area_to_live: u32,
    /// Plot area in m², absent for properties without a plot.
    pub area_of_plot: Option<u32>,
    /// Additional named areas (balcony, storage, ...) in m².
    pub area_extras: BTreeMap<String, u32>,
    /// Volume in m³.
    pub volume: u32,
    /// Number of rooms.
    pub number_of_rooms: u32,
    /// Number of floors.
    pub number_of_floors: u32,
    /// Energy label from the page badge.
    pub energy_label: EnergyLabel,
    /// Energy label from the structured metadata block, if present.
    pub energy_label_metadata: Option<EnergyLabel>,
    /// Property category, e.g. "house".
    pub property_type: String,
    /// Advertised features.
    pub features: ListingFeatures,
    /// Street and house number.
    pub name: String,
    /// Postal code.
    pub postal_code: String,
    /// City.
    pub city: String,
    /// Latitude.
    pub latitude: Decimal,
    /// Longitude.
    pub longitude: Decimal,
    /// Photo references.
    pub images: Vec<ListingImage>,
}

/// Postal address used to correlate secondary lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// Street and house number.
    pub street: String,
    /// Postal code.
    pub postal_code: String,
    /// City.
    pub city: String,
}

impl Address {
    /// Derive the address from a detail page; `None` when any component is blank.
    #[must_use]
    pub fn from_detail(detail: &RawListingDetail) -> Option<Self> {
        let street = detail.name.trim();
        let postal_code = detail.postal_code.trim();
        let city = detail.city.trim();
        if street.is_empty() || postal_code.is_empty() || city.is_empty() {
            return None;
        }
        Some(Self {
            street: street.to_string(),
            postal_code: postal_code.to_string(),
            city: city.to_string(),
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {} {}", self.street, self.postal_code, self.city)
    }
}

/// Market value estimate from the estimate source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationEstimate {
    /// Page the estimate was read from.
    pub url: String,
    /// Lower bound.
    pub value_min: Decimal,
    /// Upper bound.
    pub value_max: Decimal,
    /// Date the estimate was calculated.
    pub calculated_on: NaiveDate,
}

/// One assessment year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Assessment year.
    pub year: i32,
    /// Reference date of the assessment.
    pub reference_date: NaiveDate,
    /// Assessed value.
    pub value: Decimal,
}

/// Assessed-value history from the history source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValuationHistory {
    /// Page the history was read from; absent when no match was found.
    pub url: Option<String>,
    /// One entry per assessment year.
    pub entries: Vec<HistoryEntry>,
}

impl ValuationHistory {
    /// History for an address the source could not match.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of assessment years.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no assessment is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Primary-source portion of a canonical record, after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDetail {
    /// Asking price.
    pub asking_price: Decimal,
    /// Asking price divided by living area.
    pub price_per_m2: Decimal,
    /// Availability status.
    pub availability: Availability,
    /// Date first offered.
    pub offered_since: NaiveDate,
    /// Construction year.
    pub year_built: i32,
    /// Living area in m².
    pub area_to_live: u32,
    /// Plot area in m².
    pub area_of_plot: Option<u32>,
    /// Additional named areas in m².
    pub area_extras: BTreeMap<String, u32>,
    /// Volume in m³.
    pub volume: u32,
    /// Number of rooms.
    pub number_of_rooms: u32,
    /// Number of floors.
    pub number_of_floors: u32,
    /// Reconciled energy label.
    pub energy_label: EnergyLabel,
    /// Property category.
    pub property_type: String,
    /// Advertised features.
    pub features: ListingFeatures,
}

/// The merged, validated entity handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Natural key.
    pub id: ListingId,
    /// Postal address.
    pub address: Address,
    /// Latitude.
    pub latitude: Decimal,
    /// Longitude.
    pub longitude: Decimal,
    /// Primary-source detail.
    pub detail: ListingDetail,
    /// Photo references.
    pub images: Vec<ListingImage>,
    /// Market value estimate, absent for properties the source does not know.
    pub estimate: Option<ValuationEstimate>,
    /// Assessed-value history.
    pub history: ValuationHistory,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl CanonicalRecord {
    /// Compare everything except the timestamps.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.id == other.id
            && self.address == other.address
            && self.latitude == other.latitude
            && self.longitude == other.longitude
            && self.detail == other.detail
            && self.images == other.images
            && self.estimate == other.estimate
            && self.history == other.history
    }
}
