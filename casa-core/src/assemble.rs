//! Assembly of a canonical record from per-source parts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use casa_types::{
    Address, CanonicalRecord, EnergyLabel, ListingDetail, ListingId, RawListingDetail,
    ValuationEstimate, ValuationHistory,
};

use crate::reconcile::{Mismatch, reconcile_energy_label};

/// Output of [`assemble`]: the record plus any reconciliation diagnostic.
#[derive(Debug, Clone)]
pub struct Assembled {
    /// Merged record (not yet validated).
    pub record: CanonicalRecord,
    /// Unexplained energy-label disagreement, if any.
    pub label_mismatch: Option<Mismatch<EnergyLabel>>,
}

/// Asking price per m² of living area, rounded to cents. Zero when the area is zero.
#[must_use]
pub fn price_per_m2(asking_price: Decimal, area_to_live: u32) -> Decimal {
    asking_price
        .checked_div(Decimal::from(area_to_live))
        .map_or(Decimal::ZERO, |v| v.round_dp(2))
}

/// Merge the primary detail with the optional estimate and the history.
///
/// Both timestamps are set to `now`; a sink that already holds the record keeps
/// its own `created_at`.
#[must_use]
pub fn assemble(
    id: ListingId,
    address: Address,
    detail: RawListingDetail,
    estimate: Option<ValuationEstimate>,
    history: ValuationHistory,
    now: DateTime<Utc>,
) -> Assembled {
    let label = reconcile_energy_label(detail.energy_label, detail.energy_label_metadata);
    let RawListingDetail {
        asking_price,
        availability,
        offered_since,
        year_built,
        area_to_live,
        area_of_plot,
        area_extras,
        volume,
        number_of_rooms,
        number_of_floors,
        property_type,
        features,
        latitude,
        longitude,
        images,
        ..
    } = detail;

    let record = CanonicalRecord {
        id,
        address,
        latitude,
        longitude,
        detail: ListingDetail {
            asking_price,
            price_per_m2: price_per_m2(asking_price, area_to_live),
            availability,
            offered_since,
            year_built,
            area_to_live,
            area_of_plot,
            area_extras,
            volume,
            number_of_rooms,
            number_of_floors,
            energy_label: label.value,
            property_type,
            features,
        },
        images,
        estimate,
        history,
        created_at: now,
        updated_at: now,
    };

    Assembled {
        record,
        label_mismatch: label.mismatch,
    }
}
