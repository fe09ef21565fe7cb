//! Invariants a canonical record must satisfy before it is handed to a sink.
//!
//! Checks run in field order and the first violation is reported.

use rust_decimal::Decimal;

use crate::CasaError;
use casa_types::{CanonicalRecord, ValuationEstimate, ValuationHistory};

/// Longest accepted listing URL.
pub const MAX_URL_LEN: usize = 1023;
/// Longest accepted name, postal code or city.
pub const MAX_TEXT_LEN: usize = 255;
/// Years must be strictly greater than this.
pub const YEAR_FLOOR: i32 = 1800;
/// Years must be strictly less than this.
pub const YEAR_CEILING: i32 = 2100;

fn text(field: &str, value: &str, max: usize) -> Result<(), CasaError> {
    if value.trim().is_empty() || value.chars().count() > max {
        return Err(CasaError::validation(field, format!("{value:?}")));
    }
    Ok(())
}

fn positive(field: &str, value: Decimal) -> Result<(), CasaError> {
    if value <= Decimal::ZERO {
        return Err(CasaError::validation(field, value));
    }
    Ok(())
}

fn nonzero(field: &str, value: u32) -> Result<(), CasaError> {
    if value == 0 {
        return Err(CasaError::validation(field, value));
    }
    Ok(())
}

fn year(field: &str, value: i32) -> Result<(), CasaError> {
    if value <= YEAR_FLOOR || value >= YEAR_CEILING {
        return Err(CasaError::validation(field, value));
    }
    Ok(())
}

fn within(field: &str, value: Decimal, bound: i64) -> Result<(), CasaError> {
    let bound = Decimal::from(bound);
    if value < -bound || value > bound {
        return Err(CasaError::validation(field, value));
    }
    Ok(())
}

fn estimate(e: &ValuationEstimate) -> Result<(), CasaError> {
    text("estimate.url", &e.url, MAX_URL_LEN)?;
    positive("estimate.value_min", e.value_min)?;
    positive("estimate.value_max", e.value_max)?;
    if e.value_min > e.value_max {
        return Err(CasaError::validation(
            "estimate.value_min",
            format!("{} > {}", e.value_min, e.value_max),
        ));
    }
    Ok(())
}

fn history(h: &ValuationHistory) -> Result<(), CasaError> {
    if let Some(url) = &h.url {
        text("history.url", url, MAX_URL_LEN)?;
    }
    for entry in &h.entries {
        year("history.year", entry.year)?;
        positive("history.value", entry.value)?;
    }
    Ok(())
}

/// Check every record invariant.
///
/// # Errors
/// Returns `CasaError::Validation` naming the first offending field and its value.
pub fn validate_record(record: &CanonicalRecord) -> Result<(), CasaError> {
    text("url", record.id.as_str(), MAX_URL_LEN)?;
    text("name", &record.address.street, MAX_TEXT_LEN)?;
    text("postal_code", &record.address.postal_code, MAX_TEXT_LEN)?;
    text("city", &record.address.city, MAX_TEXT_LEN)?;

    let d = &record.detail;
    positive("asking_price", d.asking_price)?;
    nonzero("area_to_live", d.area_to_live)?;
    positive("price_per_m2", d.price_per_m2)?;
    if let Some(plot) = d.area_of_plot {
        nonzero("area_of_plot", plot)?;
    }
    for (name, area) in &d.area_extras {
        nonzero(&format!("area_extras.{name}"), *area)?;
    }
    nonzero("volume", d.volume)?;
    nonzero("number_of_rooms", d.number_of_rooms)?;
    nonzero("number_of_floors", d.number_of_floors)?;
    year("year_built", d.year_built)?;

    within("latitude", record.latitude, 90)?;
    within("longitude", record.longitude, 180)?;

    if let Some(e) = &record.estimate {
        estimate(e)?;
    }
    history(&record.history)
}
