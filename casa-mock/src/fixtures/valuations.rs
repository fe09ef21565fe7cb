use casa_core::{Address, HistoryEntry, ValuationEstimate, ValuationHistory};
use chrono::NaiveDate;
use rust_decimal::Decimal;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn entry(year: i32, value: i64) -> HistoryEntry {
    HistoryEntry {
        year,
        reference_date: date(year, 1, 1),
        value: Decimal::from(value),
    }
}

/// Estimates keyed by postal code. Harderwijkoever 16 is new construction and has none.
pub fn estimate_for(address: &Address) -> Option<ValuationEstimate> {
    match address.postal_code.as_str() {
        "1338CK" => Some(ValuationEstimate {
            url: "https://kadasterdata.nl/almere/kruidenweg/8".to_string(),
            value_min: Decimal::from(401_000),
            value_max: Decimal::from(447_000),
            calculated_on: date(2024, 4, 30),
        }),
        "3511NR" => Some(ValuationEstimate {
            url: "https://kadasterdata.nl/utrecht/oudegracht/210".to_string(),
            value_min: Decimal::from(571_000),
            value_max: Decimal::from(640_000),
            calculated_on: date(2024, 5, 2),
        }),
        _ => None,
    }
}

pub fn history_for(address: &Address) -> Option<ValuationHistory> {
    let (id, entries) = match address.postal_code.as_str() {
        "1324HA" => ("0034200000112201", vec![entry(2023, 340_000)]),
        "1338CK" => (
            "0034200000045810",
            vec![entry(2022, 371_000), entry(2023, 398_000)],
        ),
        _ => return None,
    };
    Some(ValuationHistory {
        url: Some(format!(
            "https://www.wozwaardeloket.nl/wozwaardeloket-api/v1/wozwaarde/nummeraanduiding/{id}"
        )),
        entries,
    })
}
