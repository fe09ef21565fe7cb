use std::collections::BTreeMap;

use casa_core::{
    Availability, EnergyLabel, ListingFeatures, ListingId, ListingImage, RawListingDetail,
    SearchFilter,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub const L1: &str = "https://www.funda.nl/detail/koop/almere/huis-harderwijkoever-16/43512001/";
pub const L2: &str = "https://www.funda.nl/detail/koop/almere/huis-kruidenweg-8/43512002/";
pub const L3: &str =
    "https://www.funda.nl/detail/koop/utrecht/appartement-oudegracht-210/43512003/";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn images(url: &str, n: usize) -> Vec<ListingImage> {
    (1..=n)
        .map(|i| ListingImage {
            name: format!("Photo {i} / {n}"),
            url: format!("{url}media/{i}.jpg"),
        })
        .collect()
}

fn l1() -> RawListingDetail {
    RawListingDetail {
        url: L1.to_string(),
        asking_price: Decimal::from(350_000),
        availability: Availability::Available,
        offered_since: date(2024, 5, 28),
        year_built: 2021,
        area_to_live: 90,
        area_of_plot: Some(142),
        area_extras: BTreeMap::from([("storage".to_string(), 7)]),
        volume: 310,
        number_of_rooms: 4,
        number_of_floors: 2,
        // metadata reports the coarse tier
        energy_label: EnergyLabel::A3Plus,
        energy_label_metadata: Some(EnergyLabel::A),
        property_type: "house".to_string(),
        features: ListingFeatures {
            has_garden: true,
            has_solar_panels: true,
            is_energy_efficient: true,
            ..ListingFeatures::default()
        },
        name: "Harderwijkoever 16".to_string(),
        postal_code: "1324HA".to_string(),
        city: "Almere".to_string(),
        latitude: Decimal::new(5_238_112, 5),
        longitude: Decimal::new(522_904, 5),
        images: images(L1, 3),
    }
}

fn l2() -> RawListingDetail {
    RawListingDetail {
        url: L2.to_string(),
        asking_price: Decimal::from(425_000),
        availability: Availability::Negotiated,
        offered_since: date(2024, 5, 27),
        year_built: 1994,
        area_to_live: 118,
        area_of_plot: Some(160),
        area_extras: BTreeMap::new(),
        volume: 420,
        number_of_rooms: 5,
        number_of_floors: 3,
        // badge and metadata disagree without a known explanation
        energy_label: EnergyLabel::C,
        energy_label_metadata: Some(EnergyLabel::B),
        property_type: "house".to_string(),
        features: ListingFeatures {
            has_garden: true,
            has_parking_on_site: true,
            ..ListingFeatures::default()
        },
        name: "Kruidenweg 8".to_string(),
        postal_code: "1338CK".to_string(),
        city: "Almere".to_string(),
        latitude: Decimal::new(5_236_530, 5),
        longitude: Decimal::new(520_221, 5),
        images: images(L2, 2),
    }
}

fn l3() -> RawListingDetail {
    RawListingDetail {
        url: L3.to_string(),
        asking_price: Decimal::from(615_000),
        availability: Availability::Available,
        offered_since: date(2024, 5, 29),
        year_built: 1911,
        area_to_live: 96,
        area_of_plot: None,
        area_extras: BTreeMap::from([("balcony".to_string(), 6)]),
        volume: 300,
        number_of_rooms: 3,
        number_of_floors: 1,
        energy_label: EnergyLabel::D,
        energy_label_metadata: None,
        property_type: "apartment".to_string(),
        features: ListingFeatures {
            has_balcony: true,
            ..ListingFeatures::default()
        },
        name: "Oudegracht 210".to_string(),
        postal_code: "3511NR".to_string(),
        city: "Utrecht".to_string(),
        latitude: Decimal::new(5_208_921, 5),
        longitude: Decimal::new(512_004, 5),
        images: images(L3, 4),
    }
}

pub fn all() -> Vec<RawListingDetail> {
    vec![l1(), l2(), l3()]
}

pub fn by_id(id: &str) -> Option<RawListingDetail> {
    all().into_iter().find(|d| d.url == id)
}

pub fn search(filter: &SearchFilter) -> Vec<ListingId> {
    all()
        .into_iter()
        .filter(|d| filter.area().contains(&d.city.to_lowercase()))
        .filter(|d| d.asking_price >= filter.price_min() && d.asking_price <= filter.price_max())
        .filter(|d| filter.object_type().is_empty() || filter.object_type().contains(&d.property_type))
        .map(|d| ListingId::new(d.url))
        .collect()
}
