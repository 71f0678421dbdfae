use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

lazy_static! {
    /// Well-known-text point, e.g. "POINT(-2.93 48.20)".
    /// Captures longitude then latitude, matching the stored column format.
    pub static ref WKT_POINT_REGEX: Regex = Regex::new(r"POINT\(([^ ]+) ([^ ]+)\)").unwrap();
}

/// Canonical coordinate pair. Longitude first, matching the map widget's
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const ORIGIN: LngLat = LngLat { lng: 0.0, lat: 0.0 };

    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Within valid geographic bounds and finite.
    pub fn is_valid(&self) -> bool {
        self.lng.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lng)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// The (0,0) sentinel produced by normalization for unrecognized input.
    pub fn is_origin(&self) -> bool {
        self.lng == 0.0 && self.lat == 0.0
    }

    /// Valid and not the unset sentinel; only these are rendered on the map.
    pub fn is_renderable(&self) -> bool {
        self.is_valid() && !self.is_origin()
    }

    /// Serialized form used when writing to the record store.
    pub fn to_wkt(&self) -> String {
        format!("POINT({} {})", self.lng, self.lat)
    }
}

/// Fallback place label used when reverse geocoding is unavailable or the
/// coordinates are out of range. Latitude first, the order users expect.
pub fn fallback_label(lng: f64, lat: f64) -> String {
    format!("Location at {:.4}, {:.4}", lat, lng)
}

/// Normalize a store-delivered coordinate value into a canonical pair.
///
/// Total function over the accepted serialized forms:
/// 1. A `{"lng": .., "lat": ..}` object passes through.
/// 2. A WKT string `POINT(lng lat)` is parsed by pattern match.
/// 3. A GeoJSON-like `{"coordinates": [lng, lat, ..]}` is indexed.
/// 4. Anything else yields the `(0,0)` sentinel, which callers must treat
///    as unset, never as a real location.
pub fn normalize_coordinates(value: &Value) -> LngLat {
    if let Some(obj) = value.as_object() {
        if let (Some(lng), Some(lat)) = (
            obj.get("lng").and_then(Value::as_f64),
            obj.get("lat").and_then(Value::as_f64),
        ) {
            return LngLat::new(lng, lat);
        }
    }

    if let Some(text) = value.as_str() {
        if let Some(caps) = WKT_POINT_REGEX.captures(text) {
            if let (Ok(lng), Ok(lat)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>()) {
                return LngLat::new(lng, lat);
            }
        }
    }

    if let Some(coords) = value.get("coordinates").and_then(Value::as_array) {
        if let (Some(lng), Some(lat)) = (
            coords.first().and_then(Value::as_f64),
            coords.get(1).and_then(Value::as_f64),
        ) {
            return LngLat::new(lng, lat);
        }
    }

    LngLat::ORIGIN
}
