use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;

use crate::core::error::{AppError, Result};
use crate::features::geocoding::dtos::{GeocodeQuery, GeocodeResponse};
use crate::features::geocoding::services::GeocodingService;
use crate::shared::geo::LngLat;

/// State for geocoding handlers
#[derive(Clone)]
pub struct GeocodingState {
    pub geocoding_service: Arc<GeocodingService>,
}

/// A comma-separated pair of parseable numbers means a reverse lookup.
/// The pair arrives latitude first.
fn parse_coordinate_pair(query: &str) -> Option<LngLat> {
    let (lat, lng) = query.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    Some(LngLat::new(lng, lat))
}

/// Proxy a geocoding request to the provider without exposing the token
#[utoipa::path(
    get,
    path = "/api/geocode",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Candidate places", body = GeocodeResponse),
        (status = 400, description = "Missing query parameter"),
        (status = 502, description = "Geocoding provider failed")
    ),
    tag = "geocoding"
)]
pub async fn geocode(
    State(state): State<GeocodingState>,
    Query(params): Query<GeocodeQuery>,
) -> Result<Json<GeocodeResponse>> {
    let query = params.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(AppError::BadRequest(
            "Query parameter is required".to_string(),
        ));
    }

    let features = match parse_coordinate_pair(query) {
        Some(coordinates) => vec![state.geocoding_service.reverse_geocode(coordinates).await],
        None => state.geocoding_service.forward_geocode(query).await?,
    };

    Ok(Json(GeocodeResponse { features }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_pair_is_latitude_first() {
        let pair = parse_coordinate_pair("48.85,2.35").unwrap();
        assert_eq!(pair.lat, 48.85);
        assert_eq!(pair.lng, 2.35);
    }

    #[test]
    fn test_coordinate_pair_tolerates_spaces() {
        let pair = parse_coordinate_pair(" -33.87 , 151.21 ").unwrap();
        assert_eq!(pair.lat, -33.87);
        assert_eq!(pair.lng, 151.21);
    }

    #[test]
    fn test_place_names_are_not_coordinate_pairs() {
        assert!(parse_coordinate_pair("Paris").is_none());
        assert!(parse_coordinate_pair("Paris, France").is_none());
        assert!(parse_coordinate_pair("12,Main Street").is_none());
    }
}
