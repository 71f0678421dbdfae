use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::geocoding::handlers::{self, GeocodingState};
use crate::features::geocoding::services::GeocodingService;

/// Create routes for the geocoding proxy
///
/// Public; the provider token stays server-side
pub fn routes(geocoding_service: Arc<GeocodingService>) -> Router {
    let state = GeocodingState { geocoding_service };

    Router::new()
        .route("/api/geocode", get(handlers::geocode))
        .with_state(state)
}
