use utoipa::{Modify, OpenApi};

use crate::features::geocoding::dtos as geocoding_dtos;
use crate::features::geocoding::handlers::geocode_handler;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Geocoding
        geocode_handler::geocode,
    ),
    components(
        schemas(
            geocoding_dtos::GeocodedPlace,
            geocoding_dtos::GeocodeResponse,
        )
    ),
    tags(
        (name = "geocoding", description = "Forward and reverse geocoding proxy"),
    ),
    info(
        title = "Cinemap API",
        version = "0.1.0",
        description = "API documentation for the Cinemap geocoding proxy",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
