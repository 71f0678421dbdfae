use serde::Deserialize;

use crate::core::config::GeocodingConfig;
use crate::core::error::{AppError, Result};
use crate::features::geocoding::dtos::GeocodedPlace;
use crate::shared::geo::{fallback_label, LngLat};

/// Forward lookups return up to five candidates; reverse lookups ask for
/// the single best match.
const FORWARD_LIMIT: u8 = 5;
const REVERSE_LIMIT: u8 = 1;

/// Provider payload; unknown feature fields are dropped on decode.
#[derive(Debug, Deserialize)]
struct ProviderResponse {
    #[serde(default)]
    features: Vec<GeocodedPlace>,
}

/// Client for the external geocoding provider.
///
/// The provider authenticates with an access token carried as a query
/// parameter, which makes every request URL a secret. Log lines and error
/// messages are built from the query kind and status code only, and
/// transport errors are stripped of their URL before they surface.
pub struct GeocodingService {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GeocodingService {
    pub fn new(config: &GeocodingConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("CinemapCore/1.0 (film-map)")
                .build()
                .expect("Failed to build HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        }
    }

    fn place_url(&self, query: &str, limit: u8) -> String {
        format!(
            "{}/geocoding/v5/mapbox.places/{}.json?access_token={}&limit={}",
            self.base_url,
            urlencoding::encode(query),
            self.access_token,
            limit
        )
    }

    /// Free-text place search. Provider failures surface to the caller.
    pub async fn forward_geocode(&self, query: &str) -> Result<Vec<GeocodedPlace>> {
        if query.trim().is_empty() {
            return Err(AppError::BadRequest("Search query is required".to_string()));
        }

        tracing::debug!("Forward geocoding: {}", query);
        let response = self
            .execute_request(&self.place_url(query, FORWARD_LIMIT))
            .await?;
        Ok(response.features)
    }

    /// Resolves coordinates to a place name. Total: out-of-bounds
    /// coordinates short-circuit before the network call, and any provider
    /// failure degrades to a synthesized "Location at lat, lng" label.
    pub async fn reverse_geocode(&self, coordinates: LngLat) -> GeocodedPlace {
        if !coordinates.is_valid() {
            return Self::fallback_place(coordinates);
        }

        let query = format!("{},{}", coordinates.lat, coordinates.lng);
        tracing::debug!("Reverse geocoding: {}", query);

        match self
            .execute_request(&self.place_url(&query, REVERSE_LIMIT))
            .await
        {
            Ok(response) => response
                .features
                .into_iter()
                .next()
                .unwrap_or_else(|| Self::fallback_place(coordinates)),
            Err(e) => {
                tracing::warn!("Reverse geocoding failed, using fallback label: {}", e);
                Self::fallback_place(coordinates)
            }
        }
    }

    fn fallback_place(coordinates: LngLat) -> GeocodedPlace {
        GeocodedPlace {
            place_name: fallback_label(coordinates.lng, coordinates.lat),
            center: [coordinates.lng, coordinates.lat],
        }
    }

    async fn execute_request(&self, url: &str) -> Result<ProviderResponse> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let e = e.without_url();
            tracing::error!("Geocoding request failed: {:?}", e);
            AppError::ExternalServiceError(format!("Geocoding request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Geocoding provider returned status: {}", status);
            return Err(AppError::ExternalServiceError(format!(
                "Geocoding provider returned status {}",
                status
            )));
        }

        response.json::<ProviderResponse>().await.map_err(|e| {
            let e = e.without_url();
            tracing::error!("Failed to parse geocoding response: {:?}", e);
            AppError::ExternalServiceError("Failed to parse geocoding response".to_string())
        })
    }
}
