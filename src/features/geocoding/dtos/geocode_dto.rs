use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for the geocode proxy
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct GeocodeQuery {
    /// Free-text place search, or a "lat,lng" pair for a reverse lookup
    #[param(example = "Paris")]
    pub query: Option<String>,
}

/// One candidate place, in the provider's wire shape
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeocodedPlace {
    pub place_name: String,
    /// Longitude, then latitude
    pub center: [f64; 2],
}

/// Proxy response, shaped like the provider payload so map clients that
/// already speak it keep working
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeocodeResponse {
    pub features: Vec<GeocodedPlace>,
}
