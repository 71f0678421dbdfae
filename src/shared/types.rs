use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON envelope for failure responses.
///
/// Successful handlers return their payload bare, in the shape the map
/// client consumes. Failures are wrapped so the client always finds a
/// presentable `message` and, for validation failures, detail lines
/// under `errors`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl ApiResponse {
    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> Self {
        Self {
            success: false,
            message,
            errors,
        }
    }
}
