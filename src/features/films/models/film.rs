use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::shared::constants::MIN_FILM_YEAR;
use crate::shared::geo::{normalize_coordinates, LngLat};

/// Moderation lifecycle of a film record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FilmStatus {
    Pending,
    Approved,
    Rejected,
}

impl FilmStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilmStatus::Pending => "pending",
            FilmStatus::Approved => "approved",
            FilmStatus::Rejected => "rejected",
        }
    }

    /// Approved and rejected are terminal; only pending films move.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FilmStatus::Approved | FilmStatus::Rejected)
    }
}

impl Default for FilmStatus {
    fn default() -> Self {
        FilmStatus::Pending
    }
}

/// A film record as the rest of the crate sees it. Store rows are decoded
/// through [`Film::from_row`] so the point geometry always arrives as a
/// single [`LngLat`] no matter which serialized form the store used.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Film {
    pub id: Uuid,
    pub title: String,
    pub director: Option<String>,
    pub location: String,
    pub year: i32,
    pub description: Option<String>,
    pub coordinates: LngLat,
    pub image_url: Option<String>,
    pub status: FilmStatus,
    pub rejection_reason: Option<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct FilmRow {
    id: Uuid,
    title: String,
    #[serde(default)]
    director: Option<String>,
    #[serde(default)]
    location: Option<String>,
    year: i32,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    coordinates: Value,
    #[serde(default)]
    lng: Option<f64>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    status: FilmStatus,
    #[serde(default)]
    rejection_reason: Option<String>,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

impl Film {
    /// Decodes a raw store row. Rows carry either a `coordinates` column in
    /// one of the serialized point forms, or pre-extracted `lng`/`lat`
    /// scalars when they come from the approved-films store function.
    pub fn from_row(row: Value) -> Result<Self> {
        let raw: FilmRow = serde_json::from_value(row).map_err(|e| {
            tracing::error!("Failed to decode film row: {}", e);
            AppError::Internal("Invalid film record".to_string())
        })?;

        let coordinates = match (raw.lng, raw.lat) {
            (Some(lng), Some(lat)) => LngLat::new(lng, lat),
            _ => normalize_coordinates(&raw.coordinates),
        };

        Ok(Film {
            id: raw.id,
            title: raw.title,
            director: raw.director,
            location: raw.location.unwrap_or_default(),
            year: raw.year,
            description: raw.description,
            coordinates,
            image_url: raw.image_url,
            status: raw.status,
            rejection_reason: raw.rejection_reason,
            user_id: raw.user_id,
            created_at: raw.created_at,
        })
    }
}

/// Input for a new film submission. Coordinates must already be confirmed
/// by the caller.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FilmDraft {
    pub title: String,
    pub director: Option<String>,
    pub location: String,
    pub year: i32,
    pub description: Option<String>,
    pub coordinates: LngLat,
    pub image_url: Option<String>,
    pub user_id: Uuid,
}

impl FilmDraft {
    /// Store representation; the point is re-serialized as well-known text
    /// and the record always enters the queue as pending.
    pub(crate) fn into_row(self) -> Value {
        let mut row = Map::new();
        row.insert("title".to_string(), json!(self.title));
        if let Some(director) = self.director {
            row.insert("director".to_string(), json!(director));
        }
        row.insert("location".to_string(), json!(self.location));
        row.insert("coordinates".to_string(), json!(self.coordinates.to_wkt()));
        row.insert("year".to_string(), json!(self.year));
        if let Some(description) = self.description {
            row.insert("description".to_string(), json!(description));
        }
        if let Some(image_url) = self.image_url {
            row.insert("image_url".to_string(), json!(image_url));
        }
        row.insert("status".to_string(), json!(FilmStatus::Pending.as_str()));
        row.insert("user_id".to_string(), json!(self.user_id.to_string()));
        Value::Object(row)
    }
}

/// Owner-editable fields. `None` fields are left untouched by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FilmPatch {
    pub title: Option<String>,
    pub director: Option<String>,
    pub location: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub coordinates: Option<LngLat>,
}

impl FilmPatch {
    pub(crate) fn into_row(self) -> Value {
        let mut row = Map::new();
        if let Some(title) = self.title {
            row.insert("title".to_string(), json!(title));
        }
        if let Some(director) = self.director {
            row.insert("director".to_string(), json!(director));
        }
        if let Some(location) = self.location {
            row.insert("location".to_string(), json!(location));
        }
        if let Some(year) = self.year {
            row.insert("year".to_string(), json!(year));
        }
        if let Some(description) = self.description {
            row.insert("description".to_string(), json!(description));
        }
        if let Some(coordinates) = self.coordinates {
            row.insert("coordinates".to_string(), json!(coordinates.to_wkt()));
        }
        Value::Object(row)
    }
}

/// Lenient year parse used by submission forms: unparseable input falls
/// back to the current year. Range plausibility is checked on insert.
pub fn normalize_year(raw: &str) -> i32 {
    raw.trim()
        .parse::<i32>()
        .unwrap_or_else(|_| Utc::now().year())
}

/// Plausibility window: cinema exists since 1895 and films are not dated in
/// the future.
pub fn validate_year(year: i32) -> Result<()> {
    let current = Utc::now().year();
    if year < MIN_FILM_YEAR || year > current {
        return Err(AppError::Validation(format!(
            "Year must be between {} and {}",
            MIN_FILM_YEAR, current
        )));
    }
    Ok(())
}
