use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::profiles::models::{Profile, ProfilePatch};
use crate::modules::store::{Filter, RecordStore};

const PROFILES_TABLE: &str = "profiles";

/// Profile access over the record store.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn RecordStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<Profile> {
        let rows = self
            .store
            .select(
                PROFILES_TABLE,
                "*",
                &[Filter::eq("id", &user_id.to_string())],
                None,
            )
            .await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        serde_json::from_value(row).map_err(|e| {
            tracing::error!("Failed to decode profile {}: {}", user_id, e);
            AppError::Store(format!("Failed to decode profile: {}", e))
        })
    }

    pub async fn update(&self, user_id: Uuid, patch: ProfilePatch) -> Result<Profile> {
        let patch_value = serde_json::to_value(&patch)
            .map_err(|e| AppError::Internal(format!("Failed to encode profile patch: {}", e)))?;

        let row = self
            .store
            .update(
                PROFILES_TABLE,
                &[Filter::eq("id", &user_id.to_string())],
                patch_value,
            )
            .await?;

        serde_json::from_value(row).map_err(|e| {
            tracing::error!("Failed to decode updated profile {}: {}", user_id, e);
            AppError::Store(format!("Failed to decode profile: {}", e))
        })
    }

    /// Moderator capability check. A missing profile is simply not a
    /// moderator, never an error.
    pub async fn is_moderator(&self, user_id: Uuid) -> Result<bool> {
        let rows = self
            .store
            .select(
                PROFILES_TABLE,
                "is_admin",
                &[Filter::eq("id", &user_id.to_string())],
                None,
            )
            .await?;

        Ok(rows
            .first()
            .and_then(|row| row.get("is_admin"))
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false))
    }
}
