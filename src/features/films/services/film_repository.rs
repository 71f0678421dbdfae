use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::Session;
use crate::features::films::models::{
    validate_year, Film, FilmDetail, FilmDraft, FilmPatch, FilmStatus,
};
use crate::features::profiles::ProfileService;
use crate::modules::storage::StorageClient;
use crate::modules::store::{Filter, RecordStore};
use crate::shared::constants::MAX_IMAGE_SIZE_BYTES;

pub const FILMS_TABLE: &str = "films";

const APPROVED_FILMS_FN: &str = "get_approved_films";
const FILM_COLUMNS: &str =
    "id,title,director,location,coordinates,year,description,image_url,status,rejection_reason,user_id,created_at";

/// Data access for film records plus their image assets.
///
/// The repository validates shape (year range, coordinate bounds, image
/// type and size) but does not enforce who may do what; the ownership and
/// status rules live in the flows that need them ([`Self::edit_film`],
/// [`Self::delete_film`]) and in the store's own policy layer.
#[derive(Clone)]
pub struct FilmRepository {
    store: Arc<dyn RecordStore>,
    storage: Arc<StorageClient>,
    profiles: ProfileService,
}

impl FilmRepository {
    pub fn new(
        store: Arc<dyn RecordStore>,
        storage: Arc<StorageClient>,
        profiles: ProfileService,
    ) -> Self {
        Self {
            store,
            storage,
            profiles,
        }
    }

    /// All approved films with renderable coordinates resolved.
    ///
    /// Prefers the store function that returns the point geometry already
    /// split into `lng`/`lat` scalars; falls back to a plain filtered
    /// select with client-side normalization when the function is missing.
    pub async fn list_approved(&self) -> Result<Vec<Film>> {
        match self.store.rpc(APPROVED_FILMS_FN, json!({})).await {
            Ok(Value::Array(rows)) => rows.into_iter().map(Film::from_row).collect(),
            Ok(other) => {
                tracing::warn!("Unexpected {} payload: {}", APPROVED_FILMS_FN, other);
                self.select_approved().await
            }
            Err(e) => {
                tracing::warn!(
                    "{} unavailable, using filtered select: {}",
                    APPROVED_FILMS_FN,
                    e
                );
                self.select_approved().await
            }
        }
    }

    async fn select_approved(&self) -> Result<Vec<Film>> {
        let rows = self
            .store
            .select(
                FILMS_TABLE,
                FILM_COLUMNS,
                &[Filter::eq("status", FilmStatus::Approved.as_str())],
                None,
            )
            .await?;
        rows.into_iter().map(Film::from_row).collect()
    }

    /// Every film the user has submitted, newest first, all statuses.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Film>> {
        let rows = self
            .store
            .select(
                FILMS_TABLE,
                FILM_COLUMNS,
                &[Filter::eq("user_id", &user_id.to_string())],
                Some("created_at.desc"),
            )
            .await?;
        rows.into_iter().map(Film::from_row).collect()
    }

    pub async fn get(&self, id: Uuid) -> Result<Film> {
        let rows = self
            .store
            .select(
                FILMS_TABLE,
                FILM_COLUMNS,
                &[Filter::eq("id", &id.to_string())],
                None,
            )
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Film not found".to_string()))?;
        Film::from_row(row)
    }

    /// Detail view: the film plus its submitter's public profile. A profile
    /// that cannot be read leaves the detail film-only rather than failing.
    pub async fn detail(&self, id: Uuid) -> Result<FilmDetail> {
        let film = self.get(id).await?;
        let submitter = match self.profiles.get(film.user_id).await {
            Ok(profile) => Some(profile),
            Err(AppError::NotFound(_)) => None,
            Err(e) => {
                tracing::warn!("Could not load submitter for film {}: {}", id, e);
                None
            }
        };
        Ok(FilmDetail { film, submitter })
    }

    /// Inserts a new pending film. The draft's coordinates and year are
    /// validated here so nothing unrenderable reaches the store.
    pub async fn create(&self, draft: FilmDraft) -> Result<Film> {
        if !draft.coordinates.is_renderable() {
            return Err(AppError::Validation(
                "Coordinates are outside the valid range".to_string(),
            ));
        }
        validate_year(draft.year)?;

        let row = self.store.insert(FILMS_TABLE, draft.into_row()).await?;
        Film::from_row(row)
    }

    /// Applies a field patch without any precondition checks. Flows that
    /// carry business rules go through [`Self::edit_film`] instead.
    pub async fn update(&self, id: Uuid, patch: FilmPatch) -> Result<Film> {
        let row = self
            .store
            .update(
                FILMS_TABLE,
                &[Filter::eq("id", &id.to_string())],
                patch.into_row(),
            )
            .await?;
        Film::from_row(row)
    }

    /// Owner edit: only the submitting user may change a film, and only
    /// while it is still pending review.
    pub async fn edit_film(&self, session: &Session, id: Uuid, patch: FilmPatch) -> Result<Film> {
        let film = self.get(id).await?;

        if film.user_id != session.user_id {
            return Err(AppError::Forbidden(
                "You do not have permission to edit this film".to_string(),
            ));
        }
        if film.status != FilmStatus::Pending {
            return Err(AppError::Conflict(
                "Only pending films can be edited".to_string(),
            ));
        }
        if let Some(coordinates) = patch.coordinates {
            if !coordinates.is_renderable() {
                return Err(AppError::Validation(
                    "Coordinates are outside the valid range".to_string(),
                ));
            }
        }
        if let Some(year) = patch.year {
            validate_year(year)?;
        }

        self.update(id, patch).await
    }

    /// Deletes the record and, best effort, its stored image.
    pub async fn remove(&self, id: Uuid) -> Result<()> {
        let film = self.get(id).await?;
        self.delete_attached_image(&film).await;
        self.store
            .delete(FILMS_TABLE, &[Filter::eq("id", &id.to_string())])
            .await
    }

    /// Full deletion flow: the caller must hold a live session and either
    /// own the film or be a moderator. A failing image deletion is logged
    /// and does not block removing the record.
    pub async fn delete_film(&self, session: &Session, id: Uuid) -> Result<()> {
        if session.is_expired() {
            return Err(AppError::Auth(
                "No active session. Please sign in again.".to_string(),
            ));
        }

        let film = self.get(id).await?;

        if film.user_id != session.user_id {
            let acting_is_moderator = match self.profiles.is_moderator(session.user_id).await {
                Ok(flag) => flag,
                Err(e) => {
                    tracing::warn!("Moderator check failed for {}: {}", session.user_id, e);
                    false
                }
            };
            if !acting_is_moderator {
                return Err(AppError::Forbidden(
                    "You do not have permission to delete this film".to_string(),
                ));
            }
        }

        self.delete_attached_image(&film).await;
        self.store
            .delete(FILMS_TABLE, &[Filter::eq("id", &id.to_string())])
            .await
    }

    async fn delete_attached_image(&self, film: &Film) {
        let Some(url) = film.image_url.as_deref() else {
            return;
        };
        let Some(key) = self.storage.extract_key_from_url(url) else {
            tracing::warn!("Could not derive a storage key for film {}", film.id);
            return;
        };
        if let Err(e) = self.storage.delete(&key).await {
            tracing::warn!("Failed to delete image for film {}: {}", film.id, e);
        }
    }

    /// Validates and uploads a film still, returning its public URL.
    pub async fn upload_image(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        if !content_type.starts_with("image/") {
            return Err(AppError::Validation(
                "Please select an image file (jpg, png, etc.)".to_string(),
            ));
        }
        if bytes.len() > MAX_IMAGE_SIZE_BYTES {
            return Err(AppError::Validation(
                "File size exceeds 5MB. Please choose a smaller image.".to_string(),
            ));
        }

        let key = StorageClient::object_key(filename);
        self.storage.upload(&key, bytes, content_type).await?;
        Ok(self.storage.get_public_url(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Utc};

    use crate::core::config::StorageConfig;
    use crate::shared::geo::LngLat;
    use crate::shared::test_helpers::{create_test_session, film_row, profile_row, InMemoryStore};

    fn test_storage() -> Arc<StorageClient> {
        let config = StorageConfig {
            endpoint: "http://127.0.0.1:9000".to_string(),
            public_endpoint: "http://cdn.test".to_string(),
            access_key: "test".to_string(),
            secret_key: "test".to_string(),
            bucket: "film-images".to_string(),
            region: "us-east-1".to_string(),
        };
        Arc::new(StorageClient::new(config).unwrap())
    }

    fn repository(store: Arc<InMemoryStore>) -> FilmRepository {
        FilmRepository::new(store.clone(), test_storage(), ProfileService::new(store))
    }

    fn draft(user_id: Uuid, coordinates: LngLat) -> FilmDraft {
        FilmDraft {
            title: "Blue Is the Warmest Colour".to_string(),
            director: Some("Abdellatif Kechiche".to_string()),
            location: "Lille, France".to_string(),
            year: 2013,
            description: Some("Adapted from the graphic novel".to_string()),
            coordinates,
            image_url: None,
            user_id,
        }
    }

    #[tokio::test]
    async fn test_create_then_list_for_user_round_trips_coordinates() {
        let store = Arc::new(InMemoryStore::new());
        let repo = repository(store.clone());
        let user_id = Uuid::new_v4();

        let created = repo
            .create(draft(user_id, LngLat::new(-2.93, 48.20)))
            .await
            .unwrap();
        assert_eq!(created.status, FilmStatus::Pending);
        assert_eq!(created.coordinates, LngLat::new(-2.93, 48.20));

        let films = repo.list_for_user(user_id).await.unwrap();
        assert_eq!(films.len(), 1);
        assert_eq!(films[0].id, created.id);
        assert_eq!(films[0].coordinates, LngLat::new(-2.93, 48.20));

        // The stored column really is well-known text, not an object.
        let rows = store.rows(FILMS_TABLE);
        assert_eq!(rows[0]["coordinates"], serde_json::json!("POINT(-2.93 48.2)"));
    }

    #[tokio::test]
    async fn test_create_rejects_origin_coordinates() {
        let repo = repository(Arc::new(InMemoryStore::new()));

        let err = repo
            .create(draft(Uuid::new_v4(), LngLat::ORIGIN))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_implausible_year() {
        let store = Arc::new(InMemoryStore::new());
        let repo = repository(store.clone());

        let mut early = draft(Uuid::new_v4(), LngLat::new(2.35, 48.85));
        early.year = 1850;
        assert!(matches!(
            repo.create(early).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let mut future = draft(Uuid::new_v4(), LngLat::new(2.35, 48.85));
        future.year = Utc::now().year() + 1;
        assert!(matches!(
            repo.create(future).await.unwrap_err(),
            AppError::Validation(_)
        ));

        assert!(store.rows(FILMS_TABLE).is_empty());
    }

    #[tokio::test]
    async fn test_list_approved_uses_store_function_scalars() {
        let user_id = Uuid::new_v4();
        let store = Arc::new(InMemoryStore::new().with_rpc(
            APPROVED_FILMS_FN,
            serde_json::json!([{
                "id": Uuid::new_v4().to_string(),
                "title": "Carol",
                "location": "New York",
                "lng": -73.99,
                "lat": 40.73,
                "year": 2015,
                "status": "approved",
                "user_id": user_id.to_string(),
                "created_at": "2024-03-01T09:00:00Z"
            }]),
        ));
        let repo = repository(store);

        let films = repo.list_approved().await.unwrap();
        assert_eq!(films.len(), 1);
        assert_eq!(films[0].coordinates, LngLat::new(-73.99, 40.73));
    }

    #[tokio::test]
    async fn test_list_approved_falls_back_to_filtered_select() {
        let user_id = Uuid::new_v4();
        let store = Arc::new(InMemoryStore::new().with_table(
            FILMS_TABLE,
            vec![
                film_row(user_id, "approved"),
                film_row(user_id, "pending"),
                film_row(user_id, "rejected"),
            ],
        ));
        let repo = repository(store);

        let films = repo.list_approved().await.unwrap();
        assert_eq!(films.len(), 1);
        assert_eq!(films[0].status, FilmStatus::Approved);
        assert_eq!(films[0].coordinates, LngLat::new(2.3522, 48.8566));
    }

    #[tokio::test]
    async fn test_get_missing_film_is_not_found() {
        let repo = repository(Arc::new(InMemoryStore::new()));

        let err = repo.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_detail_attaches_submitter_profile() {
        let owner = Uuid::new_v4();
        let store = Arc::new(
            InMemoryStore::new()
                .with_table(FILMS_TABLE, vec![film_row(owner, "approved")])
                .with_table("profiles", vec![profile_row(owner, false)]),
        );
        let repo = repository(store.clone());
        let film_id: Uuid = store.rows(FILMS_TABLE)[0]["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();

        let detail = repo.detail(film_id).await.unwrap();
        assert_eq!(detail.film.id, film_id);
        assert_eq!(
            detail.submitter.unwrap().username.as_deref(),
            Some("test-user")
        );
    }

    #[tokio::test]
    async fn test_detail_without_profile_is_film_only() {
        let owner = Uuid::new_v4();
        let store = Arc::new(
            InMemoryStore::new().with_table(FILMS_TABLE, vec![film_row(owner, "approved")]),
        );
        let repo = repository(store.clone());
        let film_id: Uuid = store.rows(FILMS_TABLE)[0]["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();

        let detail = repo.detail(film_id).await.unwrap();
        assert!(detail.submitter.is_none());
    }

    #[tokio::test]
    async fn test_edit_film_requires_ownership() {
        let owner = Uuid::new_v4();
        let store = Arc::new(
            InMemoryStore::new().with_table(FILMS_TABLE, vec![film_row(owner, "pending")]),
        );
        let repo = repository(store.clone());
        let film_id: Uuid = store.rows(FILMS_TABLE)[0]["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();

        let stranger = create_test_session(Uuid::new_v4());
        let err = repo
            .edit_film(&stranger, film_id, FilmPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_edit_film_only_while_pending() {
        let owner = Uuid::new_v4();
        let store = Arc::new(
            InMemoryStore::new().with_table(FILMS_TABLE, vec![film_row(owner, "approved")]),
        );
        let repo = repository(store.clone());
        let film_id: Uuid = store.rows(FILMS_TABLE)[0]["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();

        let err = repo
            .edit_film(&create_test_session(owner), film_id, FilmPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_edit_film_applies_patch_for_owner() {
        let owner = Uuid::new_v4();
        let store = Arc::new(
            InMemoryStore::new().with_table(FILMS_TABLE, vec![film_row(owner, "pending")]),
        );
        let repo = repository(store.clone());
        let film_id: Uuid = store.rows(FILMS_TABLE)[0]["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();

        let patch = FilmPatch {
            title: Some("Retitled".to_string()),
            coordinates: Some(LngLat::new(-0.13, 51.51)),
            ..Default::default()
        };
        let updated = repo
            .edit_film(&create_test_session(owner), film_id, patch)
            .await
            .unwrap();

        assert_eq!(updated.title, "Retitled");
        assert_eq!(updated.coordinates, LngLat::new(-0.13, 51.51));
        // Untouched fields survive the patch.
        assert_eq!(updated.year, 1995);
    }

    #[tokio::test]
    async fn test_delete_film_by_owner_removes_record() {
        let owner = Uuid::new_v4();
        let store = Arc::new(
            InMemoryStore::new().with_table(FILMS_TABLE, vec![film_row(owner, "pending")]),
        );
        let repo = repository(store.clone());
        let film_id: Uuid = store.rows(FILMS_TABLE)[0]["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();

        repo.delete_film(&create_test_session(owner), film_id)
            .await
            .unwrap();
        assert!(store.rows(FILMS_TABLE).is_empty());
    }

    #[tokio::test]
    async fn test_delete_film_denied_for_non_owner() {
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let store = Arc::new(
            InMemoryStore::new()
                .with_table(FILMS_TABLE, vec![film_row(owner, "approved")])
                .with_table("profiles", vec![profile_row(stranger, false)]),
        );
        let repo = repository(store.clone());
        let film_id: Uuid = store.rows(FILMS_TABLE)[0]["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();

        let err = repo
            .delete_film(&create_test_session(stranger), film_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(store.rows(FILMS_TABLE).len(), 1);
    }

    #[tokio::test]
    async fn test_delete_film_allowed_for_moderator() {
        let owner = Uuid::new_v4();
        let moderator = Uuid::new_v4();
        let store = Arc::new(
            InMemoryStore::new()
                .with_table(FILMS_TABLE, vec![film_row(owner, "approved")])
                .with_table("profiles", vec![profile_row(moderator, true)]),
        );
        let repo = repository(store.clone());
        let film_id: Uuid = store.rows(FILMS_TABLE)[0]["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();

        repo.delete_film(&create_test_session(moderator), film_id)
            .await
            .unwrap();
        assert!(store.rows(FILMS_TABLE).is_empty());
    }

    #[tokio::test]
    async fn test_delete_film_survives_unresolvable_image_url() {
        let owner = Uuid::new_v4();
        let mut row = film_row(owner, "approved");
        row["image_url"] = serde_json::json!("https://elsewhere.example/not-ours.png");
        let store = Arc::new(InMemoryStore::new().with_table(FILMS_TABLE, vec![row]));
        let repo = repository(store.clone());
        let film_id: Uuid = store.rows(FILMS_TABLE)[0]["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();

        repo.delete_film(&create_test_session(owner), film_id)
            .await
            .unwrap();
        assert!(store.rows(FILMS_TABLE).is_empty());
    }

    #[tokio::test]
    async fn test_delete_film_requires_live_session() {
        let owner = Uuid::new_v4();
        let store = Arc::new(
            InMemoryStore::new().with_table(FILMS_TABLE, vec![film_row(owner, "pending")]),
        );
        let repo = repository(store.clone());
        let film_id: Uuid = store.rows(FILMS_TABLE)[0]["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();

        let mut session = create_test_session(owner);
        session.expires_at = Utc::now() - chrono::Duration::minutes(5);

        let err = repo.delete_film(&session, film_id).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
        assert_eq!(store.rows(FILMS_TABLE).len(), 1);
    }

    #[tokio::test]
    async fn test_upload_image_rejects_non_image_content() {
        let repo = repository(Arc::new(InMemoryStore::new()));

        let err = repo
            .upload_image("notes.txt", "text/plain", b"hello".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_upload_image_rejects_oversized_file() {
        let repo = repository(Arc::new(InMemoryStore::new()));
        let oversized = vec![0u8; MAX_IMAGE_SIZE_BYTES + 1];

        let err = repo
            .upload_image("poster.jpg", "image/jpeg", oversized)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
