use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::films::{Film, FilmStatus, FILMS_TABLE};
use crate::features::moderation::models::PendingSubmission;
use crate::features::profiles::ProfileService;
use crate::modules::store::{Filter, RecordStore};
use crate::shared::constants::DEFAULT_REJECTION_REASON;

const PENDING_COLUMNS: &str = "*,profiles(username,full_name)";

/// Review-queue transitions. Pending films move to approved or rejected;
/// both of those are terminal here.
///
/// The store's policy layer enforces who may write; this service pre-checks
/// the acting profile's moderator flag so a non-moderator fails with a clear
/// message instead of a policy error.
#[derive(Clone)]
pub struct ModerationService {
    store: Arc<dyn RecordStore>,
    profiles: ProfileService,
}

impl ModerationService {
    pub fn new(store: Arc<dyn RecordStore>, profiles: ProfileService) -> Self {
        Self { store, profiles }
    }

    async fn ensure_moderator(&self, acting_user: Uuid) -> Result<()> {
        if self.profiles.is_moderator(acting_user).await? {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Moderator access is required".to_string(),
            ))
        }
    }

    async fn load(&self, film_id: Uuid) -> Result<Film> {
        let rows = self
            .store
            .select(
                FILMS_TABLE,
                "*",
                &[Filter::eq("id", &film_id.to_string())],
                None,
            )
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Film not found".to_string()))?;
        Film::from_row(row)
    }

    /// Approves a pending film and clears any stale rejection reason.
    /// Approving twice is a no-op; a rejected film stays rejected.
    pub async fn approve(&self, acting_user: Uuid, film_id: Uuid) -> Result<Film> {
        self.ensure_moderator(acting_user).await?;
        let film = self.load(film_id).await?;

        match film.status {
            FilmStatus::Approved => Ok(film),
            FilmStatus::Rejected => Err(AppError::Conflict(
                "A rejected film cannot be approved".to_string(),
            )),
            FilmStatus::Pending => {
                let row = self
                    .store
                    .update(
                        FILMS_TABLE,
                        &[Filter::eq("id", &film_id.to_string())],
                        json!({ "status": "approved", "rejection_reason": null }),
                    )
                    .await?;
                Film::from_row(row)
            }
        }
    }

    /// Rejects a pending film. `reason: None` models the moderator
    /// cancelling the prompt: nothing is checked or written and `Ok(None)`
    /// comes back. A blank reason is stored as the default text. Rejecting
    /// twice is a no-op; an approved film stays approved.
    pub async fn reject(
        &self,
        acting_user: Uuid,
        film_id: Uuid,
        reason: Option<String>,
    ) -> Result<Option<Film>> {
        let Some(reason) = reason else {
            return Ok(None);
        };

        self.ensure_moderator(acting_user).await?;
        let film = self.load(film_id).await?;

        match film.status {
            FilmStatus::Rejected => Ok(Some(film)),
            FilmStatus::Approved => Err(AppError::Conflict(
                "An approved film cannot be rejected".to_string(),
            )),
            FilmStatus::Pending => {
                let reason = if reason.trim().is_empty() {
                    DEFAULT_REJECTION_REASON.to_string()
                } else {
                    reason
                };
                let row = self
                    .store
                    .update(
                        FILMS_TABLE,
                        &[Filter::eq("id", &film_id.to_string())],
                        json!({ "status": "rejected", "rejection_reason": reason }),
                    )
                    .await?;
                Ok(Some(Film::from_row(row)?))
            }
        }
    }

    /// The review queue, oldest submissions first.
    pub async fn list_pending(&self, acting_user: Uuid) -> Result<Vec<PendingSubmission>> {
        self.ensure_moderator(acting_user).await?;

        let rows = self
            .store
            .select(
                FILMS_TABLE,
                PENDING_COLUMNS,
                &[Filter::eq("status", FilmStatus::Pending.as_str())],
                Some("created_at.asc"),
            )
            .await?;

        rows.into_iter()
            .map(|row| {
                let submitter = row
                    .get("profiles")
                    .and_then(|v| serde_json::from_value(v.clone()).ok());
                let film = Film::from_row(row)?;
                Ok(PendingSubmission { film, submitter })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::shared::test_helpers::{film_row, profile_row, InMemoryStore};

    const PROFILES_TABLE: &str = "profiles";

    fn service(store: Arc<InMemoryStore>) -> ModerationService {
        ModerationService::new(store.clone(), ProfileService::new(store))
    }

    fn seeded(
        film_status: &str,
        acting_is_moderator: bool,
    ) -> (Arc<InMemoryStore>, Uuid, Uuid) {
        let owner = Uuid::new_v4();
        let acting = Uuid::new_v4();
        let store = Arc::new(
            InMemoryStore::new()
                .with_table(FILMS_TABLE, vec![film_row(owner, film_status)])
                .with_table(
                    PROFILES_TABLE,
                    vec![profile_row(acting, acting_is_moderator)],
                ),
        );
        let film_id = store.rows(FILMS_TABLE)[0]["id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        (store, acting, film_id)
    }

    #[tokio::test]
    async fn test_approve_moves_pending_film_and_clears_reason() {
        let (store, moderator, film_id) = seeded("pending", true);
        let service = service(store.clone());

        let film = service.approve(moderator, film_id).await.unwrap();
        assert_eq!(film.status, FilmStatus::Approved);
        assert!(film.rejection_reason.is_none());

        let rows = store.rows(FILMS_TABLE);
        assert_eq!(rows[0]["status"], json!("approved"));
        assert_eq!(rows[0]["rejection_reason"], json!(null));
    }

    #[tokio::test]
    async fn test_approve_requires_moderator_flag() {
        let (store, acting, film_id) = seeded("pending", false);
        let service = service(store.clone());

        let err = service.approve(acting, film_id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(store.rows(FILMS_TABLE)[0]["status"], json!("pending"));
    }

    #[tokio::test]
    async fn test_approve_twice_is_a_no_op() {
        let (store, moderator, film_id) = seeded("approved", true);
        let service = service(store.clone());

        let film = service.approve(moderator, film_id).await.unwrap();
        assert_eq!(film.status, FilmStatus::Approved);
    }

    #[tokio::test]
    async fn test_approve_rejected_film_is_a_conflict() {
        let (store, moderator, film_id) = seeded("rejected", true);
        let service = service(store.clone());

        let err = service.approve(moderator, film_id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_reject_stores_reason() {
        let (store, moderator, film_id) = seeded("pending", true);
        let service = service(store.clone());

        let film = service
            .reject(moderator, film_id, Some("Duplicate entry".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(film.status, FilmStatus::Rejected);
        assert_eq!(film.rejection_reason.as_deref(), Some("Duplicate entry"));
    }

    #[tokio::test]
    async fn test_reject_blank_reason_falls_back_to_default() {
        let (store, moderator, film_id) = seeded("pending", true);
        let service = service(store.clone());

        let film = service
            .reject(moderator, film_id, Some("   ".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            film.rejection_reason.as_deref(),
            Some(DEFAULT_REJECTION_REASON)
        );
    }

    #[tokio::test]
    async fn test_reject_cancelled_changes_nothing() {
        let (store, moderator, film_id) = seeded("pending", true);
        let service = service(store.clone());

        let outcome = service.reject(moderator, film_id, None).await.unwrap();
        assert!(outcome.is_none());
        assert_eq!(store.rows(FILMS_TABLE)[0]["status"], json!("pending"));
    }

    #[tokio::test]
    async fn test_reject_approved_film_is_a_conflict() {
        let (store, moderator, film_id) = seeded("approved", true);
        let service = service(store.clone());

        let err = service
            .reject(moderator, film_id, Some("Too late".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_pending_oldest_first_with_submitters() {
        let owner = Uuid::new_v4();
        let moderator = Uuid::new_v4();

        let mut newer = film_row(owner, "pending");
        newer["created_at"] = json!("2024-06-02T10:00:00+00:00");
        newer["profiles"] = json!({ "username": "ada", "full_name": "Ada Lovelace" });
        let mut older = film_row(owner, "pending");
        older["created_at"] = json!("2024-06-01T10:00:00+00:00");

        let store = Arc::new(
            InMemoryStore::new()
                .with_table(FILMS_TABLE, vec![newer, older])
                .with_table(PROFILES_TABLE, vec![profile_row(moderator, true)]),
        );
        let service = service(store);

        let queue = service.list_pending(moderator).await.unwrap();
        assert_eq!(queue.len(), 2);
        assert!(queue[0].film.created_at < queue[1].film.created_at);
        assert!(queue[0].submitter.is_none());
        assert_eq!(
            queue[1].submitter.as_ref().unwrap().username.as_deref(),
            Some("ada")
        );
    }

    #[tokio::test]
    async fn test_list_pending_requires_moderator_flag() {
        let (store, acting, _) = seeded("pending", false);
        let service = service(store);

        let err = service.list_pending(acting).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
