use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::config::IdentityConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::events::{AuthEvents, AuthState};
use crate::features::auth::model::Session;

/// Source of the current authenticated session.
///
/// `None` means signed out; an expired stored session is reported as `None`,
/// never returned to callers.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_session(&self) -> Result<Option<Session>>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    user: IdentityUser,
}

#[derive(Debug, Deserialize)]
struct IdentityUser {
    id: Uuid,
    email: Option<String>,
}

/// HTTP client for the identity provider's session API.
pub struct IdentityClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    session: RwLock<Option<Session>>,
    events: AuthEvents,
}

impl IdentityClient {
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("CinemapCore/1.0 (film-map)")
                .build()
                .expect("Failed to build HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            session: RwLock::new(None),
            events: AuthEvents::new(),
        }
    }

    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    /// Exchange credentials for a session and broadcast the sign-in.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({"email": email, "password": password}))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Identity provider request failed: {}", e);
                AppError::ExternalServiceError(format!("Identity provider unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!("Sign-in rejected: HTTP {}", status);
            return Err(AppError::Auth(format!("Sign-in failed: HTTP {}", status)));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse token response: {}", e);
            AppError::ExternalServiceError(format!("Failed to parse token response: {}", e))
        })?;

        let session = Session {
            user_id: token.user.id,
            email: token.user.email,
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        };

        *self.session.write().await = Some(session.clone());
        self.events.emit(AuthState::SignedIn {
            user_id: session.user_id,
        });
        tracing::info!("Signed in as {}", session.user_id);

        Ok(session)
    }

    /// Revoke the session with the provider (best effort) and broadcast the
    /// sign-out.
    pub async fn sign_out(&self) {
        let token = {
            let mut guard = self.session.write().await;
            guard.take().map(|s| s.access_token)
        };

        if let Some(token) = token {
            let url = format!("{}/auth/v1/logout", self.base_url);
            let result = self
                .client
                .post(&url)
                .header("apikey", &self.api_key)
                .bearer_auth(&token)
                .send()
                .await;
            if let Err(e) = result {
                tracing::warn!("Session revocation failed, clearing locally: {}", e);
            }
        }

        self.events.emit(AuthState::SignedOut);
        tracing::info!("Signed out");
    }
}

#[async_trait]
impl SessionProvider for IdentityClient {
    async fn current_session(&self) -> Result<Option<Session>> {
        // Expiry check and cleanup share one write guard, so a session
        // installed by a concurrent sign_in is never the one cleared.
        let mut guard = self.session.write().await;
        match guard.as_ref() {
            Some(session) if session.is_expired() => {
                *guard = None;
                self.events.emit(AuthState::SignedOut);
                tracing::info!("Stored session expired, signed out");
                Ok(None)
            }
            Some(session) => Ok(Some(session.clone())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: String) -> IdentityClient {
        IdentityClient::new(IdentityConfig {
            base_url,
            api_key: "anon-key".to_string(),
        })
    }

    #[tokio::test]
    async fn test_sign_in_stores_session_and_emits_event() {
        let user_id = Uuid::new_v4();
        let router = Router::new().route(
            "/auth/v1/token",
            post(move || async move {
                Json(json!({
                    "access_token": "jwt-token",
                    "expires_in": 3600,
                    "user": {"id": user_id, "email": "reel@example.com"}
                }))
            }),
        );
        let base = spawn_stub(router).await;

        let client = client_for(base);
        let mut rx = client.events().subscribe();

        let session = client.sign_in("reel@example.com", "hunter2").await.unwrap();
        assert_eq!(session.user_id, user_id);
        assert!(!session.is_expired());

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), AuthState::SignedIn { user_id });

        let current = client.current_session().await.unwrap();
        assert_eq!(current.map(|s| s.user_id), Some(user_id));
    }

    #[tokio::test]
    async fn test_rejected_sign_in_is_auth_error() {
        let router = Router::new().route(
            "/auth/v1/token",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(json!({"error": "invalid_grant"})),
                )
            }),
        );
        let base = spawn_stub(router).await;

        let client = client_for(base);
        let err = client.sign_in("reel@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
        assert_eq!(client.current_session().await.unwrap().map(|s| s.user_id), None);
    }

    #[tokio::test]
    async fn test_expired_session_reports_signed_out() {
        let client = client_for("http://unused.invalid".to_string());
        *client.session.write().await = Some(Session {
            user_id: Uuid::new_v4(),
            email: None,
            access_token: "stale".to_string(),
            expires_at: Utc::now() - Duration::seconds(10),
        });

        assert!(client.current_session().await.unwrap().is_none());
        assert_eq!(client.events().current(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn test_expiry_cleanup_never_discards_concurrent_sign_in() {
        let user_id = Uuid::new_v4();
        let router = Router::new().route(
            "/auth/v1/token",
            post(move || async move {
                Json(json!({
                    "access_token": "fresh-token",
                    "expires_in": 3600,
                    "user": {"id": user_id, "email": "reel@example.com"}
                }))
            }),
        );
        let base = spawn_stub(router).await;

        let client = client_for(base);
        *client.session.write().await = Some(Session {
            user_id: Uuid::new_v4(),
            email: None,
            access_token: "stale".to_string(),
            expires_at: Utc::now() - Duration::seconds(10),
        });

        let (refreshed, checked) = tokio::join!(
            client.sign_in("reel@example.com", "hunter2"),
            client.current_session(),
        );
        assert_eq!(refreshed.unwrap().user_id, user_id);
        checked.unwrap();

        // Whichever side ran second, the fresh session must survive and
        // the channel must read signed-in.
        let current = client.current_session().await.unwrap();
        assert_eq!(current.map(|s| s.user_id), Some(user_id));
        assert_eq!(client.events().current(), AuthState::SignedIn { user_id });
    }
}
