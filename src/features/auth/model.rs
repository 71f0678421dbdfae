use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Authenticated session issued by the identity provider.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_expiring_in(seconds: i64) -> Session {
        Session {
            user_id: Uuid::new_v4(),
            email: Some("reel@example.com".to_string()),
            access_token: "token".to_string(),
            expires_at: Utc::now() + Duration::seconds(seconds),
        }
    }

    #[test]
    fn test_live_session_is_not_expired() {
        assert!(!session_expiring_in(3600).is_expired());
    }

    #[test]
    fn test_past_expiry_is_expired() {
        assert!(session_expiring_in(-5).is_expired());
    }
}
