use tokio::sync::watch;
use uuid::Uuid;

/// Broadcast auth state. Consumers refresh read-only behavior on change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    SignedIn { user_id: Uuid },
}

/// Sign-in/sign-out event channel.
///
/// Built on a watch channel: late subscribers immediately observe the
/// current state, and only the latest transition is retained.
pub struct AuthEvents {
    tx: watch::Sender<AuthState>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthState::SignedOut);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    pub(crate) fn emit(&self, state: AuthState) {
        self.tx.send_replace(state);
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let events = AuthEvents::new();
        let mut rx = events.subscribe();
        assert_eq!(*rx.borrow(), AuthState::SignedOut);

        let user_id = Uuid::new_v4();
        events.emit(AuthState::SignedIn { user_id });
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), AuthState::SignedIn { user_id });

        events.emit(AuthState::SignedOut);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), AuthState::SignedOut);
    }

    #[test]
    fn test_late_subscriber_sees_current_state() {
        let events = AuthEvents::new();
        let user_id = Uuid::new_v4();
        events.emit(AuthState::SignedIn { user_id });

        let rx = events.subscribe();
        assert_eq!(*rx.borrow(), AuthState::SignedIn { user_id });
    }
}
