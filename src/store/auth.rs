//! Authentication store: tokens issued along the login/signup flows.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

/// Current authentication material.
///
/// `phone_auth_token` is the short-lived token handed out after OTP
/// verification and consumed by partner registration; `access_token` is the
/// session credential attached to authenticated API calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: Option<String>,
    pub phone_auth_token: Option<String>,
    pub user_name: Option<String>,
}

impl AuthSession {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

/// Shared auth state with named setters and watch-based subscription.
#[derive(Debug)]
pub struct AuthStore {
    tx: watch::Sender<AuthSession>,
}

impl AuthStore {
    pub fn new() -> Self {
        Self {
            tx: watch::channel(AuthSession::default()).0,
        }
    }

    pub fn snapshot(&self) -> AuthSession {
        self.tx.borrow().clone()
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthSession> {
        self.tx.subscribe()
    }

    pub fn access_token(&self) -> Option<String> {
        self.tx.borrow().access_token.clone()
    }

    pub fn phone_auth_token(&self) -> Option<String> {
        self.tx.borrow().phone_auth_token.clone()
    }

    pub fn set_access_token(&self, token: impl Into<String>) {
        debug!("access token updated");
        self.tx.send_modify(|s| s.access_token = Some(token.into()));
    }

    pub fn set_phone_auth_token(&self, token: impl Into<String>) {
        debug!("phone auth token updated");
        self.tx
            .send_modify(|s| s.phone_auth_token = Some(token.into()));
    }

    pub fn set_user_name(&self, name: impl Into<String>) {
        self.tx.send_modify(|s| s.user_name = Some(name.into()));
    }

    /// Drop all credentials, e.g. on forced re-authentication.
    pub fn clear(&self) {
        debug!("auth session cleared");
        self.tx.send_replace(AuthSession::default());
    }
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_setters() {
        let store = AuthStore::new();
        assert!(!store.snapshot().is_authenticated());

        store.set_phone_auth_token("phone-tok");
        store.set_access_token("access-tok");
        store.set_user_name("Hoshi");

        let session = store.snapshot();
        assert!(session.is_authenticated());
        assert_eq!(session.phone_auth_token.as_deref(), Some("phone-tok"));
        assert_eq!(session.user_name.as_deref(), Some("Hoshi"));

        store.clear();
        assert_eq!(store.snapshot(), AuthSession::default());
    }

    #[tokio::test]
    async fn test_subscription_sees_updates() {
        let store = AuthStore::new();
        let mut rx = store.subscribe();

        store.set_access_token("tok-1");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().access_token.as_deref(), Some("tok-1"));
    }
}
