//! Signed-in identity, shared with every part of the client through a watch channel.

use crate::domain::{DomainError, SessionUser, UserRole};
use crate::ports::AuthPort;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

pub struct Session {
    auth: Arc<dyn AuthPort>,
    tx: watch::Sender<Option<SessionUser>>,
}

impl Session {
    pub fn new(auth: Arc<dyn AuthPort>) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { auth, tx }
    }

    /// Receiver that observes every sign-in and logout.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionUser>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<SessionUser> {
        self.tx.borrow().clone()
    }

    pub fn role(&self) -> Option<UserRole> {
        self.tx.borrow().as_ref().map(|u| u.role)
    }

    /// Current user or an `Auth` error when nobody is signed in.
    pub fn require(&self) -> Result<SessionUser, DomainError> {
        self.current()
            .ok_or_else(|| DomainError::Auth("not signed in".to_string()))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, DomainError> {
        let user = self.auth.sign_in(email, password).await?;
        self.tx.send_replace(Some(user.clone()));
        Ok(user)
    }

    /// Sign out with the provider, then clear the identity.
    ///
    /// The identity is cleared even when the provider call fails; the error is
    /// still returned so the caller can report it.
    pub async fn logout(&self) -> Result<(), DomainError> {
        let Some(user) = self.current() else {
            return Ok(());
        };
        let result = self.auth.sign_out(&user).await;
        self.tx.send_replace(None);
        info!(user_id = %user.id, "session cleared");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::testing::FakeAuth;

    #[tokio::test]
    async fn subscribers_see_sign_in_and_logout() {
        let auth = Arc::new(FakeAuth::default());
        let session = Session::new(auth.clone());
        let mut rx = session.subscribe();
        assert!(session.require().is_err());

        session.sign_in("pat@x.io", "secret").await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|u| u.email.clone()), Some("pat@x.io".into()));
        assert_eq!(session.role(), Some(UserRole::Patient));

        session.logout().await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
        assert_eq!(auth.sign_outs(), 1);
    }

    #[tokio::test]
    async fn failed_sign_in_keeps_session_empty() {
        let session = Session::new(Arc::new(FakeAuth::rejecting()));
        assert!(session.sign_in("a@b.c", "bad").await.is_err());
        assert!(session.current().is_none());
        // Logout with nobody signed in is a no-op.
        session.logout().await.unwrap();
    }
}
