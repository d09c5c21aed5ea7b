//! Login, registration and logout. Delegates to the AuthPort adapter and
//! publishes the identity through [`Session`].

use super::latch::InFlight;
use super::session::Session;
use crate::domain::{DomainError, RegistrationDraft, SessionUser};
use crate::ports::AuthPort;
use std::sync::Arc;
use tracing::info;

pub struct AuthService {
    auth: Arc<dyn AuthPort>,
    session: Arc<Session>,
    latch: InFlight,
}

impl AuthService {
    pub fn new(auth: Arc<dyn AuthPort>, session: Arc<Session>) -> Self {
        Self {
            auth,
            session,
            latch: InFlight::new(),
        }
    }

    /// Check if someone is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.session.current().is_some()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, DomainError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(DomainError::Validation(
                "email and password are required".to_string(),
            ));
        }
        let _permit = self.latch.try_begin()?;
        self.session.sign_in(email, password).await
    }

    /// Submit a completed registration wizard. The user still has to sign in
    /// afterwards (the provider may require email confirmation first).
    pub async fn register(&self, draft: &RegistrationDraft) -> Result<(), DomainError> {
        let request = draft.submit()?;
        let _permit = self.latch.try_begin()?;
        self.auth.sign_up(&request).await?;
        info!(role = ?draft.role(), "registration submitted");
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), DomainError> {
        self.session.logout().await
    }
}
