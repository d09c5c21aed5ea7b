//! Supabase GoTrue implementation of [`AuthPort`].

use super::client::SupabaseClient;
use crate::domain::{DomainError, SessionUser, SignUpRequest, UserRole};
use crate::ports::AuthPort;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::info;

pub struct SupabaseAuth {
    client: Arc<SupabaseClient>,
}

impl SupabaseAuth {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Map<String, Value>,
}

fn metadata_str<'a>(metadata: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Name: `full_name` metadata, else the email's local part, else "User".
fn session_user(access_token: String, user: AuthUser) -> SessionUser {
    let email = user.email.unwrap_or_default();
    let name = metadata_str(&user.user_metadata, "full_name")
        .map(str::to_string)
        .or_else(|| {
            email
                .split('@')
                .next()
                .filter(|local| !local.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "User".to_string());
    let role = match metadata_str(&user.user_metadata, "role") {
        Some("doctor") => UserRole::Doctor,
        _ => UserRole::Patient,
    };

    SessionUser {
        id: user.id,
        name,
        email,
        role,
        access_token,
    }
}

/// Login and signup failures surface as `Auth` regardless of status.
fn as_auth_error(err: DomainError) -> DomainError {
    match err {
        DomainError::Backend(msg) => DomainError::Auth(msg),
        other => other,
    }
}

#[async_trait::async_trait]
impl AuthPort for SupabaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, DomainError> {
        let token: TokenResponse = self
            .client
            .request(
                Method::POST,
                "/auth/v1/token?grant_type=password",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await
            .map_err(as_auth_error)?;

        let user = session_user(token.access_token, token.user);
        info!(user_id = %user.id, role = %user.role, "signed in");
        Ok(user)
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), DomainError> {
        self.client
            .execute(
                Method::POST,
                "/auth/v1/signup",
                None,
                &[],
                Some(json!({
                    "email": request.email,
                    "password": request.password,
                    "data": request.metadata,
                })),
            )
            .await
            .map_err(as_auth_error)?;
        info!("account created");
        Ok(())
    }

    async fn sign_out(&self, user: &SessionUser) -> Result<(), DomainError> {
        self.client
            .execute(
                Method::POST,
                "/auth/v1/logout",
                Some(&user.access_token),
                &[],
                None,
            )
            .await?;
        info!(user_id = %user.id, "signed out");
        Ok(())
    }
}
