//! Thin HTTP client for the hosted backend (Supabase auth, PostgREST, storage).
//!
//! Every request carries the project's anon key in `apikey`; calls made on
//! behalf of a signed-in user add `Authorization: Bearer <access token>`.

use crate::domain::DomainError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

/// Request body variants.
pub enum Payload {
    Empty,
    Json(Value),
    Bytes { data: Vec<u8>, content_type: String },
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, DomainError> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&self.anon_key)?);
        if let Some(token) = auth_token {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", token))?);
        }
        Ok(headers)
    }

    /// Send a request and fail on any non-2xx status.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        extra_headers: &[(&'static str, &'static str)],
        payload: Payload,
    ) -> Result<Response, DomainError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, path, "backend request");

        let mut headers = self.headers(auth_token)?;
        for (name, value) in extra_headers {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }

        let mut req = self.client.request(method, &url).headers(headers);
        req = match payload {
            Payload::Empty => req,
            Payload::Json(body) => req.json(&body),
            Payload::Bytes { data, content_type } => req
                .header(CONTENT_TYPE, header_value(&content_type)?)
                .body(data),
        };

        let response = req
            .send()
            .await
            .map_err(|e| DomainError::Backend(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = backend_error_message(&text);
        error!(status = %status, path, message = %message, "backend API error");
        Err(match status.as_u16() {
            401 | 403 => DomainError::Auth(message),
            404 => DomainError::Backend(format!("resource not found: {}", message)),
            code => DomainError::Backend(format!("API error ({}): {}", code, message)),
        })
    }

    /// Send and decode the JSON response.
    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, DomainError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, &[], body)
            .await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        extra_headers: &[(&'static str, &'static str)],
        body: Option<Value>,
    ) -> Result<T, DomainError>
    where
        T: DeserializeOwned,
    {
        let payload = body.map_or(Payload::Empty, Payload::Json);
        let response = self
            .send(method, path, auth_token, extra_headers, payload)
            .await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DomainError::Backend(format!("unexpected response body: {}", e)))
    }

    /// Send and ignore the response body (204 / `return=minimal`).
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        extra_headers: &[(&'static str, &'static str)],
        body: Option<Value>,
    ) -> Result<(), DomainError> {
        let payload = body.map_or(Payload::Empty, Payload::Json);
        self.send(method, path, auth_token, extra_headers, payload)
            .await
            .map(|_| ())
    }
}

fn header_value(value: &str) -> Result<HeaderValue, DomainError> {
    HeaderValue::from_str(value)
        .map_err(|_| DomainError::Backend("invalid characters in header value".to_string()))
}

/// Pull a human-readable message out of an auth/PostgREST/storage error body.
fn backend_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}
