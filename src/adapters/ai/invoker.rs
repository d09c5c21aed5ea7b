//! Remote invoker: exactly one POST per user action, no retry, transport-default timeout.
//!
//! Failures come back typed so callers can choose a fallback:
//! missing key → `NotConfigured` (no network), send failure → `Transport`,
//! non-2xx → `ProviderStatus`, non-JSON body → `MalformedResponse`.

use crate::domain::DomainError;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Where the API key travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPlacement {
    /// `?key=...` query parameter (Gemini).
    Query,
    /// `Authorization: Bearer ...` header (OpenAI-compatible).
    Bearer,
}

pub struct RemoteInvoker {
    client: reqwest::Client,
    api_key: String,
    placement: KeyPlacement,
}

impl RemoteInvoker {
    pub fn new(api_key: String, placement: KeyPlacement) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            placement,
        }
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// POST `body` as JSON to `url` and return the parsed JSON response.
    pub async fn post_json<B>(&self, url: &str, body: &B) -> Result<Value, DomainError>
    where
        B: Serialize + ?Sized + Sync,
    {
        if !self.has_key() {
            return Err(DomainError::NotConfigured(
                "AI provider API key not configured".to_string(),
            ));
        }

        debug!(url, "posting request to AI provider");
        let mut req = self.client.post(url).json(body);
        req = match self.placement {
            KeyPlacement::Query => req.query(&[("key", self.api_key.as_str())]),
            KeyPlacement::Bearer => req.bearer_auth(&self.api_key),
        };

        let response = req
            .send()
            .await
            .map_err(|e| DomainError::Transport(format!("HTTP request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = provider_error_message(&text);
            warn!(status = %status, message = %message, "AI API returned error");
            return Err(DomainError::ProviderStatus {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| DomainError::MalformedResponse(format!("response is not JSON: {}", e)))
    }
}

/// `error.message` from a provider error body, else the first 200 chars of the body.
fn provider_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
