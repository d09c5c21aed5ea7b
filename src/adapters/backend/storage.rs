//! Supabase Storage implementation of [`ObjectStore`].

use super::client::{Payload, SupabaseClient};
use crate::domain::DomainError;
use crate::ports::ObjectStore;
use reqwest::Method;
use std::sync::Arc;
use tracing::info;

pub struct SupabaseStorage {
    client: Arc<SupabaseClient>,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(client: Arc<SupabaseClient>, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for SupabaseStorage {
    /// Returns the object path inside the bucket; that is what report records store.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        token: &str,
    ) -> Result<String, DomainError> {
        let size = bytes.len();
        self.client
            .send(
                Method::POST,
                &format!("/storage/v1/object/{}/{}", self.bucket, path),
                Some(token),
                &[],
                Payload::Bytes {
                    data: bytes,
                    content_type: content_type.to_string(),
                },
            )
            .await
            .map_err(|e| DomainError::Storage(format!("{}: {}", path, e)))?;

        info!(bucket = %self.bucket, path, size, "file uploaded");
        Ok(path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn upload_posts_bytes_into_bucket() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/medical-reports/u1/abc.pdf"))
            .and(header("content-type", "application/pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "x"})))
            .expect(1)
            .mount(&server)
            .await;

        let storage = SupabaseStorage::new(
            Arc::new(SupabaseClient::new(server.uri(), "anon")),
            "medical-reports",
        );
        let stored = storage
            .upload("u1/abc.pdf", b"%PDF".to_vec(), "application/pdf", "tok")
            .await
            .unwrap();
        assert_eq!(stored, "u1/abc.pdf");

        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].body, b"%PDF");
    }

    #[tokio::test]
    async fn failed_upload_is_storage_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(413).set_body_json(json!({"message": "too large"})))
            .mount(&server)
            .await;

        let storage = SupabaseStorage::new(
            Arc::new(SupabaseClient::new(server.uri(), "anon")),
            "medical-reports",
        );
        let err = storage
            .upload("u1/big.png", vec![0; 8], "image/png", "tok")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Storage(ref m) if m.contains("too large")));
    }
}
