//! Google Gemini adapter for chat, report summaries and vision analysis.
//!
//! Uses the `generateContent` endpoint with the key as a query parameter.
//! Implements `AnalysisPort` and `ChatPort`.

use super::extract::parse_analysis;
use super::invoker::{KeyPlacement, RemoteInvoker};
use super::prompt::{ANALYSIS_INSTRUCTION, chat_prompt, encode_payload, summary_prompt};
use crate::domain::{AnalysisRequest, AnalysisResult, ChatMessage, DomainError};
use crate::ports::{AnalysisPort, ChatPort};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

/// Gemini `generateContent` client.
pub struct GeminiAdapter {
    invoker: RemoteInvoker,
    base_url: String,
    chat_model: String,
    vision_model: String,
}

impl GeminiAdapter {
    /// Create a new Gemini adapter.
    ///
    /// # Arguments
    /// * `base_url` - API root (e.g. "https://generativelanguage.googleapis.com/v1beta")
    /// * `api_key` - API key; empty means every call fails with `NotConfigured`
    /// * `chat_model` - Text model for chat and summaries (e.g. "gemini-pro")
    /// * `vision_model` - Image-capable model for report analysis (e.g. "gemini-pro-vision")
    pub fn new(
        base_url: String,
        api_key: String,
        chat_model: String,
        vision_model: String,
    ) -> Self {
        Self {
            invoker: RemoteInvoker::new(api_key, KeyPlacement::Query),
            base_url: base_url.trim_end_matches('/').to_string(),
            chat_model,
            vision_model,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// Send one request and return `candidates[0].content.parts[0].text`.
    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest<'_>,
    ) -> Result<String, DomainError> {
        let body = self.invoker.post_json(&self.endpoint(model), request).await?;
        let text = candidate_text(&body).ok_or_else(|| {
            DomainError::MalformedResponse("no content received from Gemini".to_string())
        })?;
        debug!(model, text_len = text.len(), "received Gemini response");
        Ok(text.to_string())
    }
}

/// `{ contents: [{ parts: [...] }] }`
#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

impl<'a> GenerateContentRequest<'a> {
    fn single(parts: Vec<Part<'a>>) -> Self {
        Self {
            contents: vec![Content { parts }],
        }
    }
}

fn candidate_text(body: &Value) -> Option<&str> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

#[async_trait::async_trait]
impl AnalysisPort for GeminiAdapter {
    async fn analyze_report(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, DomainError> {
        let mime_type = request.mime_or_default();
        info!(
            model = %self.vision_model,
            mime_type,
            payload_len = request.payload.len(),
            "sending report to Gemini for analysis"
        );

        let body = GenerateContentRequest::single(vec![
            Part::Text {
                text: ANALYSIS_INSTRUCTION,
            },
            Part::Inline {
                inline_data: InlineData {
                    mime_type,
                    data: encode_payload(&request.payload),
                },
            },
        ]);
        let text = self.generate(&self.vision_model, &body).await?;
        let analysis = parse_analysis(&text)?;

        info!(
            severity = %analysis.severity,
            findings = analysis.key_findings.len(),
            "Gemini analysis complete"
        );
        Ok(analysis)
    }

    async fn summarize_report(
        &self,
        report_type: &str,
        extracted_text: &str,
    ) -> Result<String, DomainError> {
        let prompt = summary_prompt(report_type, extracted_text);
        let body = GenerateContentRequest::single(vec![Part::Text { text: &prompt }]);
        self.generate(&self.chat_model, &body).await
    }
}

#[async_trait::async_trait]
impl ChatPort for GeminiAdapter {
    async fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, DomainError> {
        let prompt = chat_prompt(history, message);
        let body = GenerateContentRequest::single(vec![Part::Text { text: &prompt }]);
        self.generate(&self.chat_model, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer, key: &str) -> GeminiAdapter {
        GeminiAdapter::new(
            format!("{}/v1beta/", server.uri()),
            key.to_string(),
            "gemini-pro".into(),
            "gemini-pro-vision".into(),
        )
    }

    fn candidate(text: &str) -> Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
    }

    #[test]
    fn vision_request_shape() {
        let body = GenerateContentRequest::single(vec![
            Part::Text { text: "instr" },
            Part::Inline {
                inline_data: InlineData {
                    mime_type: "image/png",
                    data: "QUJD".into(),
                },
            },
        ]);
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(
            v,
            json!({"contents": [{"parts": [
                {"text": "instr"},
                {"inlineData": {"mimeType": "image/png", "data": "QUJD"}}
            ]}]})
        );
    }

    #[tokio::test]
    async fn analyze_report_parses_fenced_json() {
        let server = MockServer::start().await;
        let reply = "```json\n{\"summary\":\"ok\",\"keyFindings\":[\"a\"],\"recommendations\":[\"b\"],\"severity\":\"warning\"}\n```";
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-pro-vision:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({"contents": [{"parts": [
                {"text": ANALYSIS_INSTRUCTION},
                {"inlineData": {"mimeType": "image/jpeg", "data": "AQID"}}
            ]}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate(reply)))
            .expect(1)
            .mount(&server)
            .await;

        let result = adapter(&server, "test-key")
            .analyze_report(&AnalysisRequest::new(vec![1, 2, 3], None))
            .await
            .unwrap();
        assert_eq!(result.severity, Severity::Warning);
        assert_eq!(result.key_findings, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn analyze_report_rejects_unknown_severity() {
        let server = MockServer::start().await;
        let reply = r#"{"summary":"s","keyFindings":[],"recommendations":[],"severity":"unknown"}"#;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate(reply)))
            .mount(&server)
            .await;

        let err = adapter(&server, "k")
            .analyze_report(&AnalysisRequest::new(vec![0], Some("image/png".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn empty_candidates_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = adapter(&server, "k").reply(&[], "hi").await.unwrap_err();
        assert!(matches!(err, DomainError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn chat_uses_text_model_and_transcript() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-pro:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate("Hello there")))
            .expect(1)
            .mount(&server)
            .await;

        let history = vec![ChatMessage::assistant("Hello!")];
        let text = adapter(&server, "k").reply(&history, "Hi").await.unwrap();
        assert_eq!(text, "Hello there");

        let received = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&received[0].body).unwrap();
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.ends_with("Model: Hello!\nUser: Hi\nModel:"));
    }
}
