//! OpenAI-compatible adapter for report analysis and chat.
//!
//! Supports OpenAI API, Azure OpenAI, and any chat-completions endpoint that
//! accepts `image_url` content parts. Implements `AnalysisPort` and `ChatPort`.

use super::extract::parse_analysis;
use super::invoker::{KeyPlacement, RemoteInvoker};
use super::prompt::{ANALYSIS_INSTRUCTION, CHAT_INSTRUCTION, data_url, summary_prompt};
use crate::domain::{AnalysisRequest, AnalysisResult, ChatMessage, ChatRole, DomainError};
use crate::ports::{AnalysisPort, ChatPort};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

/// OpenAI-compatible AI adapter.
///
/// Can be configured to work with:
/// - OpenAI API (api.openai.com)
/// - Azure OpenAI
/// - Any OpenAI-compatible API with vision support
pub struct OpenAiAdapter {
    invoker: RemoteInvoker,
    api_url: String,
    model: String,
}

impl OpenAiAdapter {
    /// Create a new OpenAI adapter.
    ///
    /// # Arguments
    /// * `api_url` - API endpoint (e.g., "https://api.openai.com/v1/chat/completions")
    /// * `api_key` - API key; empty means every call fails with `NotConfigured`
    /// * `model` - Vision-capable model name (e.g., "gpt-4o")
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        Self {
            invoker: RemoteInvoker::new(api_key, KeyPlacement::Bearer),
            api_url,
            model,
        }
    }

    async fn complete(&self, request: &ChatRequest<'_>) -> Result<String, DomainError> {
        let body = self.invoker.post_json(&self.api_url, request).await?;
        let content = first_choice_content(&body).ok_or_else(|| {
            DomainError::MalformedResponse("no response choices returned".to_string())
        })?;
        debug!(raw_len = content.len(), "received AI response");
        Ok(content.to_string())
    }
}

/// OpenAI API request structure.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<OutboundMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct OutboundMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

fn role_name(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

fn first_choice_content(body: &Value) -> Option<&str> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

#[async_trait::async_trait]
impl AnalysisPort for OpenAiAdapter {
    async fn analyze_report(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, DomainError> {
        info!(
            model = %self.model,
            payload_len = request.payload.len(),
            "sending report to AI for analysis"
        );

        let image = data_url(request.mime_or_default(), &request.payload);
        let chat = ChatRequest {
            model: &self.model,
            messages: vec![
                OutboundMessage {
                    role: "system",
                    content: MessageContent::Text(ANALYSIS_INSTRUCTION),
                },
                OutboundMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: "Analyze this medical report.",
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl { url: image },
                        },
                    ]),
                },
            ],
            temperature: 0.3,
        };

        let raw = self.complete(&chat).await?;
        let analysis = parse_analysis(&raw)?;

        info!(
            severity = %analysis.severity,
            findings = analysis.key_findings.len(),
            recommendations = analysis.recommendations.len(),
            "AI analysis complete"
        );
        Ok(analysis)
    }

    async fn summarize_report(
        &self,
        report_type: &str,
        extracted_text: &str,
    ) -> Result<String, DomainError> {
        let prompt = summary_prompt(report_type, extracted_text);
        let chat = ChatRequest {
            model: &self.model,
            messages: vec![OutboundMessage {
                role: "user",
                content: MessageContent::Text(&prompt),
            }],
            temperature: 0.3,
        };
        Ok(self.complete(&chat).await?.trim().to_string())
    }
}

#[async_trait::async_trait]
impl ChatPort for OpenAiAdapter {
    async fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, DomainError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(OutboundMessage {
            role: "system",
            content: MessageContent::Text(CHAT_INSTRUCTION),
        });
        messages.extend(history.iter().map(|m| OutboundMessage {
            role: role_name(m.role),
            content: MessageContent::Text(&m.content),
        }));
        messages.push(OutboundMessage {
            role: "user",
            content: MessageContent::Text(message),
        });

        let chat = ChatRequest {
            model: &self.model,
            messages,
            temperature: 0.7,
        };
        self.complete(&chat).await
    }
}
