//! Demo responder used when no AI provider key is configured.
//!
//! Never touches the network. Chat replies come from a fixed, ordered list of
//! keyword buckets (first match wins); report analysis and summaries fail with
//! `NotConfigured` so callers degrade the same way they would for a live failure.

use crate::domain::{AnalysisRequest, AnalysisResult, ChatMessage, DomainError};
use crate::ports::{AnalysisPort, ChatPort};
use std::time::Duration;
use tracing::info;

pub const BLOOD_TEST_REPLY: &str = "I can help you understand blood test results! In a real scenario, I would analyze your specific values and explain what they mean. Common blood tests include CBC (Complete Blood Count), cholesterol panels, and glucose levels. For personalized insights, please add OpenAI credits to enable AI analysis or consult with a doctor.";

pub const REPORT_REPLY: &str = "I can analyze medical reports and provide patient-friendly explanations. Upload your report through the 'Upload Report' section, and once OpenAI credits are added, I'll provide detailed AI-powered insights. For now, you can view your uploaded reports in the Reports section.";

pub const APPOINTMENT_REPLY: &str = "You can book appointments with doctors through our platform! Go to the 'Find Doctors' section to search for specialists based on your needs. I'd provide personalized doctor recommendations with full AI capabilities enabled.";

pub const HELP_REPLY: &str = "I'm IASO AI, your medical assistant! I can help you:\n• Understand medical reports\n• Explain blood test results\n• Find the right doctors\n• Book appointments\n• Answer health questions\n\nNote: Full AI analysis requires OpenAI credits. Please add credits at platform.openai.com or ask your questions and I'll provide helpful guidance!";

pub const DEFAULT_REPLY: &str = "Thank you for your question! I'm currently in demo mode as the OpenAI API quota has been exceeded. To enable full AI-powered responses, please add credits to your OpenAI account. In the meantime, I can still help you navigate the IASO Med platform, upload reports, and book appointments with doctors. How else can I assist you?";

/// Keyword buckets in match order.
const BUCKETS: &[(&[&str], &str)] = &[
    (&["blood", "test", "lab"], BLOOD_TEST_REPLY),
    (&["report", "analysis"], REPORT_REPLY),
    (&["appointment", "doctor"], APPOINTMENT_REPLY),
    (&["help", "how"], HELP_REPLY),
];

/// Canned reply for `input`: first bucket with a case-insensitive substring hit.
pub fn demo_reply(input: &str) -> &'static str {
    let lower = input.to_lowercase();
    BUCKETS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, reply)| *reply)
        .unwrap_or(DEFAULT_REPLY)
}

/// Offline stand-in for the AI provider.
pub struct DemoAdapter {
    /// Simulated thinking time before a reply, in milliseconds.
    delay_ms: u64,
}

impl DemoAdapter {
    /// Demo adapter without artificial delay.
    pub fn new() -> Self {
        Self { delay_ms: 0 }
    }

    pub fn with_delay(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    fn not_configured() -> DomainError {
        DomainError::NotConfigured("AI provider API key not configured".to_string())
    }
}

impl Default for DemoAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ChatPort for DemoAdapter {
    async fn reply(&self, _history: &[ChatMessage], message: &str) -> Result<String, DomainError> {
        info!(input_len = message.len(), "[DEMO] answering from keyword buckets");
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        Ok(demo_reply(message).to_string())
    }
}

#[async_trait::async_trait]
impl AnalysisPort for DemoAdapter {
    async fn analyze_report(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, DomainError> {
        info!(
            payload_len = request.payload.len(),
            "[DEMO] report analysis unavailable"
        );
        Err(Self::not_configured())
    }

    async fn summarize_report(
        &self,
        _report_type: &str,
        _extracted_text: &str,
    ) -> Result<String, DomainError> {
        Err(Self::not_configured())
    }
}
