//! Instruction texts and transcript formatting shared by all providers.
//!
//! The analysis instruction pins the output schema, the closed severity set and
//! the not-a-diagnosis disclaimer. Provider request shapes live next to each adapter.

use crate::domain::{ChatMessage, ChatRole};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

/// Vision analysis instruction. Sent as the first content part, before the image.
pub const ANALYSIS_INSTRUCTION: &str = r#"You are a medical AI assistant specialized in analyzing medical reports. Your role is to:
1. Extract and interpret key medical data from report images
2. Identify abnormal values and flag them
3. Provide clear, patient-friendly explanations
4. Classify severity: normal, warning, or critical
5. Suggest next steps (always recommend consulting a doctor)

Analyze this medical report image and provide your response in VALID JSON format with this exact structure:
{
  "summary": "Brief 2-3 sentence overview of the report",
  "keyFindings": ["Finding 1", "Finding 2", "Finding 3"],
  "recommendations": ["Recommendation 1", "Recommendation 2"],
  "severity": "normal"
}

IMPORTANT:
- Return ONLY valid JSON, no markdown formatting
- Always include a disclaimer that this is AI analysis and not a medical diagnosis; professional medical consultation is required
- severity must be exactly one of: "normal", "warning", or "critical""#;

/// Persona for the chat assistant.
pub const CHAT_INSTRUCTION: &str = "You are IASO AI, a helpful and professional medical assistant for the IASO Med platform. You help patients understand their medical reports and symptoms. Always include a disclaimer that you are an AI and not a replacement for professional medical advice.";

const SUMMARY_INSTRUCTION: &str = "You are a medical AI that creates brief, patient-friendly summaries of medical reports. Keep it concise (2-3 sentences) and always remind users to consult their doctor.";

/// Encode a binary payload for embedding in a JSON body.
pub fn encode_payload(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// `data:` URL form used by chat-completions image parts.
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, encode_payload(bytes))
}

fn speaker(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "User",
        ChatRole::Assistant => "Model",
    }
}

/// Single-text chat prompt: persona, transcript, then the open `Model:` turn.
pub fn chat_prompt(history: &[ChatMessage], message: &str) -> String {
    let transcript = history
        .iter()
        .map(|m| format!("{}: {}", speaker(m.role), m.content))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{}\n\n{}\nUser: {}\nModel:",
        CHAT_INSTRUCTION, transcript, message
    )
}

pub fn summary_prompt(report_type: &str, extracted_text: &str) -> String {
    format!(
        "{}\n\nSummarize this {} report in patient-friendly language:\n\n{}",
        SUMMARY_INSTRUCTION, report_type, extracted_text
    )
}
