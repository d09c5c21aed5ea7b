//! Response extractor: recover the analysis JSON from free-text model output.
//!
//! Models sometimes wrap JSON in markdown fences. A ```` ```json ```` block wins,
//! then a bare ```` ``` ```` block, then the raw text. Parsing is strict: unknown
//! severities and missing fields are errors, never defaults.

use crate::domain::{AnalysisResult, DomainError};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```json\n?([\s\S]*?)\n?```").expect("valid json fence regex"));

static BARE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```\n?([\s\S]*?)\n?```").expect("valid fence regex"));

/// Interior of the first fenced block, or the whole text, trimmed.
pub fn extract_json_block(text: &str) -> &str {
    let trimmed = text.trim();
    let inner = JSON_FENCE
        .captures(trimmed)
        .or_else(|| BARE_FENCE.captures(trimmed))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);
    inner.trim()
}

/// Parse provider text into an [`AnalysisResult`].
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, DomainError> {
    let json = extract_json_block(text);
    serde_json::from_str::<AnalysisResult>(json).map_err(|e| {
        warn!(error = %e, json = %json.chars().take(200).collect::<String>(), "analysis JSON parse failed");
        DomainError::MalformedResponse(e.to_string())
    })
}
