//! Application configuration. Backend + AI provider endpoints and credentials.
//!
//! Sources, in order: `IASO_*` environment variables, an optional file named by
//! `IASO_CONFIG`, then a few unprefixed fallbacks (`GEMINI_API_KEY`,
//! `OPENAI_API_KEY`, `SUPABASE_URL`, `SUPABASE_ANON_KEY`). The presence of an
//! AI API key is the only switch between live and demo replies.

use serde::{Deserialize, Deserializer};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_CHAT_MODEL: &str = "gemini-pro";
pub const DEFAULT_GEMINI_VISION_MODEL: &str = "gemini-pro-vision";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_STORAGE_BUCKET: &str = "medical-reports";

/// Simulated latency for demo replies in the interactive client.
pub const DEFAULT_DEMO_DELAY_MS: u64 = 1000;

/// Which hosted model family backs chat and report analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Gemini,
    #[serde(alias = "open_ai")]
    OpenAi,
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    // ─────────────────────────────────────────────────────────────────────────
    // Backend (Supabase)
    // ─────────────────────────────────────────────────────────────────────────
    /// Project URL. Read from IASO_SUPABASE_URL or SUPABASE_URL.
    #[serde(default)]
    pub supabase_url: Option<String>,

    /// Public anon key. Read from IASO_SUPABASE_ANON_KEY or SUPABASE_ANON_KEY.
    #[serde(default)]
    pub supabase_anon_key: Option<String>,

    /// Storage bucket for uploaded reports. Read from IASO_STORAGE_BUCKET.
    #[serde(default)]
    pub storage_bucket: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // AI Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// gemini | openai. Read from IASO_AI_PROVIDER.
    #[serde(default)]
    pub ai_provider: Option<AiProvider>,

    /// Provider API key. Read from IASO_AI_API_KEY, else the provider's usual variable.
    #[serde(default)]
    pub ai_api_key: Option<String>,

    /// Gemini base URL or OpenAI-compatible completions URL. Read from IASO_AI_API_URL.
    #[serde(default)]
    pub ai_api_url: Option<String>,

    /// Chat model. Read from IASO_AI_MODEL.
    #[serde(default)]
    pub ai_model: Option<String>,

    /// Image-capable model for report analysis. Read from IASO_AI_VISION_MODEL.
    #[serde(default)]
    pub ai_vision_model: Option<String>,

    /// Delay before a demo reply is shown. Read from IASO_DEMO_DELAY_MS.
    /// A value that is not a whole number of milliseconds is ignored.
    #[serde(default, deserialize_with = "lenient_millis")]
    pub demo_delay_ms: Option<u64>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        Self::from_env(config::Environment::with_prefix("IASO"))
    }

    fn from_env(env: config::Environment) -> Result<Self, config::ConfigError> {
        let mut c = config::Config::builder();
        c = c.add_source(env);
        if let Ok(path) = std::env::var("IASO_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    pub fn ai_provider_or_default(&self) -> AiProvider {
        self.ai_provider.unwrap_or_default()
    }

    /// Returns the AI API key if configured. Blank values count as absent.
    pub fn ai_api_key(&self) -> Option<String> {
        let fallback_var = match self.ai_provider_or_default() {
            AiProvider::Gemini => "GEMINI_API_KEY",
            AiProvider::OpenAi => "OPENAI_API_KEY",
        };
        self.ai_api_key
            .clone()
            .or_else(|| std::env::var(fallback_var).ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// Returns true if AI is configured (API key present).
    pub fn is_ai_configured(&self) -> bool {
        self.ai_api_key().is_some()
    }

    /// Gemini base URL or OpenAI completions URL, depending on the provider.
    pub fn ai_api_url_or_default(&self) -> String {
        self.ai_api_url.clone().unwrap_or_else(|| {
            match self.ai_provider_or_default() {
                AiProvider::Gemini => DEFAULT_GEMINI_BASE_URL,
                AiProvider::OpenAi => DEFAULT_OPENAI_URL,
            }
            .to_string()
        })
    }

    pub fn ai_model_or_default(&self) -> String {
        self.ai_model.clone().unwrap_or_else(|| {
            match self.ai_provider_or_default() {
                AiProvider::Gemini => DEFAULT_GEMINI_CHAT_MODEL,
                AiProvider::OpenAi => DEFAULT_OPENAI_MODEL,
            }
            .to_string()
        })
    }

    /// Vision model. OpenAI uses one multimodal model for both paths.
    pub fn ai_vision_model_or_default(&self) -> String {
        self.ai_vision_model
            .clone()
            .unwrap_or_else(|| match self.ai_provider_or_default() {
                AiProvider::Gemini => DEFAULT_GEMINI_VISION_MODEL.to_string(),
                AiProvider::OpenAi => self.ai_model_or_default(),
            })
    }

    pub fn demo_delay_ms_or_default(&self) -> u64 {
        self.demo_delay_ms.unwrap_or(DEFAULT_DEMO_DELAY_MS)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Backend Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    pub fn supabase_url(&self) -> Option<String> {
        self.supabase_url
            .clone()
            .or_else(|| std::env::var("SUPABASE_URL").ok())
            .map(|u| u.trim_end_matches('/').to_string())
    }

    pub fn supabase_anon_key(&self) -> Option<String> {
        self.supabase_anon_key
            .clone()
            .or_else(|| std::env::var("SUPABASE_ANON_KEY").ok())
    }

    pub fn storage_bucket_or_default(&self) -> String {
        self.storage_bucket
            .clone()
            .unwrap_or_else(|| DEFAULT_STORAGE_BUCKET.to_string())
    }

    /// Returns true if the backend URL and anon key are both present.
    pub fn is_backend_configured(&self) -> bool {
        self.supabase_url().is_some() && self.supabase_anon_key().is_some()
    }
}

/// Env values arrive as strings and file values as integers; a typo yields `None`.
fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(ms)) => Some(ms),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        Some(Raw::Other(_)) | None => None,
    })
}
