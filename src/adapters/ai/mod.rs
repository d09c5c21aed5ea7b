//! AI adapter module. Implements AnalysisPort and ChatPort for hosted LLMs.
//!
//! Provides Gemini and OpenAI-compatible adapters, plus the offline demo adapter
//! wired in when no API key is configured.

pub mod demo_adapter;
pub mod extract;
pub mod gemini_adapter;
pub mod invoker;
pub mod openai_adapter;
pub mod prompt;

pub use demo_adapter::{DemoAdapter, demo_reply};
pub use extract::{extract_json_block, parse_analysis};
pub use gemini_adapter::GeminiAdapter;
pub use openai_adapter::OpenAiAdapter;
