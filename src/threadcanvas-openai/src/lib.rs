//! OpenAI-compatible chat completion client for threadcanvas.
//!
//! This crate talks to any server exposing `POST {base}/chat/completions`
//! in the OpenAI format. The [`CompletionClient`] trait is the seam the
//! summarizer depends on; [`OpenAiClient`] is the HTTP implementation.

mod client;
mod config;
mod models;

pub use client::{CompletionClient, OpenAiClient};
pub use config::OpenAiConfig;
pub use models::{ChatChoice, ChatMessage, ChatRequest, ChatResponse, Usage};

/// Default model used when `OPENAI_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default API base URL.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Error types for completion requests
#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server returned error: {0}")]
    ServerError(String),

    #[error("Rate limited by the completion API")]
    RateLimited,

    #[error("Request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for completion requests
pub type Result<T> = std::result::Result<T, OpenAiError>;
