//! Error types for the canvas pipeline.

use thiserror::Error;
use threadcanvas_openai::OpenAiError;
use threadcanvas_slack::SlackError;

/// Errors raised while turning a thread into a canvas.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// A Slack call failed.
    #[error("Slack request failed: {0}")]
    Upstream(#[from] SlackError),

    /// The thread has no human-authored text messages.
    #[error("No messages found in the thread")]
    NoContent,

    /// The language model call failed or returned nothing usable.
    #[error("Summarization failed: {0}")]
    Summarization(String),

    /// The canvas exists but its link could not be posted.
    #[error("Canvas {canvas_id} was created, but posting its link failed: {source}")]
    Notify {
        canvas_id: String,
        source: SlackError,
    },

    /// Neither the canvas nor the fallback file could be published.
    #[error("Publishing failed: {0}")]
    Publish(String),
}

impl From<OpenAiError> for CanvasError {
    fn from(err: OpenAiError) -> Self {
        CanvasError::Summarization(err.to_string())
    }
}

/// Result type for the canvas pipeline.
pub type Result<T> = std::result::Result<T, CanvasError>;
