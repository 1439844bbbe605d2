//! Error types for the Slack integration.
//!
//! Covers Web API failures, transport problems (HTTP and Socket Mode),
//! request signature verification and malformed payloads.

use thiserror::Error;

/// Errors that can occur during Slack operations.
#[derive(Error, Debug)]
pub enum SlackError {
    /// Configuration error (missing or invalid config).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication error (invalid token, expired, etc.).
    #[error("Authentication error: {0}")]
    Auth(String),

    /// API request failed.
    #[error("Slack API error: {0}")]
    Api(String),

    /// API rate limited.
    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// WebSocket connection error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Request signature verification failed.
    #[error("Signature verification failed: {0}")]
    SignatureVerification(String),

    /// Operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Channel not found or bot not in channel.
    #[error("Channel error: {0}")]
    Channel(String),

    /// User not found.
    #[error("User error: {0}")]
    User(String),

    /// Invalid payload received from Slack.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for SlackError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SlackError::Timeout(err.to_string())
        } else if err.is_connect() {
            SlackError::Network(format!("Connection failed: {}", err))
        } else {
            SlackError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SlackError {
    fn from(err: serde_json::Error) -> Self {
        SlackError::Json(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SlackError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        SlackError::WebSocket(err.to_string())
    }
}

/// Result type for Slack operations.
pub type SlackResult<T> = std::result::Result<T, SlackError>;

/// A Web API response that came back with `"ok": false`.
#[derive(Debug, Clone)]
pub struct SlackApiError {
    /// Error code from Slack (e.g., "channel_not_found").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Whether this error is retryable.
    pub retryable: bool,
}

impl SlackApiError {
    /// Create a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let retryable = Self::is_retryable_code(&code);
        Self {
            code,
            message: message.into(),
            retryable,
        }
    }

    /// Build an error for a failed call to `method`.
    pub fn for_method(method: &str, code: impl Into<String>) -> Self {
        let code = code.into();
        let message = format!("{} failed: {}", method, code);
        Self::new(code, message)
    }

    fn is_retryable_code(code: &str) -> bool {
        matches!(
            code,
            "rate_limited"
                | "ratelimited"
                | "service_unavailable"
                | "internal_error"
                | "request_timeout"
                | "fatal_error"
        )
    }
}

impl From<SlackApiError> for SlackError {
    fn from(err: SlackApiError) -> Self {
        match err.code.as_str() {
            "rate_limited" | "ratelimited" => SlackError::RateLimited {
                retry_after_secs: 30,
            },
            "invalid_auth" | "account_inactive" | "not_authed" | "token_revoked" => {
                SlackError::Auth(err.message)
            }
            "channel_not_found" | "not_in_channel" => SlackError::Channel(err.message),
            "user_not_found" => SlackError::User(err.message),
            _ => SlackError::Api(err.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SlackError::Config("missing token".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing token");

        let err = SlackError::RateLimited {
            retry_after_secs: 60,
        };
        assert_eq!(err.to_string(), "Rate limited: retry after 60 seconds");
    }

    #[test]
    fn test_api_error_retryable() {
        let err = SlackApiError::new("rate_limited", "Too many requests");
        assert!(err.retryable);

        let err = SlackApiError::new("channel_not_found", "Channel not found");
        assert!(!err.retryable);
    }

    #[test]
    fn test_api_error_conversion() {
        let slack_err: SlackError = SlackApiError::new("invalid_auth", "revoked").into();
        assert!(matches!(slack_err, SlackError::Auth(_)));

        let slack_err: SlackError =
            SlackApiError::for_method("conversations.replies", "not_in_channel").into();
        assert!(matches!(slack_err, SlackError::Channel(_)));

        let slack_err: SlackError =
            SlackApiError::for_method("canvases.create", "free_team_not_allowed").into();
        assert_eq!(
            slack_err.to_string(),
            "Slack API error: canvases.create failed: free_team_not_allowed"
        );
    }
}
