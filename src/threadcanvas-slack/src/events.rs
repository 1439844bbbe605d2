//! Event handling for Slack events.
//!
//! Handles the Events API callbacks the bot subscribes to:
//! - `app_mention` - When the bot is @mentioned
//! - `message.*` - Channel messages (acknowledged and ignored by default)
//!
//! Events arrive either through Socket Mode envelopes or HTTP callbacks; both
//! transports produce an [`EventCallback`] and hand it to [`parse_event`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::ParsedCommand;
use crate::error::{SlackError, SlackResult};
use crate::interactive::BlockActionsPayload;

/// Slack event types that we handle.
#[derive(Debug, Clone)]
pub enum SlackEvent {
    /// App mention event (@bot in a channel or thread).
    AppMention(AppMentionEvent),
    /// Message event.
    Message(MessageEvent),
    /// Unknown event type (for forward compatibility).
    Unknown(String),
}

/// Event payload for app mentions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMentionEvent {
    /// User who mentioned the bot.
    pub user: String,
    /// Text of the message (including the mention).
    #[serde(default)]
    pub text: String,
    /// Channel where the mention occurred.
    pub channel: String,
    /// Timestamp of the message.
    pub ts: String,
    /// Thread timestamp (if in a thread).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Event timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_ts: Option<String>,
}

impl AppMentionEvent {
    /// Whether the mention was posted inside an existing thread.
    pub fn is_in_thread(&self) -> bool {
        self.thread_ts.is_some()
    }
}

/// Event payload for messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    /// User who sent the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Text of the message.
    #[serde(default)]
    pub text: String,
    /// Channel where the message was sent.
    pub channel: String,
    /// Channel type (im, channel, group, mpim).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,
    /// Timestamp of the message.
    #[serde(default)]
    pub ts: String,
    /// Thread timestamp (if in a thread).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Subtype of message (e.g., "bot_message").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Bot ID (if message is from a bot).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

impl MessageEvent {
    /// Check if this is a bot message (should be ignored).
    pub fn is_bot_message(&self) -> bool {
        self.bot_id.is_some() || self.subtype.as_deref() == Some("bot_message")
    }
}

/// Socket Mode envelope wrapping events, commands and interactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketModeEnvelope {
    /// Envelope ID for acknowledgment (absent on `hello`/`disconnect`).
    #[serde(default)]
    pub envelope_id: Option<String>,
    /// Type of payload.
    #[serde(rename = "type")]
    pub envelope_type: String,
    /// Payload; its shape depends on `envelope_type`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Delivery attempt number for redelivered events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_attempt: Option<u32>,
    /// Reason given with a `disconnect` envelope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Events API callback body (`"type": "event_callback"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCallback {
    /// Team ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    /// API app ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_app_id: Option<String>,
    /// The actual event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<serde_json::Value>,
    /// Callback type.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub payload_type: Option<String>,
    /// Event ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Event time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<u64>,
}

/// Socket Mode acknowledgment response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketModeAck {
    /// Envelope ID being acknowledged.
    pub envelope_id: String,
    /// Optional response payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl SocketModeAck {
    /// Create a simple acknowledgment.
    pub fn new(envelope_id: impl Into<String>) -> Self {
        Self {
            envelope_id: envelope_id.into(),
            payload: None,
        }
    }

    /// Create an acknowledgment with a response payload.
    pub fn with_payload(envelope_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            envelope_id: envelope_id.into(),
            payload: Some(payload),
        }
    }
}

/// Extract the prompt from a mention text (removes the @mention part).
///
/// # Example
///
/// ```rust
/// use threadcanvas_slack::events::extract_prompt;
///
/// let text = "<@U12345> summarize this";
/// assert_eq!(extract_prompt(text), "summarize this");
/// ```
pub fn extract_prompt(text: &str) -> String {
    let mut result = text.to_string();

    // <@U...> or <@U...|name>
    while let Some(start) = result.find("<@") {
        if let Some(end) = result[start..].find('>') {
            result = format!("{}{}", &result[..start], &result[start + end + 1..]);
        } else {
            break;
        }
    }

    result.trim().to_string()
}

/// Context for processing an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    /// User ID who triggered the event.
    pub user_id: String,
    /// Channel ID where the event occurred.
    pub channel_id: String,
    /// Thread timestamp, when the event happened inside a thread.
    pub thread_ts: Option<String>,
    /// Original message timestamp.
    pub message_ts: String,
    /// Team ID.
    pub team_id: Option<String>,
}

impl EventContext {
    /// Create context from an app mention event.
    pub fn from_app_mention(event: &AppMentionEvent, team_id: Option<String>) -> Self {
        Self {
            user_id: event.user.clone(),
            channel_id: event.channel.clone(),
            thread_ts: event.thread_ts.clone(),
            message_ts: event.ts.clone(),
            team_id,
        }
    }

    /// Create context from a message event.
    pub fn from_message(event: &MessageEvent, team_id: Option<String>) -> Option<Self> {
        let user_id = event.user.clone()?;

        Some(Self {
            user_id,
            channel_id: event.channel.clone(),
            thread_ts: event.thread_ts.clone(),
            message_ts: event.ts.clone(),
            team_id,
        })
    }

    /// Timestamp to reply under: the thread if any, else the message itself.
    pub fn reply_ts(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.message_ts)
    }
}

/// Trait for handling Slack events.
///
/// Each call runs on its own task; returned errors are logged by the
/// dispatcher and dropped.
#[async_trait::async_trait]
pub trait SlackEventHandler: Send + Sync {
    /// Handle an app mention event.
    async fn handle_app_mention(
        &self,
        event: AppMentionEvent,
        context: EventContext,
    ) -> SlackResult<()>;

    /// Handle a message event. Ignored unless overridden.
    async fn handle_message(&self, event: MessageEvent, context: EventContext) -> SlackResult<()> {
        let _ = (event, context);
        Ok(())
    }

    /// Handle a `block_actions` interaction (button clicks).
    async fn handle_block_actions(&self, payload: BlockActionsPayload) -> SlackResult<()>;

    /// Handle a parsed slash command after it has been acknowledged.
    async fn handle_slash_command(&self, command: ParsedCommand) -> SlackResult<()>;
}

/// Parse the `event` of a callback into a typed [`SlackEvent`].
pub fn parse_event(callback: &EventCallback) -> SlackResult<SlackEvent> {
    let event_json = callback
        .event
        .as_ref()
        .ok_or_else(|| SlackError::InvalidPayload("Missing event field".to_string()))?;

    let event_type = event_json
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("unknown");

    debug!("Parsing event type: {}", event_type);

    match event_type {
        "app_mention" => {
            let event: AppMentionEvent = serde_json::from_value(event_json.clone())?;
            Ok(SlackEvent::AppMention(event))
        }
        "message" => {
            let event: MessageEvent = serde_json::from_value(event_json.clone())?;
            Ok(SlackEvent::Message(event))
        }
        other => Ok(SlackEvent::Unknown(other.to_string())),
    }
}
