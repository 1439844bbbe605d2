//! Interactive payloads (Block Kit button clicks).
//!
//! Slack delivers `block_actions` payloads over Socket Mode as the envelope
//! payload, and over HTTP as a form field named `payload` holding JSON.

use serde::{Deserialize, Serialize};

use crate::error::{SlackError, SlackResult};

/// The user who clicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractiveUser {
    /// User ID.
    pub id: String,
    /// Username, when Slack includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Channel the interaction happened in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractiveChannel {
    /// Channel ID.
    pub id: String,
}

/// Where the clicked element lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractiveContainer {
    /// Timestamp of the message holding the element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_ts: Option<String>,
    /// Thread of the message, if it was posted in one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Channel holding the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

/// A single action from a `block_actions` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockAction {
    /// Action ID of the element.
    pub action_id: String,
    /// Block ID of the containing block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    /// Value attached to the button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A `block_actions` interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockActionsPayload {
    /// Who clicked.
    pub user: InteractiveUser,
    /// Channel, when the element was in a message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<InteractiveChannel>,
    /// Container metadata.
    #[serde(default)]
    pub container: InteractiveContainer,
    /// Actions taken, usually one.
    #[serde(default)]
    pub actions: Vec<BlockAction>,
    /// URL for posting follow-up responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_url: Option<String>,
    /// Trigger ID for opening modals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_id: Option<String>,
}

impl BlockActionsPayload {
    /// Channel ID, from the channel object or the container.
    pub fn channel_id(&self) -> Option<&str> {
        self.channel
            .as_ref()
            .map(|c| c.id.as_str())
            .or(self.container.channel_id.as_deref())
    }

    /// Timestamp of the message holding the clicked element.
    pub fn message_ts(&self) -> Option<&str> {
        self.container.message_ts.as_deref()
    }

    /// The first action, which is the one that was clicked.
    pub fn first_action(&self) -> Option<&BlockAction> {
        self.actions.first()
    }
}

/// Interactive payload types we route.
#[derive(Debug, Clone)]
pub enum InteractivePayload {
    /// Button clicks and other block element actions.
    BlockActions(BlockActionsPayload),
    /// Anything else (view submissions, shortcuts, ...).
    Unsupported(String),
}

/// Parse an interactive payload by its `type` field.
pub fn parse_interactive(value: serde_json::Value) -> SlackResult<InteractivePayload> {
    let payload_type = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| SlackError::InvalidPayload("Interactive payload has no type".to_string()))?
        .to_string();

    match payload_type.as_str() {
        "block_actions" => Ok(InteractivePayload::BlockActions(serde_json::from_value(
            value,
        )?)),
        _ => Ok(InteractivePayload::Unsupported(payload_type)),
    }
}
