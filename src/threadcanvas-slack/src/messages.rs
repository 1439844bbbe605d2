//! Message content and Block Kit building blocks.

use serde::{Deserialize, Serialize};

/// Slack Block Kit block types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackBlock {
    /// Header block.
    Header { text: SlackTextObject },
    /// Section block (main content).
    Section {
        text: SlackTextObject,
        #[serde(skip_serializing_if = "Option::is_none")]
        accessory: Option<SlackBlockElement>,
    },
    /// Divider block.
    Divider {},
    /// Context block (small text).
    Context { elements: Vec<SlackContextElement> },
    /// Actions block (buttons).
    Actions { elements: Vec<SlackBlockElement> },
}

/// Slack text object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackTextObject {
    #[serde(rename = "type")]
    pub text_type: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<bool>,
}

impl SlackTextObject {
    /// Create a plain text object.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text_type: "plain_text".to_string(),
            text: text.into(),
            emoji: Some(true),
        }
    }

    /// Create a mrkdwn text object.
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            text_type: "mrkdwn".to_string(),
            text: text.into(),
            emoji: None,
        }
    }
}

/// Slack context element (for context blocks).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackContextElement {
    /// Plain text.
    PlainText { text: String },
    /// Mrkdwn text.
    Mrkdwn { text: String },
}

/// Button style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

/// Slack block element (buttons).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackBlockElement {
    /// Button element.
    Button {
        text: SlackTextObject,
        action_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<ButtonStyle>,
    },
}

impl SlackBlockElement {
    /// Create a button carrying `value` back in the interaction payload.
    pub fn button(
        text: impl Into<String>,
        action_id: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        SlackBlockElement::Button {
            text: SlackTextObject::plain(text),
            action_id: action_id.into(),
            value: Some(value.into()),
            style: None,
        }
    }

    /// Set the button style.
    pub fn styled(self, new_style: ButtonStyle) -> Self {
        match self {
            SlackBlockElement::Button {
                text,
                action_id,
                value,
                ..
            } => SlackBlockElement::Button {
                text,
                action_id,
                value,
                style: Some(new_style),
            },
        }
    }
}

/// Slack message content with blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackMessageContent {
    /// Fallback text for notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Block Kit blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<SlackBlock>>,
    /// Thread timestamp (for replies).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Whether to also send to channel when in thread.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_broadcast: Option<bool>,
}

impl SlackMessageContent {
    /// Create a new message content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set fallback text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set thread timestamp (for replies).
    pub fn in_thread(mut self, thread_ts: impl Into<String>) -> Self {
        self.thread_ts = Some(thread_ts.into());
        self
    }

    /// Set the thread timestamp when one is given.
    pub fn in_optional_thread(mut self, thread_ts: Option<&str>) -> Self {
        self.thread_ts = thread_ts.map(str::to_string);
        self
    }

    /// Broadcast to channel as well as thread.
    pub fn broadcast(mut self) -> Self {
        self.reply_broadcast = Some(true);
        self
    }

    /// Write this content into a Web API request body.
    pub(crate) fn apply_to(&self, payload: &mut serde_json::Value) {
        if let Some(text) = &self.text {
            payload["text"] = serde_json::json!(text);
        }
        if let Some(blocks) = &self.blocks {
            payload["blocks"] = serde_json::json!(blocks);
        }
        if let Some(thread_ts) = &self.thread_ts {
            payload["thread_ts"] = serde_json::json!(thread_ts);
        }
        if let Some(reply_broadcast) = self.reply_broadcast {
            payload["reply_broadcast"] = serde_json::json!(reply_broadcast);
        }
    }
}

/// Builder for creating rich Slack messages.
pub struct SlackMessageBuilder {
    blocks: Vec<SlackBlock>,
    fallback_text: Option<String>,
}

impl SlackMessageBuilder {
    /// Create a new message builder.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            fallback_text: None,
        }
    }

    /// Set fallback text for notifications.
    pub fn fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback_text = Some(text.into());
        self
    }

    /// Add a header block.
    pub fn header(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(SlackBlock::Header {
            text: SlackTextObject::plain(text),
        });
        self
    }

    /// Add a section with mrkdwn text.
    pub fn section(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(SlackBlock::Section {
            text: SlackTextObject::mrkdwn(text),
            accessory: None,
        });
        self
    }

    /// Add a divider.
    pub fn divider(mut self) -> Self {
        self.blocks.push(SlackBlock::Divider {});
        self
    }

    /// Add a context block.
    pub fn context(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(SlackBlock::Context {
            elements: vec![SlackContextElement::Mrkdwn { text: text.into() }],
        });
        self
    }

    /// Add an actions block.
    pub fn actions(mut self, elements: Vec<SlackBlockElement>) -> Self {
        self.blocks.push(SlackBlock::Actions { elements });
        self
    }

    /// Build the message content.
    pub fn build(self) -> SlackMessageContent {
        SlackMessageContent {
            text: self.fallback_text,
            blocks: Some(self.blocks),
            thread_ts: None,
            reply_broadcast: None,
        }
    }
}

impl Default for SlackMessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
