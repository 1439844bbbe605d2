//! Typed Web API request and response bodies.
//!
//! Only the fields this crate reads are modelled; everything else Slack sends
//! is ignored by serde.

use serde::{Deserialize, Serialize};

/// A message as returned by `conversations.replies` / `conversations.history`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackMessage {
    /// Author user ID (absent for some bot and system messages).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Message text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Message timestamp.
    #[serde(default)]
    pub ts: String,
    /// Thread root timestamp, when part of a thread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Number of replies (root messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<u32>,
    /// Bot ID (if message is from a bot).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    /// Subtype of message (e.g., "bot_message").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
}

impl SlackMessage {
    /// Check if this message was posted by a bot.
    pub fn is_bot_message(&self) -> bool {
        self.bot_id.is_some() || self.subtype.as_deref() == Some("bot_message")
    }

    /// Non-empty message text, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// Whether this message is the root of a thread with replies.
    pub fn has_replies(&self) -> bool {
        self.reply_count.unwrap_or(0) > 0
    }
}

/// Cursor metadata on paginated responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMetadata {
    /// Cursor for the next page; empty when exhausted.
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl ResponseMetadata {
    /// The next cursor, if another page exists.
    pub fn cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// Body of `conversations.replies` and `conversations.history`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationPage {
    /// Messages on this page, oldest first for replies.
    #[serde(default)]
    pub messages: Vec<SlackMessage>,
    /// Whether more pages exist.
    #[serde(default)]
    pub has_more: bool,
    /// Pagination cursor.
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

impl ConversationPage {
    /// Cursor for the following page.
    pub fn next_cursor(&self) -> Option<&str> {
        self.response_metadata.as_ref().and_then(|m| m.cursor())
    }
}

/// Identity of the bot's workspace, from `auth.test`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WorkspaceIdentity {
    /// Workspace URL, e.g. `https://acme.slack.com/`.
    #[serde(default)]
    pub url: Option<String>,
    /// Team ID.
    #[serde(default)]
    pub team_id: Option<String>,
    /// Team name.
    #[serde(default)]
    pub team: Option<String>,
    /// Bot's own user ID.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl WorkspaceIdentity {
    /// Workspace URL without the trailing slash.
    pub fn workspace_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .filter(|u| !u.is_empty())
    }
}

/// Body of `team.info`.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamInfoResponse {
    /// Team details.
    #[serde(default)]
    pub team: Option<TeamInfo>,
}

/// Team details from `team.info`.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamInfo {
    /// Team ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Workspace subdomain (`acme` for `acme.slack.com`).
    #[serde(default)]
    pub domain: Option<String>,
}

/// Body of `canvases.create`.
///
/// Slack has returned the new canvas ID both as a top-level `canvas_id` and
/// nested as `canvas.id`. Both are accepted; see [`Self::canvas_id`].
#[derive(Debug, Clone, Deserialize)]
pub struct CanvasCreateResponse {
    /// Whether the call succeeded.
    #[serde(default)]
    pub ok: bool,
    /// Error code when `ok` is false.
    #[serde(default)]
    pub error: Option<String>,
    /// Canvas ID, current shape.
    #[serde(default)]
    pub canvas_id: Option<String>,
    /// Canvas object, alternate shape.
    #[serde(default)]
    pub canvas: Option<CanvasObject>,
}

/// Nested canvas object.
#[derive(Debug, Clone, Deserialize)]
pub struct CanvasObject {
    /// Canvas ID.
    #[serde(default)]
    pub id: Option<String>,
}

impl CanvasCreateResponse {
    /// Compatibility shim over the two known response shapes.
    ///
    /// The top-level `canvas_id` wins; `canvas.id` is used otherwise. Empty
    /// strings count as missing.
    pub fn canvas_id(&self) -> Option<&str> {
        self.canvas_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| {
                self.canvas
                    .as_ref()
                    .and_then(|c| c.id.as_deref())
                    .filter(|id| !id.is_empty())
            })
    }
}

/// Body of `files.getUploadURLExternal`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadUrlResponse {
    /// Pre-signed URL to POST the file bytes to.
    pub upload_url: String,
    /// ID of the file being created.
    pub file_id: String,
}

/// A Markdown/text file to upload into a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Channel to share the file into.
    pub channel: String,
    /// Thread to share the file into, if any.
    pub thread_ts: Option<String>,
    /// File name, e.g. `Weekly sync.md`.
    pub filename: String,
    /// File title shown in Slack.
    pub title: String,
    /// File contents.
    pub content: String,
    /// Message posted alongside the file.
    pub initial_comment: Option<String>,
}
