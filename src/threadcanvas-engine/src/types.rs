//! Values passed between pipeline steps.

use std::fmt;

use threadcanvas_slack::{SlackMessage, ThreadRef};

/// Author shown when Slack omits the user ID.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// One human-authored message of a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    /// Author user ID.
    pub author: String,
    /// Message text.
    pub text: String,
    /// Message timestamp.
    pub ts: String,
}

impl ThreadMessage {
    /// Convert a Slack message, skipping bot-authored and text-less ones.
    pub fn from_slack(message: &SlackMessage) -> Option<Self> {
        if message.is_bot_message() {
            return None;
        }
        let text = message.text()?;
        Some(Self {
            author: message
                .user
                .clone()
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            text: text.to_string(),
            ts: message.ts.clone(),
        })
    }
}

/// Title and Markdown body produced by the summarizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    pub title: String,
    pub body: String,
}

/// What ended up in Slack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Canvas,
    File,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Canvas => write!(f, "canvas"),
            ArtifactKind::File => write!(f, "file"),
        }
    }
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub kind: ArtifactKind,
    /// Canvas ID or file ID, depending on `kind`.
    pub id: String,
}

impl PublishResult {
    pub fn canvas(id: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::Canvas,
            id: id.into(),
        }
    }

    pub fn file(id: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::File,
            id: id.into(),
        }
    }
}

/// A request to summarize one thread into a canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasRequest {
    /// The thread to summarize.
    pub thread: ThreadRef,
    /// The user who asked; mentioned in notifications and granted access.
    pub user_id: String,
    /// Title override; the generated title is used when absent.
    pub title: Option<String>,
}

impl CanvasRequest {
    pub fn new(thread: ThreadRef, user_id: impl Into<String>) -> Self {
        Self {
            thread,
            user_id: user_id.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// The override title, if it has any non-whitespace content.
    pub fn title_override(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
