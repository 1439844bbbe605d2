//! Slack slash command handling.
//!
//! Supports the following slash commands:
//! - `/create-canvas <thread-url|ts> [title…]` - Summarize a given thread
//! - `/create-canvas-from-thread [title…]` - Summarize the channel's latest thread
//!
//! Commands must be acknowledged within 3 seconds; follow-up notes go through
//! the command's `response_url`.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{SlackError, SlackResult};
use crate::thread_ref::{ThreadRef, normalize_thread_ref};

/// Command that summarizes an explicit thread.
pub const CREATE_CANVAS_COMMAND: &str = "/create-canvas";

/// Command that summarizes the most recent thread of the channel.
pub const CREATE_FROM_THREAD_COMMAND: &str = "/create-canvas-from-thread";

const CREATE_CANVAS_USAGE: &str =
    "Usage: `/create-canvas <thread URL or timestamp> [title]`\ne.g. `/create-canvas https://your-team.slack.com/archives/C0123ABC/p1700000000123456 Weekly sync`";

/// Slack slash command payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlashCommandPayload {
    /// Command token (deprecated, use signing secret instead).
    #[serde(default)]
    pub token: String,
    /// Team ID.
    pub team_id: String,
    /// Team domain.
    #[serde(default)]
    pub team_domain: String,
    /// Enterprise ID (for Enterprise Grid).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise_id: Option<String>,
    /// Channel ID where command was invoked.
    pub channel_id: String,
    /// Channel name.
    #[serde(default)]
    pub channel_name: String,
    /// User ID who invoked the command.
    pub user_id: String,
    /// Username.
    #[serde(default)]
    pub user_name: String,
    /// The command (e.g., "/create-canvas").
    pub command: String,
    /// Text after the command.
    #[serde(default)]
    pub text: String,
    /// API app ID.
    #[serde(default)]
    pub api_app_id: String,
    /// URL for delayed responses.
    pub response_url: String,
    /// Trigger ID for opening modals.
    #[serde(default)]
    pub trigger_id: String,
}

impl SlashCommandPayload {
    /// Build a payload from `application/x-www-form-urlencoded` pairs.
    pub fn from_form<'a, I>(pairs: I) -> SlackResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let map: serde_json::Map<String, serde_json::Value> = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();

        serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| SlackError::InvalidPayload(format!("Invalid slash command: {}", e)))
    }
}

/// Response type for slash command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum ResponseType {
    /// Only visible to the user who invoked the command.
    #[default]
    Ephemeral,
    /// Visible to everyone in the channel.
    InChannel,
}

/// Immediate response to a slash command.
///
/// Must be sent within 3 seconds of receiving the command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlashCommandResponse {
    /// Response type (ephemeral or in_channel).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    /// Simple text response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl SlashCommandResponse {
    /// Create a simple text response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Set response type to ephemeral (only visible to invoker).
    pub fn ephemeral(mut self) -> Self {
        self.response_type = Some(ResponseType::Ephemeral);
        self
    }
}

/// Delayed response sent via response_url.
///
/// Can be sent up to 30 minutes after the original command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DelayedResponse {
    /// Response type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    /// Whether to replace the original message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace_original: Option<bool>,
    /// Text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl DelayedResponse {
    /// Create a new delayed response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set response type to ephemeral.
    pub fn ephemeral(mut self) -> Self {
        self.response_type = Some(ResponseType::Ephemeral);
        self
    }

    /// Replace the original message (e.g. a confirmation prompt).
    pub fn replace_original(mut self) -> Self {
        self.replace_original = Some(true);
        self
    }
}

/// Send a delayed response to the response_url.
pub async fn send_delayed_response(
    client: &reqwest::Client,
    response_url: &str,
    response: &DelayedResponse,
) -> SlackResult<()> {
    debug!("Sending delayed response to: {}", response_url);

    let resp = client.post(response_url).json(response).send().await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        error!("Failed to send delayed response: {} - {}", status, body);
        return Err(SlackError::Api(format!(
            "Failed to send delayed response: {} - {}",
            status, body
        )));
    }

    debug!("Delayed response sent successfully");
    Ok(())
}

/// Parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    /// `/create-canvas <ref> [title…]`.
    CreateCanvas {
        /// The thread to summarize.
        thread: ThreadRef,
        /// Title override.
        title: Option<String>,
        /// Context from the slash command.
        context: CommandContext,
    },
    /// `/create-canvas-from-thread [title…]`.
    CreateFromLatestThread {
        /// Title override.
        title: Option<String>,
        /// Context from the slash command.
        context: CommandContext,
    },
    /// A known command with unusable arguments.
    Invalid {
        /// Note shown to the invoking user.
        reason: String,
        /// Context from the slash command.
        context: CommandContext,
    },
    /// Unknown command.
    Unknown {
        /// The command name.
        command: String,
        /// The text after the command.
        text: String,
        /// Context from the slash command.
        context: CommandContext,
    },
}

impl ParsedCommand {
    /// Whether the command has work to run after the acknowledgment.
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            ParsedCommand::CreateCanvas { .. } | ParsedCommand::CreateFromLatestThread { .. }
        )
    }

    /// Context of the invocation.
    pub fn context(&self) -> &CommandContext {
        match self {
            ParsedCommand::CreateCanvas { context, .. }
            | ParsedCommand::CreateFromLatestThread { context, .. }
            | ParsedCommand::Invalid { context, .. }
            | ParsedCommand::Unknown { context, .. } => context,
        }
    }
}

/// Context information from a slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    /// User ID who invoked the command.
    pub user_id: String,
    /// Channel ID where command was invoked.
    pub channel_id: String,
    /// Team ID.
    pub team_id: String,
    /// URL for delayed responses.
    pub response_url: String,
}

impl From<&SlashCommandPayload> for CommandContext {
    fn from(payload: &SlashCommandPayload) -> Self {
        Self {
            user_id: payload.user_id.clone(),
            channel_id: payload.channel_id.clone(),
            team_id: payload.team_id.clone(),
            response_url: payload.response_url.clone(),
        }
    }
}

fn title_from(text: &str) -> Option<String> {
    let title = text.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Parse a slash command payload into a structured command.
pub fn parse_command(payload: &SlashCommandPayload) -> ParsedCommand {
    let context = CommandContext::from(payload);
    let command = payload.command.to_lowercase();
    let text = payload.text.trim();

    match command.as_str() {
        CREATE_CANVAS_COMMAND => {
            let (reference, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
            if reference.is_empty() {
                return ParsedCommand::Invalid {
                    reason: CREATE_CANVAS_USAGE.to_string(),
                    context,
                };
            }

            match normalize_thread_ref(reference, &payload.channel_id) {
                Ok(thread) => ParsedCommand::CreateCanvas {
                    thread,
                    title: title_from(rest),
                    context,
                },
                Err(e) => {
                    warn!("create-canvas with unusable thread reference: {}", e);
                    ParsedCommand::Invalid {
                        reason: format!("{}\n{}", e, CREATE_CANVAS_USAGE),
                        context,
                    }
                }
            }
        }
        CREATE_FROM_THREAD_COMMAND => ParsedCommand::CreateFromLatestThread {
            title: title_from(text),
            context,
        },
        _ => ParsedCommand::Unknown {
            command: payload.command.clone(),
            text: text.to_string(),
            context,
        },
    }
}

/// Create an acknowledgment response for a command.
pub fn create_ack_response(command: &ParsedCommand) -> SlashCommandResponse {
    match command {
        ParsedCommand::CreateCanvas { thread, .. } => SlashCommandResponse::text(format!(
            "🔄 Creating a canvas from thread {}. This may take a moment...",
            thread.thread_ts
        ))
        .ephemeral(),
        ParsedCommand::CreateFromLatestThread { .. } => SlashCommandResponse::text(
            "🔄 Looking for the latest thread in this channel...",
        )
        .ephemeral(),
        ParsedCommand::Invalid { reason, .. } => {
            SlashCommandResponse::text(format!("❌ {}", reason)).ephemeral()
        }
        ParsedCommand::Unknown { command, .. } => {
            SlashCommandResponse::text(format!("❓ Unknown command: {}", command)).ephemeral()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_payload(command: &str, text: &str) -> SlashCommandPayload {
        SlashCommandPayload {
            token: "test-token".to_string(),
            team_id: "T12345".to_string(),
            team_domain: "test".to_string(),
            enterprise_id: None,
            channel_id: "C67890".to_string(),
            channel_name: "general".to_string(),
            user_id: "U11111".to_string(),
            user_name: "testuser".to_string(),
            command: command.to_string(),
            text: text.to_string(),
            api_app_id: "A22222".to_string(),
            response_url: "https://hooks.slack.com/commands/xxx".to_string(),
            trigger_id: "trigger123".to_string(),
        }
    }

    #[test]
    fn test_parse_create_canvas_with_url_and_title() {
        let payload = create_test_payload(
            "/create-canvas",
            "https://acme.slack.com/archives/C0AAA/p1700000000123456 Weekly sync notes",
        );

        match parse_command(&payload) {
            ParsedCommand::CreateCanvas {
                thread,
                title,
                context,
            } => {
                assert_eq!(thread, ThreadRef::new("C0AAA", "1700000000.123456"));
                assert_eq!(title.as_deref(), Some("Weekly sync notes"));
                assert_eq!(context.user_id, "U11111");
            }
            other => panic!("Expected CreateCanvas, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_create_canvas_timestamp_uses_command_channel() {
        let payload = create_test_payload("/create-canvas", "1700000000.123456");

        match parse_command(&payload) {
            ParsedCommand::CreateCanvas { thread, title, .. } => {
                assert_eq!(thread, ThreadRef::new("C67890", "1700000000.123456"));
                assert_eq!(title, None);
            }
            other => panic!("Expected CreateCanvas, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_create_canvas_missing_reference() {
        let payload = create_test_payload("/create-canvas", "   ");
        let cmd = parse_command(&payload);

        assert!(!cmd.is_actionable());
        let ack = create_ack_response(&cmd);
        assert!(ack.text.unwrap().contains("Usage"));
        assert_eq!(ack.response_type, Some(ResponseType::Ephemeral));
    }

    #[test]
    fn test_parse_create_canvas_invalid_reference() {
        let payload = create_test_payload("/create-canvas", "yesterday's thread");

        match parse_command(&payload) {
            ParsedCommand::Invalid { reason, .. } => {
                assert!(reason.contains("Unrecognized thread reference"));
            }
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_create_from_latest_thread() {
        let payload = create_test_payload("/create-canvas-from-thread", "Retro");

        match parse_command(&payload) {
            ParsedCommand::CreateFromLatestThread { title, context } => {
                assert_eq!(title.as_deref(), Some("Retro"));
                assert_eq!(context.channel_id, "C67890");
            }
            other => panic!("Expected CreateFromLatestThread, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_command() {
        let payload = create_test_payload("/unknown", "some text");
        let cmd = parse_command(&payload);

        match &cmd {
            ParsedCommand::Unknown { command, text, .. } => {
                assert_eq!(command, "/unknown");
                assert_eq!(text, "some text");
            }
            _ => panic!("Expected Unknown command"),
        }
        assert!(
            create_ack_response(&cmd)
                .text
                .unwrap()
                .contains("Unknown command")
        );
    }

    #[test]
    fn test_payload_from_form() {
        let pairs = [
            ("team_id", "T1"),
            ("channel_id", "C1"),
            ("user_id", "U1"),
            ("command", "/create-canvas"),
            ("text", "p1700000000123456"),
            ("response_url", "https://hooks.slack.com/commands/1"),
        ];
        let payload = SlashCommandPayload::from_form(pairs).unwrap();
        assert_eq!(payload.command, "/create-canvas");
        assert_eq!(payload.trigger_id, "");

        let missing = SlashCommandPayload::from_form([("team_id", "T1")]);
        assert!(matches!(missing, Err(SlackError::InvalidPayload(_))));
    }

    #[test]
    fn test_delayed_response() {
        let response = DelayedResponse::new()
            .with_text("Done!")
            .ephemeral()
            .replace_original();

        assert_eq!(response.text, Some("Done!".to_string()));
        assert_eq!(response.response_type, Some(ResponseType::Ephemeral));
        assert_eq!(response.replace_original, Some(true));
    }

    #[test]
    fn test_command_context_from_payload() {
        let payload = create_test_payload("/create-canvas", "test");
        let context = CommandContext::from(&payload);

        assert_eq!(context.user_id, "U11111");
        assert_eq!(context.channel_id, "C67890");
        assert_eq!(context.team_id, "T12345");
        assert!(context.response_url.contains("hooks.slack.com"));
    }
}
