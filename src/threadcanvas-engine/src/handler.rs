//! Slack event handling for the canvas bot.
//!
//! Mentions in a thread either start the pipeline right away (when the text
//! carries a trigger word) or ask for confirmation with Yes/No buttons.
//! Slash commands arrive here already parsed and acknowledged.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use threadcanvas_slack::commands::ParsedCommand;
use threadcanvas_slack::events::extract_prompt;
use threadcanvas_slack::messages::{ButtonStyle, SlackBlockElement};
use threadcanvas_slack::{
    AppMentionEvent, BlockActionsPayload, CommandContext, DelayedResponse, EventContext, SlackApi,
    SlackError, SlackEventHandler, SlackMessageBuilder, SlackMessageContent, SlackResult,
    ThreadRef,
};
use tracing::{debug, error, info, warn};

use crate::orchestrator::CanvasOrchestrator;
use crate::types::CanvasRequest;

/// Words in a mention that start the pipeline without confirmation.
pub const TRIGGER_WORDS: &[&str] = &[
    "まとめて",
    "canvas作成",
    "キャンバス作成",
    "作成して",
    "整理して",
    "要約して",
    "summary",
    "summarize",
    "create",
    "make",
];

/// Action ID of the confirmation's Yes button.
pub const CONFIRM_YES_ACTION: &str = "create_canvas_from_mention_yes";

/// Action ID of the confirmation's No button.
pub const CONFIRM_NO_ACTION: &str = "create_canvas_from_mention_no";

/// How many recent channel messages to scan for the latest thread.
pub const LATEST_THREAD_SCAN_LIMIT: u32 = 100;

pub(crate) const CREATING_NOTE: &str = "🔄 Creating the canvas. This may take a moment...";
pub(crate) const CANCELLED_NOTE: &str = "👍 Canvas creation cancelled.";
pub(crate) const NO_THREAD_NOTE: &str = "❌ No thread with replies was found in this channel.";

/// Whether a mention asks for a canvas outright.
pub fn contains_trigger_word(text: &str) -> bool {
    let text = text.to_lowercase();
    TRIGGER_WORDS.iter().any(|word| text.contains(word))
}

/// Help posted when the bot is mentioned outside a thread.
pub fn help_text(user_id: &str) -> String {
    format!(
        "<@{}> 👋 I turn Slack threads into canvases.\n\n\
         *Usage:*\n\
         • Mention me in a thread (asks for confirmation first)\n\
         • Mention me in a thread with `summary` (starts right away)\n\
         • `/create-canvas <thread URL> [title]` for a specific thread\n\
         • `/create-canvas-from-thread [title]` for the latest thread in this channel",
        user_id
    )
}

/// Error parsing a confirmation button value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed confirmation value {0:?}: expected channel|thread_ts|user")]
pub struct ConfirmationValueError(String);

/// The `channel|thread_ts|user` value carried by the confirmation buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationValue {
    pub channel: String,
    pub thread_ts: String,
    pub user_id: String,
}

impl ConfirmationValue {
    pub fn new(
        channel: impl Into<String>,
        thread_ts: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            thread_ts: thread_ts.into(),
            user_id: user_id.into(),
        }
    }

    pub fn thread(&self) -> ThreadRef {
        ThreadRef::new(&self.channel, &self.thread_ts)
    }
}

impl fmt::Display for ConfirmationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.channel, self.thread_ts, self.user_id)
    }
}

impl FromStr for ConfirmationValue {
    type Err = ConfirmationValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('|').collect();
        match parts.as_slice() {
            [channel, thread_ts, user_id]
                if !channel.is_empty() && !thread_ts.is_empty() && !user_id.is_empty() =>
            {
                Ok(Self::new(*channel, *thread_ts, *user_id))
            }
            _ => Err(ConfirmationValueError(s.to_string())),
        }
    }
}

/// Ephemeral Yes/No prompt asking whether to summarize a thread.
pub fn confirmation_message(value: &ConfirmationValue) -> SlackMessageContent {
    let value = value.to_string();
    SlackMessageBuilder::new()
        .fallback("Create a canvas from this thread?")
        .section("📝 Summarize this thread into a canvas?")
        .context("⚠️ This uses the OpenAI API and consumes tokens.")
        .actions(vec![
            SlackBlockElement::button("Yes - Create canvas", CONFIRM_YES_ACTION, value.as_str())
                .styled(ButtonStyle::Primary),
            SlackBlockElement::button("No - Cancel", CONFIRM_NO_ACTION, value.as_str()),
        ])
        .build()
}

/// The canvas bot's [`SlackEventHandler`].
pub struct CanvasBot {
    orchestrator: Arc<CanvasOrchestrator>,
}

impl CanvasBot {
    pub fn new(orchestrator: Arc<CanvasOrchestrator>) -> Self {
        Self { orchestrator }
    }

    fn slack(&self) -> &dyn SlackApi {
        self.orchestrator.slack().as_ref()
    }

    /// Run the pipeline; failures were already reported into the thread.
    async fn run_pipeline(&self, request: CanvasRequest) {
        if let Err(e) = self.orchestrator.create_canvas(&request).await {
            error!(user = %request.user_id, "Canvas creation failed: {}", e);
        }
    }

    /// Post an ephemeral note.
    ///
    /// Errors are logged and discarded.
    async fn notify_user(&self, channel: &str, user: &str, thread_ts: Option<&str>, text: &str) {
        let content = SlackMessageContent::new()
            .with_text(text)
            .in_optional_thread(thread_ts);
        if let Err(e) = self.slack().post_ephemeral(channel, user, content).await {
            warn!("Could not send ephemeral message: {}", e);
        }
    }

    /// Reply through a slash command's response URL.
    ///
    /// Errors are logged and discarded.
    async fn reply_to_command(&self, context: &CommandContext, text: &str) {
        if context.response_url.is_empty() {
            self.notify_user(&context.channel_id, &context.user_id, None, text)
                .await;
            return;
        }
        let response = DelayedResponse::new().with_text(text).ephemeral();
        if let Err(e) = self
            .slack()
            .respond(&context.response_url, &response)
            .await
        {
            warn!("Could not send command response: {}", e);
        }
    }

    /// Replace the confirmation prompt with `text`, or post it as a new
    /// ephemeral note when the interaction has no response URL.
    ///
    /// Errors are logged and discarded.
    async fn answer_confirmation(
        &self,
        payload: &BlockActionsPayload,
        value: &ConfirmationValue,
        text: &str,
    ) {
        if let Some(url) = payload.response_url.as_deref() {
            let response = DelayedResponse::new()
                .with_text(text)
                .ephemeral()
                .replace_original();
            match self.slack().respond(url, &response).await {
                Ok(()) => return,
                Err(e) => warn!("Could not replace confirmation prompt: {}", e),
            }
        }
        self.notify_user(
            &value.channel,
            &value.user_id,
            Some(&value.thread_ts),
            text,
        )
        .await;
    }

    async fn latest_thread(&self, channel: &str) -> SlackResult<Option<ThreadRef>> {
        let history = self
            .slack()
            .conversation_history(channel, LATEST_THREAD_SCAN_LIMIT)
            .await?;
        Ok(history.iter().find(|m| m.has_replies()).map(|m| {
            ThreadRef::new(channel, m.thread_ts.as_deref().unwrap_or(&m.ts))
        }))
    }

    async fn run_command(&self, context: &CommandContext, request: CanvasRequest) {
        if let Err(e) = self.orchestrator.create_canvas(&request).await {
            error!(user = %request.user_id, "Canvas creation failed: {}", e);
            self.reply_to_command(context, &format!("❌ {}", e)).await;
        }
    }
}

#[async_trait]
impl SlackEventHandler for CanvasBot {
    async fn handle_app_mention(
        &self,
        event: AppMentionEvent,
        context: EventContext,
    ) -> SlackResult<()> {
        let Some(thread_ts) = event.thread_ts.as_deref() else {
            debug!(channel = %event.channel, "Mention outside a thread, posting help");
            self.slack()
                .post_message(
                    &event.channel,
                    SlackMessageContent::new().with_text(help_text(&event.user)),
                )
                .await?;
            return Ok(());
        };

        if contains_trigger_word(&extract_prompt(&event.text)) {
            info!(channel = %event.channel, thread_ts, "Trigger word mention, creating canvas");
            self.notify_user(&event.channel, &event.user, Some(thread_ts), CREATING_NOTE)
                .await;
            let request =
                CanvasRequest::new(ThreadRef::new(&event.channel, thread_ts), &context.user_id);
            self.run_pipeline(request).await;
            return Ok(());
        }

        let value = ConfirmationValue::new(&event.channel, thread_ts, &event.user);
        self.slack()
            .post_ephemeral(
                &event.channel,
                &event.user,
                confirmation_message(&value).in_thread(thread_ts),
            )
            .await
    }

    async fn handle_block_actions(&self, payload: BlockActionsPayload) -> SlackResult<()> {
        let Some(action) = payload.first_action() else {
            return Ok(());
        };
        let action_id = action.action_id.as_str();
        if action_id != CONFIRM_YES_ACTION && action_id != CONFIRM_NO_ACTION {
            debug!(action_id, "Ignoring unknown action");
            return Ok(());
        }

        let value: ConfirmationValue = action
            .value
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|e: ConfirmationValueError| SlackError::InvalidPayload(e.to_string()))?;

        if action_id == CONFIRM_NO_ACTION {
            info!(user = %value.user_id, "Canvas creation cancelled");
            self.answer_confirmation(&payload, &value, CANCELLED_NOTE)
                .await;
            return Ok(());
        }

        self.answer_confirmation(&payload, &value, CREATING_NOTE)
            .await;
        let request = CanvasRequest::new(value.thread(), &value.user_id);
        if let Err(e) = self.orchestrator.create_canvas(&request).await {
            error!(user = %value.user_id, "Canvas creation failed: {}", e);
            self.notify_user(
                &value.channel,
                &value.user_id,
                Some(&value.thread_ts),
                &format!("❌ An error occurred: {}", e),
            )
            .await;
        }
        Ok(())
    }

    async fn handle_slash_command(&self, command: ParsedCommand) -> SlackResult<()> {
        match command {
            ParsedCommand::CreateCanvas {
                thread,
                title,
                context,
            } => {
                let request = CanvasRequest::new(thread, &context.user_id).with_title(title);
                self.run_command(&context, request).await;
            }
            ParsedCommand::CreateFromLatestThread { title, context } => {
                match self.latest_thread(&context.channel_id).await? {
                    Some(thread) => {
                        info!(thread_ts = %thread.thread_ts, "Using latest thread in channel");
                        let request =
                            CanvasRequest::new(thread, &context.user_id).with_title(title);
                        self.run_command(&context, request).await;
                    }
                    None => self.reply_to_command(&context, NO_THREAD_NOTE).await,
                }
            }
            ParsedCommand::Invalid { .. } | ParsedCommand::Unknown { .. } => {}
        }
        Ok(())
    }
}
