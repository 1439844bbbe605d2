//! Routing of parsed Slack payloads to a [`SlackEventHandler`].
//!
//! Both transports acknowledge Slack first and then hand the payload here.
//! Each dispatch spawns its own task so the read loop and the HTTP ack are
//! never held up by a slow handler. Handler errors end at this layer: they
//! are logged and dropped.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::commands::{
    SlashCommandPayload, SlashCommandResponse, create_ack_response, parse_command,
};
use crate::error::SlackResult;
use crate::events::{EventCallback, EventContext, SlackEvent, SlackEventHandler, parse_event};
use crate::interactive::{InteractivePayload, parse_interactive};

/// Dispatches Slack payloads to the application handler.
#[derive(Clone)]
pub struct SlackDispatcher {
    handler: Arc<dyn SlackEventHandler>,
}

impl SlackDispatcher {
    /// Create a dispatcher around a handler.
    pub fn new(handler: Arc<dyn SlackEventHandler>) -> Self {
        Self { handler }
    }

    /// Dispatch an Events API callback.
    ///
    /// Returns the handle of the spawned task, or `None` when the event is
    /// ignored.
    pub fn dispatch_event(&self, callback: EventCallback) -> Option<JoinHandle<()>> {
        let event = match parse_event(&callback) {
            Ok(event) => event,
            Err(e) => {
                warn!("Dropping unparseable event: {}", e);
                return None;
            }
        };
        let team_id = callback.team_id.clone();
        let handler = Arc::clone(&self.handler);

        match event {
            SlackEvent::AppMention(event) => {
                info!(
                    channel = %event.channel,
                    user = %event.user,
                    "App mention received"
                );
                let context = EventContext::from_app_mention(&event, team_id);
                Some(spawn_logged("app_mention", async move {
                    handler.handle_app_mention(event, context).await
                }))
            }
            SlackEvent::Message(event) => {
                if event.is_bot_message() {
                    return None;
                }
                let context = EventContext::from_message(&event, team_id)?;
                Some(spawn_logged("message", async move {
                    handler.handle_message(event, context).await
                }))
            }
            SlackEvent::Unknown(event_type) => {
                debug!("Ignoring event type: {}", event_type);
                None
            }
        }
    }

    /// Dispatch an interactive payload.
    pub fn dispatch_interactive(&self, payload: serde_json::Value) -> Option<JoinHandle<()>> {
        match parse_interactive(payload) {
            Ok(InteractivePayload::BlockActions(actions)) => {
                let handler = Arc::clone(&self.handler);
                Some(spawn_logged("block_actions", async move {
                    handler.handle_block_actions(actions).await
                }))
            }
            Ok(InteractivePayload::Unsupported(kind)) => {
                debug!("Ignoring interactive payload type: {}", kind);
                None
            }
            Err(e) => {
                warn!("Dropping unparseable interactive payload: {}", e);
                None
            }
        }
    }

    /// Parse and dispatch a slash command.
    ///
    /// Returns the immediate acknowledgment for Slack and, for commands with
    /// work to do, the handle of the spawned task.
    pub fn dispatch_command(
        &self,
        payload: &SlashCommandPayload,
    ) -> (SlashCommandResponse, Option<JoinHandle<()>>) {
        let command = parse_command(payload);
        let ack = create_ack_response(&command);

        info!(
            command = %payload.command,
            channel = %payload.channel_id,
            user = %payload.user_id,
            "Slash command received"
        );

        if !command.is_actionable() {
            return (ack, None);
        }

        let handler = Arc::clone(&self.handler);
        let task = spawn_logged("slash_command", async move {
            handler.handle_slash_command(command).await
        });
        (ack, Some(task))
    }
}

fn spawn_logged<F>(kind: &'static str, work: F) -> JoinHandle<()>
where
    F: std::future::Future<Output = SlackResult<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = work.await {
            error!(kind, "Handler failed: {}", e);
        }
    })
}
