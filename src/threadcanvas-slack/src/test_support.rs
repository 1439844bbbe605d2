//! Shared fakes for transport tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::commands::ParsedCommand;
use crate::dispatch::SlackDispatcher;
use crate::error::{SlackError, SlackResult};
use crate::events::{AppMentionEvent, EventContext, MessageEvent, SlackEventHandler};
use crate::interactive::BlockActionsPayload;

/// Records one line per handler call.
#[derive(Default)]
pub(crate) struct RecordingHandler {
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingHandler {
    /// A handler whose every method records the call and then errors.
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Wait briefly for spawned handler tasks to finish.
    pub(crate) async fn settle(&self) {
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    fn record(&self, call: String) -> SlackResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            Err(SlackError::Internal("boom".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl SlackEventHandler for RecordingHandler {
    async fn handle_app_mention(
        &self,
        event: AppMentionEvent,
        context: EventContext,
    ) -> SlackResult<()> {
        self.record(format!("mention:{}:{}", event.channel, context.reply_ts()))
    }

    async fn handle_message(&self, event: MessageEvent, _context: EventContext) -> SlackResult<()> {
        self.record(format!("message:{}", event.text))
    }

    async fn handle_block_actions(&self, payload: BlockActionsPayload) -> SlackResult<()> {
        let action = payload.first_action().map(|a| a.action_id.clone());
        self.record(format!("action:{}", action.unwrap_or_default()))
    }

    async fn handle_slash_command(&self, command: ParsedCommand) -> SlackResult<()> {
        self.record(format!("command:{}", command.context().channel_id))
    }
}

pub(crate) fn recording_dispatcher() -> (Arc<RecordingHandler>, SlackDispatcher) {
    let handler = Arc::new(RecordingHandler::default());
    (handler.clone(), SlackDispatcher::new(handler))
}
