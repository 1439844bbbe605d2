//! Thread-to-canvas pipeline.
//!
//! Read → link → summarize → publish, in strict order. Any failure is
//! reported into the originating thread before it is returned.

use std::sync::Arc;

use threadcanvas_openai::CompletionClient;
use threadcanvas_slack::{SlackApi, SlackMessageContent};
use tracing::{error, info, warn};

use crate::error::{CanvasError, Result};
use crate::link::build_thread_link;
use crate::publisher::publish;
use crate::reader::read_thread;
use crate::summarizer::summarize;
use crate::types::{CanvasRequest, PublishResult};

/// Runs the canvas pipeline against Slack and a completion model.
#[derive(Clone)]
pub struct CanvasOrchestrator {
    slack: Arc<dyn SlackApi>,
    completion: Arc<dyn CompletionClient>,
}

impl CanvasOrchestrator {
    pub fn new(slack: Arc<dyn SlackApi>, completion: Arc<dyn CompletionClient>) -> Self {
        Self { slack, completion }
    }

    /// The Slack API the pipeline publishes through.
    pub fn slack(&self) -> &Arc<dyn SlackApi> {
        &self.slack
    }

    /// Summarize the requested thread into a canvas.
    ///
    /// On failure an error notice is posted into the thread (best-effort)
    /// and the error is returned.
    pub async fn create_canvas(&self, request: &CanvasRequest) -> Result<PublishResult> {
        match self.run(request).await {
            Ok(result) => {
                info!(
                    kind = %result.kind,
                    id = %result.id,
                    channel = %request.thread.channel,
                    "Published thread summary"
                );
                Ok(result)
            }
            Err(e) => {
                error!(
                    channel = %request.thread.channel,
                    thread_ts = %request.thread.thread_ts,
                    "Error creating canvas from thread: {}",
                    e
                );
                self.report_error(request, &e).await;
                Err(e)
            }
        }
    }

    async fn run(&self, request: &CanvasRequest) -> Result<PublishResult> {
        let slack = self.slack.as_ref();
        let thread = &request.thread;

        info!(thread_ts = %thread.thread_ts, "Getting thread messages");
        let messages = read_thread(slack, thread).await?;

        let link = build_thread_link(slack, thread).await;

        info!(messages = messages.len(), "Summarizing thread content");
        let mut summary = summarize(self.completion.as_ref(), &messages, &link).await?;
        if let Some(title) = request.title_override() {
            summary.title = title.to_string();
        }

        info!(title = %summary.title, "Publishing canvas");
        publish(slack, thread, &request.user_id, &summary).await
    }

    /// Post the error into the thread.
    ///
    /// Errors are logged and discarded.
    async fn report_error(&self, request: &CanvasRequest, err: &CanvasError) {
        let content = SlackMessageContent::new()
            .with_text(error_notice(&request.user_id, err))
            .in_thread(&request.thread.thread_ts);
        if let Err(e) = self
            .slack
            .post_message(&request.thread.channel, content)
            .await
        {
            warn!("Could not post error notice: {}", e);
        }
    }
}

/// Message posted into a thread when the pipeline fails.
pub fn error_notice(user_id: &str, err: &CanvasError) -> String {
    match err {
        CanvasError::Notify { canvas_id, source } => format!(
            "<@{}> The canvas was created (ID: `{}`), but its link could not be posted: {}",
            user_id, canvas_id, source
        ),
        _ => format!(
            "<@{}> An error occurred while creating the canvas: {}",
            user_id, err
        ),
    }
}
