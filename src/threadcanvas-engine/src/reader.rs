//! Thread retrieval.

use threadcanvas_slack::{SlackApi, ThreadRef};
use tracing::{debug, info};

use crate::error::{CanvasError, Result};
use crate::types::ThreadMessage;

/// Read every human-authored text message of a thread, oldest first.
///
/// Fails with [`CanvasError::NoContent`] when nothing qualifies.
pub async fn read_thread(slack: &dyn SlackApi, thread: &ThreadRef) -> Result<Vec<ThreadMessage>> {
    let raw = slack
        .conversation_replies(&thread.channel, &thread.thread_ts)
        .await?;
    let total = raw.len();

    let messages: Vec<ThreadMessage> = raw.iter().filter_map(ThreadMessage::from_slack).collect();
    debug!(total, kept = messages.len(), "Filtered thread messages");

    if messages.is_empty() {
        return Err(CanvasError::NoContent);
    }

    info!(
        channel = %thread.channel,
        thread_ts = %thread.thread_ts,
        count = messages.len(),
        "Read thread"
    );
    Ok(messages)
}
