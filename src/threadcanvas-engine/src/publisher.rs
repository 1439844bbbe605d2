//! Canvas publishing with a Markdown file fallback.
//!
//! `create → share → notify` when the Canvas API works, otherwise a single
//! file upload whose initial comment doubles as the notification.

use threadcanvas_slack::{FileUpload, SlackApi, SlackMessageContent, SlackResult, ThreadRef};
use tracing::{info, warn};

use crate::error::{CanvasError, Result};
use crate::link::canvas_url;
use crate::types::{PublishResult, SummaryResult};

/// Access level granted to the requesting user.
pub const SHARE_ACCESS_LEVEL: &str = "write";

/// Publish a summary for `user_id` into `thread`.
pub async fn publish(
    slack: &dyn SlackApi,
    thread: &ThreadRef,
    user_id: &str,
    summary: &SummaryResult,
) -> Result<PublishResult> {
    let canvas_id = match slack.create_canvas(&summary.title, &summary.body).await {
        Ok(id) => id,
        Err(e) => {
            warn!("Canvas creation failed, falling back to file upload: {}", e);
            let file_id = upload_fallback(slack, thread, user_id, summary).await?;
            info!(file_id = %file_id, "Uploaded summary as Markdown file");
            return Ok(PublishResult::file(file_id));
        }
    };
    info!(canvas_id = %canvas_id, title = %summary.title, "Created canvas");

    share_canvas(slack, &canvas_id, user_id).await;
    notify(slack, thread, user_id, &canvas_id)
        .await
        .map_err(|source| CanvasError::Notify {
            canvas_id: canvas_id.clone(),
            source,
        })?;

    Ok(PublishResult::canvas(canvas_id))
}

/// Grant the user write access to the canvas.
///
/// Errors are logged and discarded.
pub async fn share_canvas(slack: &dyn SlackApi, canvas_id: &str, user_id: &str) {
    match slack
        .set_canvas_access(canvas_id, &[user_id.to_string()])
        .await
    {
        Ok(()) => info!(
            canvas_id,
            user_id,
            access = SHARE_ACCESS_LEVEL,
            "Shared canvas"
        ),
        Err(e) => warn!("Canvas sharing failed, but the canvas was created: {}", e),
    }
}

/// Text of the message announcing a new canvas.
///
/// Links to the canvas when both the workspace URL and team ID are known;
/// otherwise names the raw ID.
pub fn canvas_link_message(
    user_id: &str,
    canvas_id: &str,
    workspace_url: Option<&str>,
    team_id: Option<&str>,
) -> String {
    match (workspace_url, team_id) {
        (Some(url), Some(team)) => format!(
            "<@{}> ✅ Created a canvas summarizing this thread!\n\n{}",
            user_id,
            canvas_url(url, team, canvas_id)
        ),
        _ => format!(
            "<@{}> ✅ Created a canvas summarizing this thread!\n\nCanvas ID: `{}`\nSearch for it in Slack to open it.",
            user_id, canvas_id
        ),
    }
}

/// Post the canvas link into the thread.
pub async fn notify(
    slack: &dyn SlackApi,
    thread: &ThreadRef,
    user_id: &str,
    canvas_id: &str,
) -> SlackResult<()> {
    let identity = match slack.auth_test().await {
        Ok(identity) => Some(identity),
        Err(e) => {
            warn!("Could not get workspace info for the canvas link: {}", e);
            None
        }
    };
    let workspace_url = identity.as_ref().and_then(|i| i.workspace_url());
    let team_id = identity.as_ref().and_then(|i| i.team_id.as_deref());

    let text = canvas_link_message(user_id, canvas_id, workspace_url, team_id);
    slack
        .post_message(
            &thread.channel,
            SlackMessageContent::new()
                .with_text(text)
                .in_thread(&thread.thread_ts),
        )
        .await?;
    info!(user_id, canvas_id, "Sent canvas link");
    Ok(())
}

/// File uploaded when the Canvas API is unavailable.
pub fn fallback_upload(thread: &ThreadRef, user_id: &str, summary: &SummaryResult) -> FileUpload {
    FileUpload {
        channel: thread.channel.clone(),
        thread_ts: Some(thread.thread_ts.clone()),
        filename: format!("{}.md", summary.title),
        title: summary.title.clone(),
        content: format!("# {}\n\n{}", summary.title, summary.body),
        initial_comment: Some(format!(
            "<@{}> The Canvas API was unavailable, so the summary was uploaded as a Markdown file.",
            user_id
        )),
    }
}

async fn upload_fallback(
    slack: &dyn SlackApi,
    thread: &ThreadRef,
    user_id: &str,
    summary: &SummaryResult,
) -> Result<String> {
    slack
        .upload_file(&fallback_upload(thread, user_id, summary))
        .await
        .map_err(|e| CanvasError::Publish(format!("fallback file upload failed: {}", e)))
}
