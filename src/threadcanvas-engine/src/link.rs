//! Permalinks to threads and canvases.

use threadcanvas_slack::SlackApi;
use threadcanvas_slack::ThreadRef;
use threadcanvas_slack::thread_ref::compact_timestamp;
use tracing::{debug, warn};

/// Root used when the workspace URL cannot be determined.
pub const FALLBACK_WORKSPACE_URL: &str = "https://slack.com";

/// Link to a thread under the given workspace root.
pub fn thread_link(workspace_url: &str, thread: &ThreadRef) -> String {
    format!(
        "{}/archives/{}/{}",
        workspace_url.trim_end_matches('/'),
        thread.channel,
        compact_timestamp(&thread.thread_ts)
    )
}

/// Deep link to a canvas.
pub fn canvas_url(workspace_url: &str, team_id: &str, canvas_id: &str) -> String {
    format!(
        "{}/docs/{}/{}",
        workspace_url.trim_end_matches('/'),
        team_id,
        canvas_id
    )
}

/// Resolve the workspace root URL.
///
/// Tries `auth.test`, then `team.info`, then falls back to
/// [`FALLBACK_WORKSPACE_URL`]. Never fails.
pub async fn workspace_root(slack: &dyn SlackApi) -> String {
    match slack.auth_test().await {
        Ok(identity) => {
            if let Some(url) = identity.workspace_url() {
                return url.to_string();
            }
            debug!("auth.test returned no workspace URL");
        }
        Err(e) => warn!("Could not read workspace URL from auth.test: {}", e),
    }

    match slack.team_info().await {
        Ok(team) => {
            if let Some(domain) = team.domain.as_deref().filter(|d| !d.is_empty()) {
                return format!("https://{}.slack.com", domain);
            }
        }
        Err(e) => warn!("Could not read workspace domain from team.info: {}", e),
    }

    FALLBACK_WORKSPACE_URL.to_string()
}

/// Build the user-facing link to a thread. Never fails.
pub async fn build_thread_link(slack: &dyn SlackApi, thread: &ThreadRef) -> String {
    let root = workspace_root(slack).await;
    thread_link(&root, thread)
}
