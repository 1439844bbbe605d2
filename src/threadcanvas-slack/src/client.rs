//! Slack Web API client.
//!
//! [`SlackApi`] is the seam the rest of the workspace talks to; [`SlackClient`]
//! is the `reqwest` implementation. Every method performs exactly one logical
//! Web API operation and never retries.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::commands::{DelayedResponse, send_delayed_response};
use crate::config::SlackConfig;
use crate::error::{SlackApiError, SlackError, SlackResult};
use crate::messages::SlackMessageContent;
use crate::types::{
    CanvasCreateResponse, ConversationPage, FileUpload, SlackMessage, TeamInfo, TeamInfoResponse,
    UploadUrlResponse, WorkspaceIdentity,
};

/// Page size used for `conversations.replies`.
const REPLIES_PAGE_LIMIT: u32 = 200;

/// Operations the bot needs from the Slack Web API.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// All messages of a thread, root included, oldest first
    /// (`conversations.replies`, every page).
    async fn conversation_replies(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> SlackResult<Vec<SlackMessage>>;

    /// The most recent messages of a channel, newest first
    /// (`conversations.history`).
    async fn conversation_history(&self, channel: &str, limit: u32)
    -> SlackResult<Vec<SlackMessage>>;

    /// Identity of the bot and its workspace (`auth.test`).
    async fn auth_test(&self) -> SlackResult<WorkspaceIdentity>;

    /// Workspace details (`team.info`).
    async fn team_info(&self) -> SlackResult<TeamInfo>;

    /// Create a canvas from Markdown and return its ID (`canvases.create`).
    async fn create_canvas(&self, title: &str, markdown: &str) -> SlackResult<String>;

    /// Grant users write access to a canvas (`canvases.access.set`).
    async fn set_canvas_access(&self, canvas_id: &str, user_ids: &[String]) -> SlackResult<()>;

    /// Upload a text file and share it into a conversation; returns the file ID.
    async fn upload_file(&self, upload: &FileUpload) -> SlackResult<String>;

    /// Post a message and return its timestamp (`chat.postMessage`).
    async fn post_message(&self, channel: &str, content: SlackMessageContent)
    -> SlackResult<String>;

    /// Post a message only `user` can see (`chat.postEphemeral`).
    async fn post_ephemeral(
        &self,
        channel: &str,
        user: &str,
        content: SlackMessageContent,
    ) -> SlackResult<()>;

    /// Replace an existing message (`chat.update`).
    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        content: SlackMessageContent,
    ) -> SlackResult<()>;

    /// Reply through an interaction's `response_url`.
    async fn respond(&self, response_url: &str, response: &DelayedResponse) -> SlackResult<()>;
}

/// `reqwest`-backed Slack Web API client.
#[derive(Clone)]
pub struct SlackClient {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackClient {
    /// Create a client for the given configuration.
    pub fn new(config: SlackConfig) -> SlackResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SlackError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &SlackConfig {
        &self.config
    }

    /// The underlying HTTP client, shared with Socket Mode and response URLs.
    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.config.api_base_url(), method)
    }

    /// Call a write method with a JSON body.
    async fn api_call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> SlackResult<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .bearer_auth(self.config.bot_token())
            .header("Content-Type", "application/json; charset=utf-8")
            .json(payload)
            .send()
            .await?;

        Self::read_response(method, response).await
    }

    /// Call a method with a form-encoded body (read methods and uploads).
    async fn api_form<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> SlackResult<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .bearer_auth(self.config.bot_token())
            .form(params)
            .send()
            .await?;

        Self::read_response(method, response).await
    }

    async fn read_response<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> SlackResult<T> {
        if response.status() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(30);
            return Err(SlackError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Api(format!("{} returned {}: {}", method, status, body)));
        }

        let json: serde_json::Value = response.json().await?;

        if json.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let error = json
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown");
            return Err(SlackApiError::for_method(method, error).into());
        }

        debug!(method, "Slack API call succeeded");
        Ok(serde_json::from_value(json)?)
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn conversation_replies(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> SlackResult<Vec<SlackMessage>> {
        let mut messages = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params = vec![
                ("channel", channel.to_string()),
                ("ts", thread_ts.to_string()),
                ("inclusive", "true".to_string()),
                ("limit", REPLIES_PAGE_LIMIT.to_string()),
            ];
            if let Some(cursor) = cursor.take() {
                params.push(("cursor", cursor));
            }

            let page: ConversationPage = self.api_form("conversations.replies", &params).await?;
            let next = page.next_cursor().map(str::to_string);
            // Every page repeats the parent message at the top.
            messages.extend(page.messages.into_iter().filter(|m| seen.insert(m.ts.clone())));

            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(messages)
    }

    async fn conversation_history(
        &self,
        channel: &str,
        limit: u32,
    ) -> SlackResult<Vec<SlackMessage>> {
        let params = [
            ("channel", channel.to_string()),
            ("limit", limit.to_string()),
        ];
        let page: ConversationPage = self.api_form("conversations.history", &params).await?;
        Ok(page.messages)
    }

    async fn auth_test(&self) -> SlackResult<WorkspaceIdentity> {
        self.api_call("auth.test", &serde_json::json!({})).await
    }

    async fn team_info(&self) -> SlackResult<TeamInfo> {
        let response: TeamInfoResponse = self.api_form("team.info", &[]).await?;
        response
            .team
            .ok_or_else(|| SlackError::Api("team.info response missing team".to_string()))
    }

    async fn create_canvas(&self, title: &str, markdown: &str) -> SlackResult<String> {
        let payload = serde_json::json!({
            "title": title,
            "document_content": {
                "type": "markdown",
                "markdown": markdown,
            },
        });

        let response: CanvasCreateResponse = self.api_call("canvases.create", &payload).await?;
        response.canvas_id().map(str::to_string).ok_or_else(|| {
            SlackError::Api("canvases.create response missing canvas ID".to_string())
        })
    }

    async fn set_canvas_access(&self, canvas_id: &str, user_ids: &[String]) -> SlackResult<()> {
        let payload = serde_json::json!({
            "canvas_id": canvas_id,
            "access_level": "write",
            "user_ids": user_ids,
        });

        let _: serde_json::Value = self.api_call("canvases.access.set", &payload).await?;
        Ok(())
    }

    async fn upload_file(&self, upload: &FileUpload) -> SlackResult<String> {
        let params = [
            ("filename", upload.filename.clone()),
            ("length", upload.content.len().to_string()),
        ];
        let target: UploadUrlResponse = self
            .api_form("files.getUploadURLExternal", &params)
            .await?;

        let response = self
            .client
            .post(&target.upload_url)
            .header("Content-Type", "text/markdown; charset=utf-8")
            .body(upload.content.clone())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SlackError::Api(format!(
                "file upload to {} failed: {}",
                target.upload_url,
                response.status()
            )));
        }

        let files = serde_json::json!([{ "id": target.file_id, "title": upload.title }]);
        let mut params = vec![
            ("files", files.to_string()),
            ("channel_id", upload.channel.clone()),
        ];
        if let Some(thread_ts) = &upload.thread_ts {
            params.push(("thread_ts", thread_ts.clone()));
        }
        if let Some(comment) = &upload.initial_comment {
            params.push(("initial_comment", comment.clone()));
        }

        let _: serde_json::Value = self
            .api_form("files.completeUploadExternal", &params)
            .await?;

        Ok(target.file_id)
    }

    async fn post_message(
        &self,
        channel: &str,
        content: SlackMessageContent,
    ) -> SlackResult<String> {
        let mut payload = serde_json::json!({ "channel": channel });
        content.apply_to(&mut payload);

        let response: serde_json::Value = self.api_call("chat.postMessage", &payload).await?;
        response
            .get("ts")
            .and_then(|ts| ts.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| SlackError::Api("Missing ts in response".to_string()))
    }

    async fn post_ephemeral(
        &self,
        channel: &str,
        user: &str,
        content: SlackMessageContent,
    ) -> SlackResult<()> {
        let mut payload = serde_json::json!({ "channel": channel, "user": user });
        content.apply_to(&mut payload);

        let _: serde_json::Value = self.api_call("chat.postEphemeral", &payload).await?;
        Ok(())
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        content: SlackMessageContent,
    ) -> SlackResult<()> {
        let mut payload = serde_json::json!({ "channel": channel, "ts": ts });
        content.apply_to(&mut payload);

        let _: serde_json::Value = self.api_call("chat.update", &payload).await?;
        Ok(())
    }

    async fn respond(&self, response_url: &str, response: &DelayedResponse) -> SlackResult<()> {
        send_delayed_response(&self.client, response_url, response).await
    }
}
