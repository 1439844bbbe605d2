//! In-memory fakes of the Slack and completion APIs.

use std::sync::Mutex;

use async_trait::async_trait;
use threadcanvas_openai::{ChatRequest, ChatResponse, CompletionClient, OpenAiError};
use threadcanvas_slack::{
    DelayedResponse, FileUpload, SlackApi, SlackApiError, SlackError, SlackMessage,
    SlackMessageContent, SlackResult, TeamInfo, WorkspaceIdentity,
};

pub(crate) const CANVAS_ID: &str = "F0CANVAS";
pub(crate) const FILE_ID: &str = "F0FILE";

/// One recorded Slack call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SlackCall {
    Replies { channel: String, thread_ts: String },
    History { channel: String },
    AuthTest,
    TeamInfo,
    CreateCanvas { title: String, markdown: String },
    SetAccess { canvas_id: String, users: Vec<String> },
    Upload(FileUpload),
    Post { channel: String, content: SlackMessageContent },
    Ephemeral { channel: String, user: String, content: SlackMessageContent },
    Update { channel: String, ts: String },
    Respond { url: String, text: Option<String>, replace_original: bool },
}

/// Scripted [`SlackApi`]. `identity`/`team` of `None` make the call fail.
#[derive(Default)]
pub(crate) struct FakeSlack {
    pub replies: Vec<SlackMessage>,
    pub history: Vec<SlackMessage>,
    pub identity: Option<WorkspaceIdentity>,
    pub team: Option<TeamInfo>,
    pub fail_replies: bool,
    pub fail_create: bool,
    pub fail_share: bool,
    pub fail_upload: bool,
    pub fail_post: bool,
    pub calls: Mutex<Vec<SlackCall>>,
}

fn api_error(method: &str) -> SlackError {
    SlackApiError::for_method(method, "not_allowed").into()
}

impl FakeSlack {
    pub(crate) fn calls(&self) -> Vec<SlackCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: SlackCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub(crate) fn posts(&self) -> Vec<(String, SlackMessageContent)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SlackCall::Post { channel, content } => Some((channel, content)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn ephemerals(&self) -> Vec<(String, String, SlackMessageContent)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SlackCall::Ephemeral {
                    channel,
                    user,
                    content,
                } => Some((channel, user, content)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, matches: impl Fn(&SlackCall) -> bool) -> usize {
        self.calls().iter().filter(|c| matches(c)).count()
    }
}

#[async_trait]
impl SlackApi for FakeSlack {
    async fn conversation_replies(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> SlackResult<Vec<SlackMessage>> {
        self.record(SlackCall::Replies {
            channel: channel.to_string(),
            thread_ts: thread_ts.to_string(),
        });
        if self.fail_replies {
            return Err(api_error("conversations.replies"));
        }
        Ok(self.replies.clone())
    }

    async fn conversation_history(
        &self,
        channel: &str,
        _limit: u32,
    ) -> SlackResult<Vec<SlackMessage>> {
        self.record(SlackCall::History {
            channel: channel.to_string(),
        });
        Ok(self.history.clone())
    }

    async fn auth_test(&self) -> SlackResult<WorkspaceIdentity> {
        self.record(SlackCall::AuthTest);
        self.identity
            .clone()
            .ok_or_else(|| api_error("auth.test"))
    }

    async fn team_info(&self) -> SlackResult<TeamInfo> {
        self.record(SlackCall::TeamInfo);
        self.team.clone().ok_or_else(|| api_error("team.info"))
    }

    async fn create_canvas(&self, title: &str, markdown: &str) -> SlackResult<String> {
        self.record(SlackCall::CreateCanvas {
            title: title.to_string(),
            markdown: markdown.to_string(),
        });
        if self.fail_create {
            return Err(api_error("canvases.create"));
        }
        Ok(CANVAS_ID.to_string())
    }

    async fn set_canvas_access(&self, canvas_id: &str, user_ids: &[String]) -> SlackResult<()> {
        self.record(SlackCall::SetAccess {
            canvas_id: canvas_id.to_string(),
            users: user_ids.to_vec(),
        });
        if self.fail_share {
            return Err(api_error("canvases.access.set"));
        }
        Ok(())
    }

    async fn upload_file(&self, upload: &FileUpload) -> SlackResult<String> {
        self.record(SlackCall::Upload(upload.clone()));
        if self.fail_upload {
            return Err(api_error("files.completeUploadExternal"));
        }
        Ok(FILE_ID.to_string())
    }

    async fn post_message(
        &self,
        channel: &str,
        content: SlackMessageContent,
    ) -> SlackResult<String> {
        self.record(SlackCall::Post {
            channel: channel.to_string(),
            content,
        });
        if self.fail_post {
            return Err(api_error("chat.postMessage"));
        }
        Ok("9.000001".to_string())
    }

    async fn post_ephemeral(
        &self,
        channel: &str,
        user: &str,
        content: SlackMessageContent,
    ) -> SlackResult<()> {
        self.record(SlackCall::Ephemeral {
            channel: channel.to_string(),
            user: user.to_string(),
            content,
        });
        Ok(())
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        _content: SlackMessageContent,
    ) -> SlackResult<()> {
        self.record(SlackCall::Update {
            channel: channel.to_string(),
            ts: ts.to_string(),
        });
        Ok(())
    }

    async fn respond(&self, response_url: &str, response: &DelayedResponse) -> SlackResult<()> {
        self.record(SlackCall::Respond {
            url: response_url.to_string(),
            text: response.text.clone(),
            replace_original: response.replace_original.unwrap_or(false),
        });
        Ok(())
    }
}

/// What the fake model answers with.
enum Reply {
    Content(String),
    NoChoices,
    Failure,
}

/// Scripted [`CompletionClient`] that records every request.
pub(crate) struct FakeCompletion {
    reply: Reply,
    requests: Mutex<Vec<ChatRequest>>,
}

impl FakeCompletion {
    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying(content: &str) -> Self {
        Self::with_reply(Reply::Content(content.to_string()))
    }

    pub(crate) fn without_choices() -> Self {
        Self::with_reply(Reply::NoChoices)
    }

    pub(crate) fn failing() -> Self {
        Self::with_reply(Reply::Failure)
    }

    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    fn model(&self) -> &str {
        "test-model"
    }

    async fn chat_completion(&self, request: &ChatRequest) -> threadcanvas_openai::Result<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Reply::Content(content) => Ok(ChatResponse::from_content(content.clone())),
            Reply::NoChoices => {
                let mut response = ChatResponse::from_content("");
                response.choices.clear();
                Ok(response)
            }
            Reply::Failure => Err(OpenAiError::ServerError("model overloaded".to_string())),
        }
    }
}

pub(crate) fn message(user: &str, text: &str, ts: &str) -> SlackMessage {
    SlackMessage {
        user: Some(user.to_string()),
        text: Some(text.to_string()),
        ts: ts.to_string(),
        ..Default::default()
    }
}

pub(crate) fn bot_message(text: &str, ts: &str) -> SlackMessage {
    SlackMessage {
        bot_id: Some("B1".to_string()),
        text: Some(text.to_string()),
        ts: ts.to_string(),
        ..Default::default()
    }
}

pub(crate) fn identity(url: Option<&str>, team_id: Option<&str>) -> WorkspaceIdentity {
    WorkspaceIdentity {
        url: url.map(String::from),
        team_id: team_id.map(String::from),
        ..Default::default()
    }
}
