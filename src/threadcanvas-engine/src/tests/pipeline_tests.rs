//! Tests for the orchestrated thread-to-canvas pipeline.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use threadcanvas_slack::ThreadRef;

use super::support::{
    CANVAS_ID, FILE_ID, FakeCompletion, FakeSlack, SlackCall, bot_message, identity, message,
};
use crate::error::CanvasError;
use crate::orchestrator::CanvasOrchestrator;
use crate::types::{CanvasRequest, PublishResult};

const MODEL_REPLY: &str = "TITLE: Ship v2 on Friday\n# Overview\nShip it";

fn shipping_thread() -> FakeSlack {
    FakeSlack {
        replies: vec![
            message("U1", "We should ship v2", "1700000000.000100"),
            bot_message("Reminder: standup", "1700000000.000150"),
            message("U2", "Agreed, Friday", "1700000000.000200"),
        ],
        identity: Some(identity(Some("https://acme.slack.com/"), Some("T1"))),
        ..Default::default()
    }
}

fn orchestrator(
    slack: FakeSlack,
    completion: FakeCompletion,
) -> (Arc<FakeSlack>, Arc<FakeCompletion>, CanvasOrchestrator) {
    let slack = Arc::new(slack);
    let completion = Arc::new(completion);
    let orchestrator = CanvasOrchestrator::new(slack.clone(), completion.clone());
    (slack, completion, orchestrator)
}

fn request() -> CanvasRequest {
    CanvasRequest::new(ThreadRef::new("C1", "1700000000.000100"), "U1")
}

#[tokio::test]
async fn test_end_to_end_creates_shares_and_links() {
    let (slack, completion, orchestrator) =
        orchestrator(shipping_thread(), FakeCompletion::replying(MODEL_REPLY));

    let result = orchestrator.create_canvas(&request()).await.unwrap();
    assert_eq!(result, PublishResult::canvas(CANVAS_ID));

    let requests = completion.requests();
    assert_eq!(requests.len(), 1);
    let prompt = requests[0].message_content("user").unwrap();
    assert!(prompt.contains("[U1]: We should ship v2"));
    assert!(prompt.contains("[U2]: Agreed, Friday"));
    assert!(!prompt.contains("Reminder: standup"));
    assert!(prompt.contains("https://acme.slack.com/archives/C1/p1700000000000100"));

    let calls = slack.calls();
    assert!(calls.contains(&SlackCall::CreateCanvas {
        title: "Ship v2 on Friday".to_string(),
        markdown: "# Overview\nShip it".to_string(),
    }));
    assert!(calls.contains(&SlackCall::SetAccess {
        canvas_id: CANVAS_ID.to_string(),
        users: vec!["U1".to_string()],
    }));

    let posts = slack.posts();
    assert_eq!(posts.len(), 1);
    let (channel, content) = &posts[0];
    assert_eq!(channel, "C1");
    assert_eq!(content.thread_ts.as_deref(), Some("1700000000.000100"));
    let text = content.text.as_deref().unwrap();
    assert!(text.starts_with("<@U1>"));
    assert!(text.contains("https://acme.slack.com/docs/T1/F0CANVAS"));
}

#[tokio::test]
async fn test_override_title_wins() {
    let (slack, _, orchestrator) =
        orchestrator(shipping_thread(), FakeCompletion::replying(MODEL_REPLY));

    let request = request().with_title(Some("  Release plan ".to_string()));
    orchestrator.create_canvas(&request).await.unwrap();

    assert_eq!(
        slack.count(|c| matches!(c, SlackCall::CreateCanvas { title, .. } if title == "Release plan")),
        1
    );
}

#[tokio::test]
async fn test_create_failure_uploads_markdown_file() {
    let slack = FakeSlack {
        fail_create: true,
        ..shipping_thread()
    };
    let (slack, _, orchestrator) = orchestrator(slack, FakeCompletion::replying(MODEL_REPLY));

    let result = orchestrator.create_canvas(&request()).await.unwrap();
    assert_eq!(result, PublishResult::file(FILE_ID));

    let uploads: Vec<_> = slack
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            SlackCall::Upload(upload) => Some(upload),
            _ => None,
        })
        .collect();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].filename, "Ship v2 on Friday.md");
    assert_eq!(uploads[0].content, "# Ship v2 on Friday\n\n# Overview\nShip it");
    assert_eq!(uploads[0].channel, "C1");

    assert_eq!(slack.count(|c| matches!(c, SlackCall::SetAccess { .. })), 0);
    assert!(slack.posts().is_empty());
}

#[tokio::test]
async fn test_fallback_failure_is_publish_error_without_link() {
    let slack = FakeSlack {
        fail_create: true,
        fail_upload: true,
        ..shipping_thread()
    };
    let (slack, _, orchestrator) = orchestrator(slack, FakeCompletion::replying(MODEL_REPLY));

    let err = orchestrator.create_canvas(&request()).await.unwrap_err();
    assert!(matches!(err, CanvasError::Publish(_)));
    assert_eq!(slack.count(|c| matches!(c, SlackCall::Upload(_))), 1);

    let posts = slack.posts();
    assert_eq!(posts.len(), 1);
    let text = posts[0].1.text.as_deref().unwrap();
    assert!(text.starts_with("<@U1> An error occurred while creating the canvas:"));
    assert!(!text.contains("docs/"));
}

#[tokio::test]
async fn test_share_failure_still_notifies() {
    let slack = FakeSlack {
        fail_share: true,
        ..shipping_thread()
    };
    let (slack, _, orchestrator) = orchestrator(slack, FakeCompletion::replying(MODEL_REPLY));

    let result = orchestrator.create_canvas(&request()).await.unwrap();
    assert_eq!(result, PublishResult::canvas(CANVAS_ID));

    let posts = slack.posts();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].1.text.as_deref().unwrap().contains("F0CANVAS"));
}

#[tokio::test]
async fn test_notify_without_workspace_names_canvas_id() {
    let slack = FakeSlack {
        identity: None,
        ..shipping_thread()
    };
    let (slack, _, orchestrator) = orchestrator(slack, FakeCompletion::replying(MODEL_REPLY));

    orchestrator.create_canvas(&request()).await.unwrap();

    let posts = slack.posts();
    let text = posts[0].1.text.as_deref().unwrap();
    assert!(text.contains("Canvas ID: `F0CANVAS`"));
}

#[tokio::test]
async fn test_empty_thread_skips_model_and_reports() {
    let slack = FakeSlack {
        replies: vec![bot_message("beep", "1.0")],
        ..Default::default()
    };
    let (slack, completion, orchestrator) =
        orchestrator(slack, FakeCompletion::replying(MODEL_REPLY));

    let err = orchestrator.create_canvas(&request()).await.unwrap_err();
    assert!(matches!(err, CanvasError::NoContent));
    assert!(completion.requests().is_empty());

    let posts = slack.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(
        posts[0].1.text.as_deref(),
        Some("<@U1> An error occurred while creating the canvas: No messages found in the thread")
    );
    assert_eq!(posts[0].1.thread_ts.as_deref(), Some("1700000000.000100"));
}

#[tokio::test]
async fn test_summarization_failure_stops_before_publish() {
    let (slack, _, orchestrator) = orchestrator(shipping_thread(), FakeCompletion::failing());

    let err = orchestrator.create_canvas(&request()).await.unwrap_err();
    assert!(matches!(err, CanvasError::Summarization(_)));
    assert_eq!(slack.count(|c| matches!(c, SlackCall::CreateCanvas { .. })), 0);
}

#[tokio::test]
async fn test_error_notice_failure_is_swallowed() {
    let slack = FakeSlack {
        fail_replies: true,
        fail_post: true,
        ..Default::default()
    };
    let (slack, _, orchestrator) = orchestrator(slack, FakeCompletion::replying(MODEL_REPLY));

    let err = orchestrator.create_canvas(&request()).await.unwrap_err();
    assert!(matches!(err, CanvasError::Upstream(_)));
    assert_eq!(slack.posts().len(), 1);
}

#[tokio::test]
async fn test_notify_failure_keeps_canvas_id() {
    let slack = FakeSlack {
        fail_post: true,
        ..shipping_thread()
    };
    let (slack, _, orchestrator) = orchestrator(slack, FakeCompletion::replying(MODEL_REPLY));

    let err = orchestrator.create_canvas(&request()).await.unwrap_err();
    assert!(matches!(&err, CanvasError::Notify { canvas_id, .. } if canvas_id == CANVAS_ID));

    let posts = slack.posts();
    assert_eq!(posts.len(), 2);
    let notice = posts[1].1.text.as_deref().unwrap();
    assert!(notice.starts_with("<@U1> The canvas was created (ID: `F0CANVAS`)"));
    assert!(!notice.contains("An error occurred"));
}
