//! Thread summarization through a chat completion model.
//!
//! The model is asked for a `TITLE:` line followed by a Markdown document
//! with fixed sections. The response is cleaned of a surrounding code fence
//! and split into a [`SummaryResult`].

use threadcanvas_openai::{ChatMessage, ChatRequest, CompletionClient};
use tracing::{debug, info};

use crate::error::{CanvasError, Result};
use crate::types::{SummaryResult, ThreadMessage};

/// System prompt for thread summaries.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an assistant that organizes the content of Slack threads into Markdown documents for Slack Canvas. Summarize the conversation accurately and generate a clear, descriptive title.";

/// Title used when the model does not provide one.
pub const DEFAULT_TITLE: &str = "Thread Summary";

/// Prefix of the title line in the model output.
pub const TITLE_MARKER: &str = "TITLE:";

const SUMMARY_TEMPERATURE: f32 = 0.3;
const SUMMARY_MAX_TOKENS: u32 = 2000;

/// Format messages as `[author]: text`, one per line.
pub fn format_messages(messages: &[ThreadMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("[{}]: {}", m.author, m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the user prompt for a thread.
pub fn build_prompt(messages: &[ThreadMessage], thread_link: &str) -> String {
    format!(
        r#"Below is a conversation from a Slack thread. Read it, organize the main topics and points, and write them up as a Canvas document.

Conversation:
{conversation}

Output format:

First, output a single-line title that fits the conversation. The title line must start with "TITLE:".

Then organize the content into these sections:
1. Overview of the discussion
2. Key points
3. Decisions (if any)
4. Action items (if any)
5. Next steps (measures or improvements the conversation suggests will be needed)
6. References and links (if any)

Finally, include a link to the original thread.

Example output:
TITLE: Project A progress check and next steps

# Overview
[overview here]

# Key Points
- Point 1
- Point 2

# Decisions
- Decision 1
- Decision 2

# Action Items
- [ ] Task 1
- [ ] Task 2

# Next Steps
- Step 1
- Step 2

# References
- Link 1
- Link 2

---
**Original thread**: [Open in Slack]({thread_link})

Output Markdown directly. Do not wrap it in a code block (```)."#,
        conversation = format_messages(messages),
        thread_link = thread_link,
    )
}

/// Build the completion request for a thread.
pub fn build_request(model: &str, messages: &[ThreadMessage], thread_link: &str) -> ChatRequest {
    ChatRequest::new(
        model,
        vec![
            ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
            ChatMessage::user(build_prompt(messages, thread_link)),
        ],
    )
    .with_temperature(SUMMARY_TEMPERATURE)
    .with_max_tokens(SUMMARY_MAX_TOKENS)
}

/// Strip a code fence wrapping the whole response.
///
/// Overlapping fences (a response that is only a fence) leave nothing.
pub fn clean_markdown_response(response: &str) -> &str {
    let trimmed = response.trim();
    for opening in ["```markdown", "```"] {
        if trimmed.starts_with(opening) && trimmed.ends_with("```") {
            return trimmed
                .get(opening.len()..trimmed.len() - 3)
                .unwrap_or_default()
                .trim();
        }
    }
    trimmed
}

/// Split a cleaned response into title and body.
///
/// The first line starting with [`TITLE_MARKER`] is the title; every other
/// line forms the body.
pub fn extract_title_and_content(response: &str) -> SummaryResult {
    let mut title = None;
    let mut body = Vec::new();

    for line in response.split('\n') {
        if title.is_none()
            && let Some(rest) = line.strip_prefix(TITLE_MARKER)
        {
            title = Some(rest.trim());
            continue;
        }
        body.push(line);
    }

    SummaryResult {
        title: title
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string(),
        body: body.join("\n").trim().to_string(),
    }
}

/// Summarize a thread with one model call.
pub async fn summarize(
    client: &dyn CompletionClient,
    messages: &[ThreadMessage],
    thread_link: &str,
) -> Result<SummaryResult> {
    let request = build_request(client.model(), messages, thread_link);
    debug!(model = %request.model, messages = messages.len(), "Requesting summary");

    let response = client.chat_completion(&request).await?;
    if response.choices.is_empty() {
        return Err(CanvasError::Summarization(
            "model returned no choices".to_string(),
        ));
    }
    let content = response
        .content()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CanvasError::Summarization("model returned empty content".to_string()))?;

    let summary = extract_title_and_content(clean_markdown_response(content));
    info!(title = %summary.title, "Generated thread summary");
    Ok(summary)
}
