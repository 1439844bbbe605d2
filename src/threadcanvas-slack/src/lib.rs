//! Slack integration for threadcanvas.
//!
//! This crate provides everything the bot needs from Slack:
//! - A typed Web API client behind the [`SlackApi`] trait
//! - Socket Mode and HTTP Events API transports
//! - Event, interactive and slash command payloads
//! - Thread reference parsing for slash command text
//! - Block Kit message building
//!
//! # Architecture
//!
//! Transports ([`SocketModeClient`], [`http::events_router`]) acknowledge
//! Slack and hand payloads to a [`SlackDispatcher`], which runs the
//! application's [`SlackEventHandler`] on a separate task per event.
//!
//! # Configuration
//!
//! Required environment variables:
//! - `SLACK_BOT_TOKEN` - Bot OAuth token (xoxb-...)
//! - `SLACK_SIGNING_SECRET` - Signing secret for request verification
//!
//! Optional:
//! - `SLACK_APP_TOKEN` - App-level token for Socket Mode (xapp-...)
//! - `SLACK_API_URL` - Web API base URL (defaults to `https://slack.com/api`)

pub mod client;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod http;
pub mod interactive;
pub mod messages;
pub mod socket;
pub mod thread_ref;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::{SlackApi, SlackClient};
pub use commands::{CommandContext, DelayedResponse, ParsedCommand};
pub use config::SlackConfig;
pub use dispatch::SlackDispatcher;
pub use error::{SlackApiError, SlackError, SlackResult};
pub use events::{AppMentionEvent, EventContext, SlackEvent, SlackEventHandler};
pub use interactive::BlockActionsPayload;
pub use messages::{SlackMessageBuilder, SlackMessageContent};
pub use socket::SocketModeClient;
pub use thread_ref::{ThreadRef, ThreadRefParseError, normalize_thread_ref};
pub use types::{FileUpload, SlackMessage, TeamInfo, WorkspaceIdentity};
