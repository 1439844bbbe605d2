//! Thread-to-canvas pipeline for threadcanvas.
//!
//! Given a Slack thread, the engine:
//! 1. Reads its human-authored messages ([`reader`])
//! 2. Builds a permalink to it ([`link`])
//! 3. Summarizes it with a completion model ([`summarizer`])
//! 4. Publishes a canvas, or a Markdown file when the Canvas API fails ([`publisher`])
//!
//! [`CanvasOrchestrator`] sequences these steps and reports failures back
//! into the thread. [`CanvasBot`] wires it to Slack events and commands.

pub mod error;
pub mod handler;
pub mod link;
pub mod orchestrator;
pub mod publisher;
pub mod reader;
pub mod summarizer;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::{CanvasError, Result};
pub use handler::{CanvasBot, ConfirmationValue, ConfirmationValueError};
pub use orchestrator::CanvasOrchestrator;
pub use types::{ArtifactKind, CanvasRequest, PublishResult, SummaryResult, ThreadMessage};
