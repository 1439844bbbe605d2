//! `threadcanvas create`.

use anyhow::bail;
use threadcanvas_engine::{CanvasRequest, PublishResult};
use threadcanvas_slack::{ThreadRef, normalize_thread_ref};

use crate::cli::CreateArgs;
use crate::config::AppConfig;
use crate::serve_cmd::build_orchestrator;

/// Resolve the thread named on the command line.
pub fn resolve_thread(args: &CreateArgs) -> anyhow::Result<ThreadRef> {
    let channel = args.channel.as_deref().unwrap_or_default();
    let thread = normalize_thread_ref(&args.thread, channel)?;
    if thread.channel.is_empty() {
        bail!("--channel is required unless the thread is given as a URL");
    }
    Ok(thread)
}

/// Summarize one thread into a canvas.
pub async fn run_create(config: AppConfig, args: &CreateArgs) -> anyhow::Result<PublishResult> {
    let thread = resolve_thread(args)?;
    let orchestrator = build_orchestrator(&config)?;
    let request = CanvasRequest::new(thread, &args.user).with_title(args.title.clone());
    Ok(orchestrator.create_canvas(&request).await?)
}
