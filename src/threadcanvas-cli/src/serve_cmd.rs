//! `threadcanvas serve`.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use threadcanvas_engine::{CanvasBot, CanvasOrchestrator};
use threadcanvas_openai::{CompletionClient, OpenAiClient};
use threadcanvas_slack::http::{EventsState, serve_events};
use threadcanvas_slack::{SlackApi, SlackClient, SlackDispatcher, SocketModeClient};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::{AppConfig, TransportMode};

/// Build the orchestrator from the configured clients.
pub fn build_orchestrator(config: &AppConfig) -> anyhow::Result<CanvasOrchestrator> {
    let slack: Arc<dyn SlackApi> =
        Arc::new(SlackClient::new(config.slack.clone()).context("Failed to create Slack client")?);
    let completion: Arc<dyn CompletionClient> = Arc::new(
        OpenAiClient::new(config.openai.clone()).context("Failed to create completion client")?,
    );
    Ok(CanvasOrchestrator::new(slack, completion))
}

/// Run the bot until `shutdown` resolves.
pub async fn run_serve<F>(config: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let orchestrator = build_orchestrator(&config)?;

    match orchestrator.slack().auth_test().await {
        Ok(identity) => info!(
            team = identity.team.as_deref().unwrap_or("unknown"),
            bot_user = identity.user_id.as_deref().unwrap_or("unknown"),
            "Authenticated with Slack"
        ),
        Err(e) => warn!("auth.test failed, continuing: {}", e),
    }

    let bot = CanvasBot::new(Arc::new(orchestrator));
    let dispatcher = SlackDispatcher::new(Arc::new(bot));

    match config.mode {
        TransportMode::Socket => {
            let client = SocketModeClient::new(config.slack, dispatcher)?;
            let stop = client.shutdown_handle();
            tokio::spawn(async move {
                shutdown.await;
                let _ = stop.send(());
            });
            info!("Starting in Socket Mode");
            client.run().await?;
        }
        TransportMode::Http => {
            let addr = config.server.addr();
            let listener = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            info!("Starting HTTP Events API on {}", addr);
            serve_events(listener, EventsState::new(config.slack, dispatcher), shutdown).await?;
        }
    }

    Ok(())
}
