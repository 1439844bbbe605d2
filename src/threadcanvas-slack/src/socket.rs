//! Socket Mode transport.
//!
//! Opens a WebSocket through `apps.connections.open`, acknowledges every
//! envelope, and routes its payload through a [`SlackDispatcher`]. The
//! connection is re-established after errors and `disconnect` requests until
//! shutdown is signalled.
//!
//! # Example
//!
//! ```rust,ignore
//! use threadcanvas_slack::{SlackConfig, SlackDispatcher, SocketModeClient};
//!
//! let config = SlackConfig::from_env()?;
//! let client = SocketModeClient::new(config, SlackDispatcher::new(handler))?;
//! client.run().await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

use crate::commands::SlashCommandPayload;
use crate::config::SlackConfig;
use crate::dispatch::SlackDispatcher;
use crate::error::{SlackApiError, SlackError, SlackResult};
use crate::events::{EventCallback, SocketModeAck, SocketModeEnvelope};

/// Type alias for the WebSocket connection.
type WsConnection = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection tuning for Socket Mode.
#[derive(Debug, Clone)]
pub struct SocketModeOptions {
    /// Delay between reconnection attempts.
    pub reconnect_delay: Duration,
    /// Ping interval for WebSocket keep-alive.
    pub ping_interval: Duration,
}

impl Default for SocketModeOptions {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(5),
            ping_interval: Duration::from_secs(30),
        }
    }
}

/// What the read loop should do after an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvelopeOutcome {
    Continue,
    Reconnect,
}

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionEnd {
    Shutdown,
    Reconnect,
}

/// Socket Mode client.
pub struct SocketModeClient {
    config: SlackConfig,
    client: reqwest::Client,
    dispatcher: SlackDispatcher,
    options: SocketModeOptions,
    shutdown_tx: broadcast::Sender<()>,
}

impl SocketModeClient {
    /// Create a client; the configuration must carry an app token.
    pub fn new(config: SlackConfig, dispatcher: SlackDispatcher) -> SlackResult<Self> {
        config.validate()?;
        if !config.has_socket_mode() {
            return Err(SlackError::Config(
                "SLACK_APP_TOKEN is required for Socket Mode".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SlackError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            config,
            client,
            dispatcher,
            options: SocketModeOptions::default(),
            shutdown_tx,
        })
    }

    /// A handle that stops [`Self::run`] when sent to.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run the connection loop until shutdown.
    pub async fn run(&self) -> SlackResult<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            let opened = tokio::select! {
                _ = shutdown_rx.recv() => break,
                url = self.open_connection() => url,
            };

            let result = match opened {
                Ok(ws_url) => {
                    info!("Connecting to Socket Mode...");
                    self.connect_and_run(&ws_url, &mut shutdown_rx).await
                }
                Err(e @ (SlackError::Auth(_) | SlackError::Config(_))) => return Err(e),
                Err(e) => Err(e),
            };

            match result {
                Ok(ConnectionEnd::Shutdown) => {
                    info!("Socket Mode connection closed gracefully");
                    break;
                }
                Ok(ConnectionEnd::Reconnect) => {
                    info!("Socket Mode connection ended, reconnecting");
                }
                Err(e) => {
                    error!("Socket Mode connection error: {}", e);

                    info!("Reconnecting in {:?}...", self.options.reconnect_delay);
                    tokio::select! {
                        _ = shutdown_rx.recv() => break,
                        _ = tokio::time::sleep(self.options.reconnect_delay) => {}
                    }
                }
            }
        }

        Ok(())
    }

    /// Get the WebSocket URL for Socket Mode.
    async fn open_connection(&self) -> SlackResult<String> {
        let app_token = self
            .config
            .app_token()
            .ok_or_else(|| SlackError::Config("SLACK_APP_TOKEN is not set".to_string()))?;

        let response = self
            .client
            .post(format!(
                "{}/apps.connections.open",
                self.config.api_base_url()
            ))
            .bearer_auth(app_token)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .send()
            .await?;

        let json: serde_json::Value = response.json().await?;

        if json.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let error = json
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown");
            return Err(SlackApiError::for_method("apps.connections.open", error).into());
        }

        json.get("url")
            .and_then(|u| u.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| SlackError::Api("Missing url in response".to_string()))
    }

    /// Connect to WebSocket and run event loop.
    async fn connect_and_run(
        &self,
        ws_url: &str,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> SlackResult<ConnectionEnd> {
        let (ws_stream, _) = connect_async(ws_url).await?;
        let (write, read) = ws_stream.split();

        let write = Arc::new(tokio::sync::Mutex::new(write));
        let write_clone = write.clone();

        let (msg_tx, mut msg_rx) = mpsc::channel::<WsMessage>(100);

        let write_task = tokio::spawn(async move {
            while let Some(msg) = msg_rx.recv().await {
                let mut guard = write_clone.lock().await;
                if let Err(e) = guard.send(msg).await {
                    error!("Failed to send WebSocket message: {}", e);
                    break;
                }
            }
        });

        let ping_tx = msg_tx.clone();
        let ping_interval = self.options.ping_interval;
        let ping_task = tokio::spawn(async move {
            let mut interval = interval(ping_interval);
            loop {
                interval.tick().await;
                if ping_tx.send(WsMessage::Ping(vec![])).await.is_err() {
                    break;
                }
            }
        });

        let result = self.process_messages(read, msg_tx, shutdown_rx).await;

        ping_task.abort();
        write_task.abort();

        result
    }

    /// Process incoming WebSocket messages.
    async fn process_messages(
        &self,
        mut read: SplitStream<WsConnection>,
        msg_tx: mpsc::Sender<WsMessage>,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> SlackResult<ConnectionEnd> {
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Received shutdown signal");
                    return Ok(ConnectionEnd::Shutdown);
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(WsMessage::Text(text))) => {
                            let (ack, outcome) = handle_envelope(&text, &self.dispatcher);
                            if let Some(ack) = ack {
                                let _ = msg_tx.send(WsMessage::Text(ack)).await;
                            }
                            if outcome == EnvelopeOutcome::Reconnect {
                                return Ok(ConnectionEnd::Reconnect);
                            }
                        }
                        Some(Ok(WsMessage::Ping(data))) => {
                            let _ = msg_tx.send(WsMessage::Pong(data)).await;
                        }
                        Some(Ok(WsMessage::Close(_))) => {
                            info!("WebSocket closed by server");
                            return Ok(ConnectionEnd::Reconnect);
                        }
                        Some(Err(e)) => {
                            return Err(SlackError::WebSocket(e.to_string()));
                        }
                        None => {
                            return Ok(ConnectionEnd::Reconnect);
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

/// Parse one Socket Mode frame, dispatch its payload, and build the ack.
///
/// Returns the serialized acknowledgment (if the envelope carries an ID) and
/// whether the connection should be replaced.
fn handle_envelope(text: &str, dispatcher: &SlackDispatcher) -> (Option<String>, EnvelopeOutcome) {
    debug!("Received Socket Mode message: {}", text);

    let envelope: SocketModeEnvelope = match serde_json::from_str(text) {
        Ok(env) => env,
        Err(e) => {
            warn!("Failed to parse Socket Mode envelope: {}", e);
            return (None, EnvelopeOutcome::Continue);
        }
    };

    let mut ack = envelope.envelope_id.as_deref().map(SocketModeAck::new);
    let mut outcome = EnvelopeOutcome::Continue;

    match envelope.envelope_type.as_str() {
        "events_api" => {
            if envelope.retry_attempt.unwrap_or(0) > 0 {
                debug!(
                    retry_attempt = envelope.retry_attempt,
                    "Ignoring redelivered event"
                );
            } else if let Some(payload) = envelope.payload {
                match serde_json::from_value::<EventCallback>(payload) {
                    Ok(callback) => {
                        dispatcher.dispatch_event(callback);
                    }
                    Err(e) => warn!("Invalid events_api payload: {}", e),
                }
            }
        }
        "slash_commands" => {
            if let Some(payload) = envelope.payload {
                match serde_json::from_value::<SlashCommandPayload>(payload) {
                    Ok(command) => {
                        let (response, _) = dispatcher.dispatch_command(&command);
                        if let Some(envelope_id) = envelope.envelope_id.as_deref() {
                            match serde_json::to_value(&response) {
                                Ok(body) => {
                                    ack = Some(SocketModeAck::with_payload(envelope_id, body))
                                }
                                Err(e) => warn!("Failed to serialize command response: {}", e),
                            }
                        }
                    }
                    Err(e) => warn!("Invalid slash_commands payload: {}", e),
                }
            }
        }
        "interactive" => {
            if let Some(payload) = envelope.payload {
                dispatcher.dispatch_interactive(payload);
            }
        }
        "hello" => {
            info!("Socket Mode connection established");
        }
        "disconnect" => {
            info!(
                reason = envelope.reason.as_deref().unwrap_or("unspecified"),
                "Received disconnect request from Slack"
            );
            outcome = EnvelopeOutcome::Reconnect;
        }
        other => {
            debug!("Unknown envelope type: {}", other);
        }
    }

    let ack_json = ack.and_then(|ack| match serde_json::to_string(&ack) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!("Failed to serialize ack: {}", e);
            None
        }
    });

    (ack_json, outcome)
}
