//! HTTP Events API transport.
//!
//! Serves `POST /slack/events` for Events API callbacks, interactive
//! payloads and slash commands, plus `GET /health`. Every request must carry
//! a valid Slack signature.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::commands::SlashCommandPayload;
use crate::config::SlackConfig;
use crate::dispatch::SlackDispatcher;
use crate::error::{SlackError, SlackResult};
use crate::events::EventCallback;

type HmacSha256 = Hmac<Sha256>;

/// Path Slack posts events, interactions and commands to.
pub const EVENTS_PATH: &str = "/slack/events";

/// Requests older than this are rejected as replays.
pub const MAX_REQUEST_AGE_SECS: u64 = 300;

const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
const SIGNATURE_HEADER: &str = "x-slack-signature";
const RETRY_HEADER: &str = "x-slack-retry-num";

/// Shared state of the events router.
#[derive(Clone)]
pub struct EventsState {
    config: Arc<SlackConfig>,
    dispatcher: SlackDispatcher,
}

impl EventsState {
    /// Create router state.
    pub fn new(config: SlackConfig, dispatcher: SlackDispatcher) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher,
        }
    }
}

/// Verify a Slack request signature.
///
/// The signature is `v0=` followed by the hex HMAC-SHA256 of
/// `v0:<timestamp>:<body>` keyed with the signing secret. `now` is the
/// current Unix time in seconds.
pub fn verify_signature(
    signing_secret: &str,
    timestamp: &str,
    body: &[u8],
    signature: &str,
    now: i64,
) -> SlackResult<()> {
    let ts: i64 = timestamp.trim().parse().map_err(|_| {
        SlackError::SignatureVerification("missing or invalid request timestamp".to_string())
    })?;
    if now.abs_diff(ts) > MAX_REQUEST_AGE_SECS {
        return Err(SlackError::SignatureVerification(
            "request timestamp is too old".to_string(),
        ));
    }

    let provided = signature
        .strip_prefix("v0=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
        .ok_or_else(|| {
            SlackError::SignatureVerification("malformed signature header".to_string())
        })?;

    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|e| SlackError::Internal(format!("Invalid signing key: {}", e)))?;
    mac.update(format!("v0:{}:", timestamp.trim()).as_bytes());
    mac.update(body);

    mac.verify_slice(&provided)
        .map_err(|_| SlackError::SignatureVerification("signature mismatch".to_string()))
}

/// Build the events router.
pub fn events_router(state: EventsState) -> Router {
    Router::new()
        .route(EVENTS_PATH, post(handle_events))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the events router on `listener` until `shutdown` resolves.
pub async fn serve_events<F>(listener: TcpListener, state: EventsState, shutdown: F) -> SlackResult<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Slack Events API listening on http://{}{}", addr, EVENTS_PATH);
    }

    axum::serve(listener, events_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| SlackError::Internal(format!("HTTP server failed: {}", e)))
}

async fn health() -> &'static str {
    "ok"
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

async fn handle_events(
    State(state): State<EventsState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(e) = verify_signature(
        state.config.signing_secret(),
        header_str(&headers, TIMESTAMP_HEADER),
        &body,
        header_str(&headers, SIGNATURE_HEADER),
        unix_now(),
    ) {
        warn!("Rejected Slack request: {}", e);
        return StatusCode::UNAUTHORIZED.into_response();
    }

    if headers.contains_key(RETRY_HEADER) {
        debug!(
            retry = header_str(&headers, RETRY_HEADER),
            "Ignoring Slack retry"
        );
        return StatusCode::OK.into_response();
    }

    let content_type = header_str(&headers, "content-type");
    if content_type.starts_with("application/x-www-form-urlencoded") {
        handle_form_body(&state, &body)
    } else {
        handle_json_body(&state, &body)
    }
}

fn handle_json_body(state: &EventsState, body: &[u8]) -> Response {
    let payload: serde_json::Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse Slack request body as JSON: {}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match payload.get("type").and_then(|t| t.as_str()) {
        Some("url_verification") => {
            let challenge = payload
                .get("challenge")
                .and_then(|c| c.as_str())
                .unwrap_or_default();
            Json(serde_json::json!({ "challenge": challenge })).into_response()
        }
        Some("event_callback") => {
            match serde_json::from_value::<EventCallback>(payload) {
                Ok(callback) => {
                    state.dispatcher.dispatch_event(callback);
                }
                Err(e) => warn!("Invalid event callback: {}", e),
            }
            StatusCode::OK.into_response()
        }
        other => {
            debug!("Ignoring Slack request type: {:?}", other);
            StatusCode::OK.into_response()
        }
    }
}

fn handle_form_body(state: &EventsState, body: &[u8]) -> Response {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(body).into_owned().collect();

    if let Some((_, raw)) = pairs.iter().find(|(key, _)| key == "payload") {
        return match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(payload) => {
                state.dispatcher.dispatch_interactive(payload);
                StatusCode::OK.into_response()
            }
            Err(e) => {
                warn!("Invalid interactive payload: {}", e);
                StatusCode::BAD_REQUEST.into_response()
            }
        };
    }

    let command =
        match SlashCommandPayload::from_form(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))) {
            Ok(command) => command,
            Err(e) => {
                warn!("{}", e);
                return StatusCode::BAD_REQUEST.into_response();
            }
        };

    let (ack, _) = state.dispatcher.dispatch_command(&command);
    Json(ack).into_response()
}
