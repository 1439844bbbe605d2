//! Application configuration.
//!
//! Composes the Slack and completion settings with the HTTP listener and
//! the transport choice. Everything comes from the environment; `.env` is
//! loaded by the binary before this runs.

use clap::ValueEnum;
use thiserror::Error;
use threadcanvas_openai::{OpenAiConfig, OpenAiError};
use threadcanvas_slack::{SlackConfig, SlackError};

/// Default listen host for the Events API endpoint.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port for the Events API endpoint.
pub const DEFAULT_PORT: u16 = 3000;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Slack(#[from] SlackError),

    #[error(transparent)]
    OpenAi(#[from] OpenAiError),

    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),
}

/// How the bot receives events from Slack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportMode {
    /// Outbound WebSocket; needs `SLACK_APP_TOKEN`.
    Socket,
    /// Inbound HTTP requests to `/slack/events`.
    Http,
}

/// Listener address for the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerSettings {
    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(host) = lookup("HOST").filter(|v| !v.trim().is_empty()) {
            settings.host = host.trim().to_string();
        }
        if let Some(port) = lookup("PORT").filter(|v| !v.trim().is_empty()) {
            settings.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }
        Ok(settings)
    }

    /// `host:port` for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slack: SlackConfig,
    pub openai: OpenAiConfig,
    pub server: ServerSettings,
    pub mode: TransportMode,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// The transport defaults to Socket Mode when an app token is present.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let slack = SlackConfig::from_lookup(&lookup)?;
        let openai = OpenAiConfig::from_lookup(&lookup)?;
        let server = ServerSettings::from_lookup(&lookup)?;
        let mode = if slack.has_socket_mode() {
            TransportMode::Socket
        } else {
            TransportMode::Http
        };

        Ok(Self {
            slack,
            openai,
            server,
            mode,
        })
    }

    /// Apply command-line overrides.
    pub fn with_overrides(
        mut self,
        mode: Option<TransportMode>,
        host: Option<String>,
        port: Option<u16>,
    ) -> Self {
        if let Some(mode) = mode {
            self.mode = mode;
        }
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }
}
