//! Command-line arguments.

use clap::{Args, Parser, Subcommand};

use crate::config::TransportMode;

/// Turn Slack threads into canvases.
#[derive(Debug, Parser)]
#[command(name = "threadcanvas")]
#[command(about = "Summarize Slack threads into canvases")]
#[command(version)]
pub struct Cli {
    /// Log level
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the bot until Ctrl+C or SIGTERM.
    Serve(ServeArgs),
    /// Summarize one thread into a canvas and exit.
    Create(CreateArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Transport (defaults to socket when SLACK_APP_TOKEN is set)
    #[arg(long, value_enum)]
    pub mode: Option<TransportMode>,

    /// Listen host for the HTTP transport
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port for the HTTP transport
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Thread URL, `p`-prefixed timestamp or dotted timestamp
    pub thread: String,

    /// Channel ID; required unless the thread is given as a URL
    #[arg(long)]
    pub channel: Option<String>,

    /// User to notify and grant access to
    #[arg(long)]
    pub user: String,

    /// Canvas title (defaults to the generated one)
    #[arg(long)]
    pub title: Option<String>,
}
