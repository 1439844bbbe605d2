//! Library side of the `threadcanvas` binary.
//!
//! Argument parsing, configuration loading and the two subcommands:
//! `serve` runs the bot over Socket Mode or the HTTP Events API, `create`
//! summarizes a single thread from the terminal.

pub mod cli;
pub mod config;
pub mod create_cmd;
pub mod serve_cmd;

pub use cli::{Cli, Command, CreateArgs, ServeArgs};
pub use config::{AppConfig, ConfigError, ServerSettings, TransportMode};
