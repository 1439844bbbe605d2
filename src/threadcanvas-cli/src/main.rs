//! threadcanvas - Slack thread to canvas bot.

use std::process::ExitCode;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use threadcanvas_cli::create_cmd::run_create;
use threadcanvas_cli::serve_cmd::run_serve;
use threadcanvas_cli::{AppConfig, Cli, Command};

fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    setup_logging(&cli.log_level, cli.json_logs);

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config from environment: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Serve(args) => {
            let config = config.with_overrides(args.mode, args.host, args.port);
            info!(mode = ?config.mode, "Starting threadcanvas");
            info!("Press Ctrl+C to stop");

            if let Err(e) = run_serve(config, shutdown_signal()).await {
                error!("Server error: {:#}", e);
                return ExitCode::FAILURE;
            }
            info!("Server stopped");
        }
        Command::Create(args) => match run_create(config, &args).await {
            Ok(result) => println!("{} {}", result.kind, result.id),
            Err(e) => {
                error!("Canvas creation failed: {:#}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}
