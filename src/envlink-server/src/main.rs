//! envlink server binary.

use std::process::ExitCode;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use envlink_server::{ServerConfig, run_with_shutdown};

/// envlink API server
#[derive(Parser)]
#[command(name = "envlink-server")]
#[command(about = "HTTP API server for envlink")]
#[command(version)]
struct Args {
    /// Listen address; overrides the PORT environment variable.
    #[arg(short, long)]
    listen: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // A .env file in the working directory is optional.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    setup_logging(&args.log_level, args.json_logs);

    let mut config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config from environment: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }

    info!("Press Ctrl+C to stop");

    let shutdown = async {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {e}");
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => error!("Failed to install SIGTERM handler: {e}"),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        info!("Shutdown signal received");
    };

    match run_with_shutdown(config, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server error: {e}");
            ExitCode::FAILURE
        }
    }
}
