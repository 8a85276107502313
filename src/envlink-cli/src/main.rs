//! envlink CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod credentials;
mod login_cmd;
mod sync_cmd;

/// envlink keeps track of your projects' .env files.
#[derive(Parser)]
#[command(name = "envlink")]
#[command(about = "Keep your projects' .env files in sync")]
#[command(version)]
struct Cli {
    /// Base URL of the envlink server.
    #[arg(
        long,
        global = true,
        default_value = "http://localhost:8080",
        env = "ENVLINK_SERVER_URL"
    )]
    server: String,

    /// Log filter (e.g. "debug" or "envlink_login=trace").
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to envlink through an identity provider.
    Login {
        /// Identity provider to authenticate against.
        #[arg(long, default_value = "google")]
        provider: String,

        /// Seconds to wait for the browser callback.
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },

    /// Upload a project's .env file.
    Push {
        /// Project identifier.
        #[arg(long)]
        project: String,

        /// Path to the .env file to upload.
        #[arg(long, default_value = ".env")]
        file: PathBuf,
    },

    /// Download a project's stored entries.
    Pull {
        /// Project identifier.
        #[arg(long)]
        project: String,
    },

    /// List your projects.
    Projects,
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let outcome = match cli.command {
        Commands::Login { provider, timeout } => {
            login_cmd::run(&cli.server, &provider, timeout).await
        }
        Commands::Push { project, file } => sync_cmd::push(&cli.server, &project, &file).await,
        Commands::Pull { project } => sync_cmd::pull(&cli.server, &project).await,
        Commands::Projects => sync_cmd::projects(&cli.server).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
