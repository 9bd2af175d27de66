//! Learnmate CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Initialize config directory and default config.toml
//! - `chat`    — Interactive chat or single-message mode
//! - `doctor`  — Diagnose configuration and store health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "learnmate",
    about = "Learnmate — AI learning plan assistant",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Chat with the learning assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Principal whose conversation to continue
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Diagnose configuration and store health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat { message, user } => commands::chat::run(message, user).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
