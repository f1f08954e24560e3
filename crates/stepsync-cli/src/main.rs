mod cmd;
mod counter;
mod http;
mod wake;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "stepsync",
    about = "Background step-count synchronizer — fetch the local counter and upload it to the collector",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sync daemon (scheduled, push, and observer wakes)
    Run {
        /// File holding the day's cumulative step count
        #[arg(long, env = "STEPSYNC_COUNTER_FILE")]
        counter_file: PathBuf,

        /// Unix socket accepting silent-push payloads as JSON lines
        #[arg(long, env = "STEPSYNC_PUSH_SOCKET")]
        push_socket: Option<PathBuf>,

        /// Override the scheduled wake interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Trigger one manual sync cycle and exit
    Sync {
        /// File holding the day's cumulative step count
        #[arg(long, env = "STEPSYNC_COUNTER_FILE")]
        counter_file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Run {
            counter_file,
            push_socket,
            interval,
        } => cmd::run::run(&counter_file, push_socket.as_deref(), interval),
        Commands::Sync { counter_file } => cmd::sync::run(&counter_file, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
