use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use herald::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "herald",
    version,
    about = "Scheduled broadcast dispatcher for chat destinations",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (environment variables otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dispatch scheduler until interrupted
    Run {
        /// Override the tick period in seconds
        #[arg(short, long)]
        tick: Option<u64>,
    },

    /// Add a broadcast for a destination
    Add {
        /// Destination identifier
        #[arg(short, long)]
        destination: i64,

        /// Message text
        #[arg(short = 'm', long)]
        text: String,

        /// Minutes between sends
        #[arg(short, long)]
        interval: i64,

        /// Total lifetime in minutes
        #[arg(short = 'D', long)]
        duration: i64,

        /// Media kind (photo, video, animation)
        #[arg(long)]
        media_kind: Option<String>,

        /// Media reference for the chosen kind
        #[arg(long)]
        media_ref: Option<String>,

        /// Topic thread to post into
        #[arg(long)]
        thread: Option<i64>,

        /// Inline button label
        #[arg(long)]
        button_text: Option<String>,

        /// Inline button URL
        #[arg(long)]
        button_url: Option<String>,
    },

    /// List broadcasts for a destination
    List {
        /// Destination identifier
        #[arg(short, long)]
        destination: i64,

        /// Only show active broadcasts
        #[arg(long, default_value = "false")]
        active_only: bool,
    },

    /// Toggle a broadcast between active and paused
    Toggle {
        /// Broadcast identifier
        id: i64,

        /// Destination the broadcast belongs to
        #[arg(short, long)]
        destination: i64,
    },

    /// Remove a broadcast
    Remove {
        /// Broadcast identifier
        id: i64,

        /// Destination the broadcast belongs to
        #[arg(short, long)]
        destination: i64,
    },

    /// Manage a destination
    Destination {
        #[command(subcommand)]
        action: DestinationAction,
    },
}

#[derive(Subcommand)]
enum DestinationAction {
    /// Enable dispatch to a destination
    Enable { id: i64 },

    /// Disable dispatch to a destination
    Disable { id: i64 },

    /// Show a destination and its broadcasts
    Show { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate()?;

    match cli.command {
        Commands::Run { tick } => {
            tracing::info!(tick = ?tick, "Starting run command");
            commands::run(config, tick).await?;
        }

        Commands::Add {
            destination,
            text,
            interval,
            duration,
            media_kind,
            media_ref,
            thread,
            button_text,
            button_url,
        } => {
            commands::add(
                &config,
                commands::AddParams {
                    destination,
                    text,
                    interval,
                    duration,
                    media_kind,
                    media_ref,
                    thread,
                    button_text,
                    button_url,
                },
            )?;
        }

        Commands::List {
            destination,
            active_only,
        } => {
            commands::list(&config, destination, active_only)?;
        }

        Commands::Toggle { id, destination } => {
            commands::toggle(&config, id, destination)?;
        }

        Commands::Remove { id, destination } => {
            commands::remove(&config, id, destination)?;
        }

        Commands::Destination { action } => match action {
            DestinationAction::Enable { id } => commands::set_destination(&config, id, true)?,
            DestinationAction::Disable { id } => commands::set_destination(&config, id, false)?,
            DestinationAction::Show { id } => commands::show_destination(&config, id)?,
        },
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("herald=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("herald=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
