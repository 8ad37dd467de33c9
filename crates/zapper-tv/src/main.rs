//! zapper-tv - Reference TV player shell
//!
//! Resolves a live or on-demand stream from the platform API, then drives a
//! demo playback backend from remote-control key input. Stdin stands in for
//! the TV input service: each line is a key code or a registered key name.

use std::time::Duration;

use clap::{Parser, Subcommand};
use zapper_core::StreamKind;

mod backend;
mod commands;
mod keys;
mod shell;

/// zapper-tv - TV player shell
#[derive(Parser)]
#[command(name = "zapper-tv")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "TV player shell with platform stream resolution and DRM mode switching", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Stream kind to resolve (live, vod)
    #[arg(short, long, default_value = "live")]
    kind: String,

    /// Initial listing offset for live candidate discovery
    #[arg(short, long, default_value = "0")]
    offset: u64,

    /// Platform API base URL
    #[arg(long)]
    api_base: Option<String>,

    /// Playlist service base URL
    #[arg(long)]
    usher_base: Option<String>,

    /// Client-ID header sent with platform requests
    #[arg(long)]
    client_id: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,

    /// Delay between resolution retry attempts in milliseconds
    #[arg(long, default_value = "1000")]
    retry_delay_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive shell (reads key codes or names from stdin)
    Run {
        /// Report the panel as UHD-capable
        #[arg(long)]
        uhd_panel: bool,
    },

    /// Resolve a stream URL once and print it
    Resolve,

    /// Show the built-in DRM mode table
    Modes {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn resolve_options(&self) -> anyhow::Result<commands::ResolveOptions> {
        Ok(commands::ResolveOptions {
            kind: parse_kind(&self.kind)?,
            offset: self.offset,
            api_base: self.api_base.clone(),
            usher_base: self.usher_base.clone(),
            client_id: self.client_id.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            retry_delay_ms: self.retry_delay_ms,
        })
    }
}

fn parse_kind(kind: &str) -> anyhow::Result<StreamKind> {
    match kind {
        "live" => Ok(StreamKind::Live),
        "vod" => Ok(StreamKind::OnDemand),
        other => anyhow::bail!("unknown stream kind '{}' (expected 'live' or 'vod')", other),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .init();

    zapper_core::init();

    match cli.command {
        Commands::Run { uhd_panel } => {
            commands::run(cli.resolve_options()?, uhd_panel).await?;
        }
        Commands::Resolve => {
            commands::resolve(cli.resolve_options()?).await?;
        }
        Commands::Modes { json } => {
            commands::modes(json)?;
        }
    }

    Ok(())
}
