//! CLI command implementations

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use zapper_core::{
    ContentQuery, ContentResolver, DrmModeRegistry, PlatformClient, ResolvedStream,
    ResolverConfig, StreamKind,
};

use crate::backend::LogBackend;
use crate::keys::{RemoteKey, REGISTERED_KEYS};
use crate::shell::{DeviceCaps, Shell};

/// Connection and retry settings shared by the stream-resolving commands
pub struct ResolveOptions {
    pub kind: StreamKind,
    pub offset: u64,
    pub api_base: Option<String>,
    pub usher_base: Option<String>,
    pub client_id: Option<String>,
    pub timeout: Duration,
    pub retry_delay_ms: u64,
}

impl ResolveOptions {
    fn client(&self) -> zapper_core::Result<PlatformClient> {
        let mut builder = PlatformClient::builder().timeout(self.timeout);
        if let Some(base) = &self.api_base {
            builder = builder.api_base(base.as_str());
        }
        if let Some(base) = &self.usher_base {
            builder = builder.usher_base(base.as_str());
        }
        if let Some(id) = &self.client_id {
            builder = builder.client_id(id.as_str());
        }
        builder.build()
    }

    fn query(&self) -> ContentQuery {
        ContentQuery {
            kind: self.kind,
            offset: self.offset,
        }
    }
}

async fn resolve_stream(opts: &ResolveOptions) -> zapper_core::Result<ResolvedStream> {
    let client = opts.client()?;
    let config = ResolverConfig {
        retry_delay_ms: opts.retry_delay_ms,
        ..ResolverConfig::default()
    };
    let resolver = ContentResolver::with_config(client, config);
    Ok(resolver.resolve(opts.query()).await)
}

/// Resolve a stream, then drive the interactive shell from stdin key input
pub async fn run(opts: ResolveOptions, uhd_panel: bool) -> anyhow::Result<()> {
    let resolved = resolve_stream(&opts).await?;
    info!(
        url = %resolved.url,
        id = %resolved.identifier,
        kind = %resolved.kind,
        cycle = %resolved.cycle,
        "Stream resolved"
    );

    let mut registry = DrmModeRegistry::with_demo_modes();
    registry.set_resolved_url(&resolved.url);

    info!(keys = ?REGISTERED_KEYS, "Remote keys registered");

    let caps = DeviceCaps {
        uhd_panel,
        ..DeviceCaps::default()
    };
    let mut shell = Shell::new(LogBackend::new(), registry, caps);

    let (key_tx, key_rx) = mpsc::channel(16);
    tokio::spawn(read_keys(key_tx));

    shell.run(key_rx).await;
    info!("Shell closed");
    Ok(())
}

/// Resolve once and print the stream link
pub async fn resolve(opts: ResolveOptions) -> anyhow::Result<()> {
    println!("Resolving {} stream (offset {})", opts.kind, opts.offset);

    let resolved = resolve_stream(&opts).await?;

    println!("\nResolved stream:");
    println!("  Kind:       {}", resolved.kind);
    println!("  Identifier: {}", resolved.identifier);
    println!("  URL:        {}", resolved.url);

    Ok(())
}

/// Print the built-in DRM mode table
pub fn modes(json: bool) -> anyhow::Result<()> {
    let registry = DrmModeRegistry::with_demo_modes();

    if json {
        println!("{}", serde_json::to_string_pretty(registry.modes())?);
        return Ok(());
    }

    println!("DRM modes:");
    for (i, mode) in registry.modes().iter().enumerate() {
        println!("  {}. {} [{}]", i + 1, mode.name, mode.key);
        if mode.url.is_empty() {
            println!("     url: (resolved at runtime)");
        } else {
            println!("     url: {}", mode.url);
        }
        match &mode.license_server {
            Some(server) if server.is_empty() => {
                println!("     license server: (application challenge)");
            }
            Some(server) => println!("     license server: {}", server),
            None => {}
        }
    }

    Ok(())
}

/// Reads stdin lines as remote key codes or registered key names.
///
/// This is the dev-harness stand-in for the TV input service; unknown input
/// is logged and dropped like an unhandled key code.
async fn read_keys(tx: mpsc::Sender<RemoteKey>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                match RemoteKey::parse(input) {
                    Some(key) => {
                        if tx.send(key).await.is_err() {
                            break;
                        }
                    }
                    None => warn!(input = %input, "Unhandled key"),
                }
            }
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "Key input read failed");
                break;
            }
        }
    }
}
