//! Zapper Core - TV Player Library for Zapper
//!
//! This crate provides the core functionality for the TV reference player:
//! - Stream resolution against the platform API (discovery, access token,
//!   master playlist)
//! - Variant extraction from master playlists
//! - DRM mode registry with cyclic selection
//! - Playback control over the native engine boundary
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Zapper Core                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐     │
//! │  │   Platform   │   │   Playlist   │   │   Content    │     │
//! │  │    Client    │──▶│  Extractor   │──▶│   Resolver   │     │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘     │
//! │                                               │ url         │
//! │                                        ┌──────┴───────┐     │
//! │                                        │   DRM Mode   │     │
//! │                                        │   Registry   │     │
//! │                                        └──────┬───────┘     │
//! │                                               │ selection   │
//! │                                        ┌──────┴───────┐     │
//! │                                        │   Playback   │     │
//! │                                        │  Controller  │     │
//! │                                        └──────────────┘     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod drm;
pub mod error;
pub mod player;
pub mod playlist;
pub mod resolver;
pub mod types;

pub use api::{PlatformClient, PlatformClientBuilder, PlatformGateway};
pub use drm::{Direction, DrmConfig, DrmModeRegistry};
pub use error::{Error, Result};
pub use player::{PlaybackBackend, PlaybackController, PlaybackProperties, TrackInfo, TrackKind};
pub use playlist::{StreamEntry, StreamEntryExtractor};
pub use resolver::ContentResolver;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the player library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Zapper Core initialized");
}
