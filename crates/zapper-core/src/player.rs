//! Playback boundary
//!
//! The DRM-capable player engine is platform-owned; this module defines
//! the seam the shell drives it through. `PlaybackBackend` mirrors the
//! native surface (prepare/transport/feature toggles/introspection) and
//! `PlaybackController` layers the source-switching rules on top: the
//! engine is stopped before it is reconfigured, and content is opened
//! once on first play rather than at selection time.

use crate::drm::DrmConfig;
use crate::error::{Error, Result};
use crate::types::PlayerState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Track categories reported by the native player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Video,
    Audio,
    Text,
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Audio => write!(f, "audio"),
            TrackKind::Text => write!(f, "text"),
        }
    }
}

/// One media track as reported by the native player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackInfo {
    pub index: u32,
    pub kind: TrackKind,
    /// Extra info blob, passed through from the engine
    pub info: String,
}

/// Engine-side playback status snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaybackProperties {
    pub duration_ms: u64,
    pub position_ms: u64,
    pub fullscreen: bool,
    pub uhd: bool,
}

/// Seam to the platform's playback engine
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    /// Prepare the engine for `config`'s content
    async fn open(&mut self, config: &DrmConfig) -> Result<()>;

    async fn play(&mut self) -> Result<()>;
    async fn pause(&mut self) -> Result<()>;
    async fn stop(&mut self) -> Result<()>;

    async fn jump_forward(&mut self) -> Result<()>;
    async fn jump_backward(&mut self) -> Result<()>;

    async fn toggle_fullscreen(&mut self) -> Result<()>;

    /// Switch UHD output on or off; callers gate this on panel support
    async fn set_uhd(&mut self, enabled: bool) -> Result<()>;

    async fn tracks(&self) -> Result<Vec<TrackInfo>>;
    async fn properties(&self) -> Result<PlaybackProperties>;

    fn state(&self) -> PlayerState;
}

/// Drives a playback backend with one selected DRM configuration
pub struct PlaybackController<B> {
    backend: B,
    source: Option<DrmConfig>,
    opened: bool,
}

impl<B: PlaybackBackend> PlaybackController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            source: None,
            opened: false,
        }
    }

    /// Currently configured source, if any
    pub fn source(&self) -> Option<&DrmConfig> {
        self.source.as_ref()
    }

    pub fn state(&self) -> PlayerState {
        self.backend.state()
    }

    /// Select a new source
    ///
    /// An active engine is stopped before the new configuration is stored;
    /// the content itself is opened lazily by the next `play_pause`.
    #[instrument(skip(self, config), fields(mode = %config.key))]
    pub async fn set_source(&mut self, config: DrmConfig) -> Result<()> {
        if self.backend.state().is_active() {
            self.backend.stop().await?;
        }

        info!(mode = %config.key, url = %config.url, "Playback source selected");
        self.source = Some(config);
        self.opened = false;
        Ok(())
    }

    /// Toggle between playing and paused, opening the source on first use
    pub async fn play_pause(&mut self) -> Result<()> {
        match self.backend.state() {
            PlayerState::Playing => self.backend.pause().await,
            PlayerState::Paused => self.backend.play().await,
            _ => {
                let source = self
                    .source
                    .clone()
                    .ok_or_else(|| Error::playback("no source selected"))?;
                if !self.opened {
                    self.backend.open(&source).await?;
                    self.opened = true;
                }
                self.backend.play().await
            }
        }
    }

    /// Stop playback; the source stays selected but must be reopened
    pub async fn stop(&mut self) -> Result<()> {
        if self.backend.state().is_active() {
            self.backend.stop().await?;
        }
        self.opened = false;
        Ok(())
    }

    pub async fn fast_forward(&mut self) -> Result<()> {
        self.backend.jump_forward().await
    }

    pub async fn rewind(&mut self) -> Result<()> {
        self.backend.jump_backward().await
    }

    pub async fn toggle_fullscreen(&mut self) -> Result<()> {
        self.backend.toggle_fullscreen().await
    }

    pub async fn set_uhd(&mut self, enabled: bool) -> Result<()> {
        self.backend.set_uhd(enabled).await
    }

    /// Fetch and log the engine's track list
    pub async fn report_tracks(&self) -> Result<Vec<TrackInfo>> {
        let tracks = self.backend.tracks().await?;
        for track in &tracks {
            info!(index = track.index, kind = %track.kind, info = %track.info, "Track");
        }
        Ok(tracks)
    }

    /// Fetch and log the engine's status snapshot
    pub async fn report_properties(&self) -> Result<PlaybackProperties> {
        let props = self.backend.properties().await?;
        info!(
            duration_ms = props.duration_ms,
            position_ms = props.position_ms,
            fullscreen = props.fullscreen,
            uhd = props.uhd,
            "Playback properties"
        );
        Ok(props)
    }
}
