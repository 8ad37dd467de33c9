//! Demo playback backend
//!
//! Log-only stand-in for the native playback engine. Calls are checked
//! against the player state machine and logged, so the shell can be driven
//! end to end on hosts without real video output.

use async_trait::async_trait;
use tracing::info;
use zapper_core::{
    DrmConfig, Error, PlaybackBackend, PlaybackProperties, PlayerState, Result, TrackInfo,
    TrackKind,
};

/// Forward/backward jump distance.
const JUMP_MS: u64 = 5_000;

/// Reported duration of the demo content.
const DEMO_DURATION_MS: u64 = 120_000;

/// Playback engine stand-in that logs every call.
pub struct LogBackend {
    state: PlayerState,
    source: Option<DrmConfig>,
    fullscreen: bool,
    uhd: bool,
    position_ms: u64,
}

impl LogBackend {
    pub fn new() -> Self {
        Self {
            state: PlayerState::Idle,
            source: None,
            fullscreen: false,
            uhd: false,
            position_ms: 0,
        }
    }

    fn transition(&mut self, target: PlayerState) -> Result<()> {
        if !self.state.can_transition_to(target) {
            return Err(Error::InvalidStateTransition {
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        self.state = target;
        Ok(())
    }
}

impl Default for LogBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackBackend for LogBackend {
    async fn open(&mut self, config: &DrmConfig) -> Result<()> {
        if self.state == PlayerState::Stopped {
            self.transition(PlayerState::Idle)?;
        }
        if self.state != PlayerState::Idle {
            return Err(Error::playback(format!(
                "cannot open a source while {}",
                self.state
            )));
        }

        info!(mode = %config.key, url = %config.url, "Opening source");
        self.source = Some(config.clone());
        self.position_ms = 0;
        Ok(())
    }

    async fn play(&mut self) -> Result<()> {
        self.transition(PlayerState::Playing)?;
        info!("Play requested");
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        self.transition(PlayerState::Paused)?;
        info!("Pause requested");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if self.state == PlayerState::Stopped {
            info!("Stop requested while already stopped");
            return Ok(());
        }
        self.transition(PlayerState::Stopped)?;
        self.position_ms = 0;
        info!("Stop requested");
        Ok(())
    }

    async fn jump_forward(&mut self) -> Result<()> {
        self.position_ms = (self.position_ms + JUMP_MS).min(DEMO_DURATION_MS);
        info!(position_ms = self.position_ms, "Jump forward");
        Ok(())
    }

    async fn jump_backward(&mut self) -> Result<()> {
        self.position_ms = self.position_ms.saturating_sub(JUMP_MS);
        info!(position_ms = self.position_ms, "Jump backward");
        Ok(())
    }

    async fn toggle_fullscreen(&mut self) -> Result<()> {
        self.fullscreen = !self.fullscreen;
        info!(fullscreen = self.fullscreen, "Display mode toggled");
        Ok(())
    }

    async fn set_uhd(&mut self, enabled: bool) -> Result<()> {
        self.uhd = enabled;
        info!(uhd = enabled, "UHD output set");
        Ok(())
    }

    async fn tracks(&self) -> Result<Vec<TrackInfo>> {
        Ok(vec![
            TrackInfo {
                index: 0,
                kind: TrackKind::Video,
                info: "H.264 1280x720".to_string(),
            },
            TrackInfo {
                index: 1,
                kind: TrackKind::Audio,
                info: "AAC 48kHz stereo".to_string(),
            },
        ])
    }

    async fn properties(&self) -> Result<PlaybackProperties> {
        Ok(PlaybackProperties {
            duration_ms: if self.source.is_some() {
                DEMO_DURATION_MS
            } else {
                0
            },
            position_ms: self.position_ms,
            fullscreen: self.fullscreen,
            uhd: self.uhd,
        })
    }

    fn state(&self) -> PlayerState {
        self.state
    }
}
