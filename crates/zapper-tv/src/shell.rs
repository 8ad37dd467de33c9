//! Interactive TV shell
//!
//! Owns the DRM mode registry, the playback controller and the on-screen
//! log, and applies remote-key actions to them. Mode selection always flows
//! through the registry's watch channel, so playback follows the focused
//! entry no matter where a change originated.

use std::collections::VecDeque;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use zapper_core::{
    DrmConfig, DrmModeRegistry, PlaybackBackend, PlaybackController, PlayerState, Result,
};

use crate::keys::{RemoteKey, ShellAction};

/// Lines kept by the on-screen log.
const SCREEN_LOG_CAPACITY: usize = 64;

/// Capabilities reported by the device platform layer.
#[derive(Debug, Clone, Copy)]
pub struct DeviceCaps {
    /// Panel can display 4k output
    pub uhd_panel: bool,
    /// Horizontal display resolution, used to scale the player surface
    pub display_width: u32,
}

impl Default for DeviceCaps {
    fn default() -> Self {
        Self {
            uhd_panel: false,
            display_width: 1920,
        }
    }
}

/// On-screen log element stand-in.
///
/// Lines are timestamped and capped so a long session cannot grow without
/// bound; every line is mirrored to `tracing`.
pub struct ScreenLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl ScreenLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a line, dropping the oldest when full.
    pub fn push(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        info!("{}", msg);

        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines
            .push_back(format!("[{}] {}", Utc::now().format("%H:%M:%S"), msg));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[allow(dead_code)]
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Whether the event loop keeps running after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Interactive shell state: mode registry, playback controller, screen log.
pub struct Shell<B> {
    registry: DrmModeRegistry,
    controller: PlaybackController<B>,
    log: ScreenLog,
    caps: DeviceCaps,
    uhd_enabled: bool,
}

impl<B: PlaybackBackend> Shell<B> {
    pub fn new(backend: B, registry: DrmModeRegistry, caps: DeviceCaps) -> Self {
        let mut log = ScreenLog::new(SCREEN_LOG_CAPACITY);
        log.push(format!("The display width is {}", caps.display_width));

        Self {
            registry,
            controller: PlaybackController::new(backend),
            log,
            caps,
            uhd_enabled: false,
        }
    }

    #[allow(dead_code)]
    pub fn screen_log(&self) -> &ScreenLog {
        &self.log
    }

    /// Key of the source currently configured on the controller, if any
    #[allow(dead_code)]
    pub fn source_mode(&self) -> Option<&str> {
        self.controller.source().map(|config| config.key.as_str())
    }

    pub fn state(&self) -> PlayerState {
        self.controller.state()
    }

    /// Runs the event loop until a Back press on inactive playback or until
    /// the key channel closes.
    ///
    /// The focused mode is applied to the controller up front, and pending
    /// selection changes are applied before the next key is handled, so
    /// playback always follows the latest focus.
    pub async fn run(&mut self, mut keys: mpsc::Receiver<RemoteKey>) {
        let mut selection = self.registry.subscribe();

        let initial = self.registry.current().clone();
        self.apply_selection(initial).await;

        loop {
            tokio::select! {
                biased;

                changed = selection.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let config = selection.borrow_and_update().clone();
                    self.apply_selection(config).await;
                }
                maybe_key = keys.recv() => match maybe_key {
                    Some(key) => {
                        if self.handle_key(key).await == Flow::Exit {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
    }

    /// Applies one remote key press.
    pub async fn handle_key(&mut self, key: RemoteKey) -> Flow {
        let result = match key.action() {
            ShellAction::ToggleFullscreen => self.controller.toggle_fullscreen().await,
            ShellAction::CycleMode(direction) => {
                self.registry.cycle(direction);
                Ok(())
            }
            ShellAction::PlayPause => self.controller.play_pause().await,
            ShellAction::Stop => self.controller.stop().await,
            ShellAction::FastForward => self.controller.fast_forward().await,
            ShellAction::Rewind => self.controller.rewind().await,
            ShellAction::ClearLog => {
                self.log.clear();
                Ok(())
            }
            ShellAction::ToggleUhd => self.toggle_uhd().await,
            ShellAction::ShowTracks => self.show_tracks().await,
            ShellAction::ShowProperties => self.show_properties().await,
            ShellAction::Back => {
                if matches!(self.state(), PlayerState::Playing | PlayerState::Paused) {
                    self.controller.stop().await
                } else {
                    return Flow::Exit;
                }
            }
        };

        if let Err(err) = result {
            warn!(key = ?key, error = %err, "Key handling failed");
            self.log.push(format!("error: {}", err));
        }
        Flow::Continue
    }

    async fn apply_selection(&mut self, config: DrmConfig) {
        self.log.push(format!("DRM mode selected: {}", config.name));
        if let Err(err) = self.controller.set_source(config).await {
            warn!(error = %err, "Mode switch failed");
            self.log.push(format!("error: {}", err));
        }
    }

    async fn toggle_uhd(&mut self) -> Result<()> {
        if !self.uhd_enabled {
            if self.caps.uhd_panel {
                self.log.push("4k enabled");
                self.uhd_enabled = true;
            } else {
                self.log
                    .push("this device does not have a panel capable of displaying 4k content");
            }
        } else {
            self.log.push("4k disabled");
            self.uhd_enabled = false;
        }
        self.controller.set_uhd(self.uhd_enabled).await
    }

    async fn show_tracks(&mut self) -> Result<()> {
        let tracks = self.controller.report_tracks().await?;
        self.log.push(format!("{} tracks", tracks.len()));
        for track in tracks {
            self.log
                .push(format!("#{} {}: {}", track.index, track.kind, track.info));
        }
        Ok(())
    }

    async fn show_properties(&mut self) -> Result<()> {
        let props = self.controller.report_properties().await?;
        self.log.push(format!(
            "position {} / {} ms, fullscreen: {}, uhd: {}",
            props.position_ms, props.duration_ms, props.fullscreen, props.uhd
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LogBackend;

    fn demo_registry() -> DrmModeRegistry {
        let mut registry = DrmModeRegistry::with_demo_modes();
        registry.set_resolved_url("http://playlist.example/live.m3u8");
        registry
    }

    fn demo_shell() -> Shell<LogBackend> {
        Shell::new(LogBackend::new(), demo_registry(), DeviceCaps::default())
    }

    async fn seeded_shell() -> Shell<LogBackend> {
        let mut shell = demo_shell();
        let mode = shell.registry.current().clone();
        shell.apply_selection(mode).await;
        shell
    }

    #[test]
    fn test_screen_log_drops_oldest_when_full() {
        let mut log = ScreenLog::new(2);
        log.push("one");
        log.push("two");
        log.push("three");

        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("two"));
        assert!(lines[1].contains("three"));
    }

    #[tokio::test]
    async fn test_play_pause_toggles_through_keys() {
        let mut shell = seeded_shell().await;

        shell.handle_key(RemoteKey::MediaPlayPause).await;
        assert_eq!(shell.state(), PlayerState::Playing);

        shell.handle_key(RemoteKey::MediaPause).await;
        assert_eq!(shell.state(), PlayerState::Paused);

        shell.handle_key(RemoteKey::MediaPlay).await;
        assert_eq!(shell.state(), PlayerState::Playing);
    }

    #[tokio::test]
    async fn test_back_stops_active_playback_then_exits() {
        let mut shell = seeded_shell().await;

        shell.handle_key(RemoteKey::MediaPlayPause).await;
        assert_eq!(shell.state(), PlayerState::Playing);

        assert_eq!(shell.handle_key(RemoteKey::Return).await, Flow::Continue);
        assert_eq!(shell.state(), PlayerState::Stopped);

        assert_eq!(shell.handle_key(RemoteKey::Return).await, Flow::Exit);
    }

    #[tokio::test]
    async fn test_back_exits_immediately_when_idle() {
        let mut shell = seeded_shell().await;
        assert_eq!(shell.handle_key(RemoteKey::Return).await, Flow::Exit);
    }

    #[tokio::test]
    async fn test_digit_zero_clears_screen_log() {
        let mut shell = demo_shell();
        assert!(!shell.screen_log().is_empty());

        shell.handle_key(RemoteKey::Digit0).await;
        assert!(shell.screen_log().is_empty());
    }

    #[tokio::test]
    async fn test_uhd_toggle_requires_panel_support() {
        let mut shell = demo_shell();

        shell.handle_key(RemoteKey::Digit1).await;
        assert!(shell
            .screen_log()
            .lines()
            .any(|line| line.contains("not have a panel")));
        assert!(!shell.uhd_enabled);
    }

    #[tokio::test]
    async fn test_uhd_toggle_flips_on_capable_panel() {
        let caps = DeviceCaps {
            uhd_panel: true,
            ..DeviceCaps::default()
        };
        let mut shell = Shell::new(LogBackend::new(), demo_registry(), caps);

        shell.handle_key(RemoteKey::Digit1).await;
        assert!(shell.screen_log().lines().any(|l| l.contains("4k enabled")));
        assert!(shell.uhd_enabled);

        shell.handle_key(RemoteKey::Digit1).await;
        assert!(shell.screen_log().lines().any(|l| l.contains("4k disabled")));
        assert!(!shell.uhd_enabled);
    }

    #[tokio::test]
    async fn test_track_and_property_dumps_reach_screen_log() {
        let mut shell = seeded_shell().await;
        shell.handle_key(RemoteKey::MediaPlayPause).await;

        shell.handle_key(RemoteKey::Digit2).await;
        assert!(shell.screen_log().lines().any(|l| l.contains("tracks")));

        shell.handle_key(RemoteKey::Digit3).await;
        assert!(shell.screen_log().lines().any(|l| l.contains("fullscreen")));
    }

    #[tokio::test]
    async fn test_run_applies_cycled_mode_before_next_key() {
        let mut shell = demo_shell();
        let (tx, rx) = mpsc::channel(8);

        tx.send(RemoteKey::Down).await.unwrap();
        tx.send(RemoteKey::MediaPlayPause).await.unwrap();
        drop(tx);

        shell.run(rx).await;

        assert_eq!(shell.source_mode(), Some("PLAYREADY"));
        assert_eq!(shell.state(), PlayerState::Playing);
    }

    #[tokio::test]
    async fn test_run_exits_on_back_when_inactive() {
        let mut shell = demo_shell();
        let (tx, rx) = mpsc::channel(8);

        tx.send(RemoteKey::Return).await.unwrap();

        shell.run(rx).await;
        assert_eq!(shell.state(), PlayerState::Idle);
    }
}
