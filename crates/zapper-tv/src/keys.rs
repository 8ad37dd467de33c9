//! Remote-control key handling
//!
//! The TV input service delivers remote presses as numeric key codes. Media
//! and digit keys must be registered by name before they are delivered at
//! all; arrows, Enter and Return always arrive. This module maps codes and
//! names to typed keys and binds each key to a shell action.

use zapper_core::Direction;

/// Key names the platform input service must be asked to deliver.
pub const REGISTERED_KEYS: [&str; 10] = [
    "MediaPause",
    "MediaPlay",
    "MediaPlayPause",
    "MediaFastForward",
    "MediaRewind",
    "MediaStop",
    "0",
    "1",
    "2",
    "3",
];

/// A remote key the shell reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKey {
    Enter,
    Up,
    Down,
    MediaPlayPause,
    MediaPlay,
    MediaPause,
    MediaStop,
    MediaFastForward,
    MediaRewind,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Return,
}

/// What the shell does in response to a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellAction {
    /// Toggle windowed and fullscreen display
    ToggleFullscreen,
    /// Move the DRM mode focus and reconfigure playback
    CycleMode(Direction),
    /// Toggle between playing and paused
    PlayPause,
    /// Stop playback
    Stop,
    /// Jump forward
    FastForward,
    /// Jump backward
    Rewind,
    /// Clear the on-screen log
    ClearLog,
    /// Toggle UHD output, subject to panel support
    ToggleUhd,
    /// Dump the stream's track list
    ShowTracks,
    /// Dump current playback properties
    ShowProperties,
    /// Stop active playback, or leave the shell when idle
    Back,
}

impl RemoteKey {
    /// Maps a `keydown` code from the remote. Unknown codes yield `None`.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            13 => Some(Self::Enter),
            38 => Some(Self::Up),
            40 => Some(Self::Down),
            10252 => Some(Self::MediaPlayPause),
            415 => Some(Self::MediaPlay),
            19 => Some(Self::MediaPause),
            413 => Some(Self::MediaStop),
            417 => Some(Self::MediaFastForward),
            412 => Some(Self::MediaRewind),
            48 => Some(Self::Digit0),
            49 => Some(Self::Digit1),
            50 => Some(Self::Digit2),
            51 => Some(Self::Digit3),
            10009 => Some(Self::Return),
            _ => None,
        }
    }

    /// Maps a key by registered name, falling back to numeric codes so dev
    /// harness input can carry either form. Digit names win over their
    /// single-digit code interpretation.
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "Enter" => Some(Self::Enter),
            "Up" => Some(Self::Up),
            "Down" => Some(Self::Down),
            "MediaPlayPause" => Some(Self::MediaPlayPause),
            "MediaPlay" => Some(Self::MediaPlay),
            "MediaPause" => Some(Self::MediaPause),
            "MediaStop" => Some(Self::MediaStop),
            "MediaFastForward" => Some(Self::MediaFastForward),
            "MediaRewind" => Some(Self::MediaRewind),
            "0" => Some(Self::Digit0),
            "1" => Some(Self::Digit1),
            "2" => Some(Self::Digit2),
            "3" => Some(Self::Digit3),
            "Return" => Some(Self::Return),
            other => other.parse::<u32>().ok().and_then(Self::from_code),
        }
    }

    /// The action bound to this key.
    ///
    /// The three media transport keys share one toggle; remotes commonly
    /// carry only a combined play/pause button.
    pub fn action(&self) -> ShellAction {
        match self {
            Self::Enter => ShellAction::ToggleFullscreen,
            Self::Up => ShellAction::CycleMode(Direction::Previous),
            Self::Down => ShellAction::CycleMode(Direction::Next),
            Self::MediaPlayPause | Self::MediaPlay | Self::MediaPause => ShellAction::PlayPause,
            Self::MediaStop => ShellAction::Stop,
            Self::MediaFastForward => ShellAction::FastForward,
            Self::MediaRewind => ShellAction::Rewind,
            Self::Digit0 => ShellAction::ClearLog,
            Self::Digit1 => ShellAction::ToggleUhd,
            Self::Digit2 => ShellAction::ShowTracks,
            Self::Digit3 => ShellAction::ShowProperties,
            Self::Return => ShellAction::Back,
        }
    }
}
