//! Core types for Zapper

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one resolution cycle
///
/// A new cycle starts every time the resolver enters discovery, including
/// restarts caused by skipping an unusable candidate. The id is carried
/// through log events so retries stay attributable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(pub Uuid);

impl CycleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of content the pipeline resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    /// A currently-broadcasting channel
    Live,
    /// An archived broadcast (VOD)
    OnDemand,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Live => write!(f, "live"),
            StreamKind::OnDemand => write!(f, "vod"),
        }
    }
}

/// What the pipeline is currently looking for
///
/// `offset` pages the live discovery listing; only the resolver advances it,
/// and only when a live candidate has been given up on. It is meaningless
/// for on-demand content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentQuery {
    pub kind: StreamKind,
    pub offset: u64,
}

impl ContentQuery {
    /// Query for the top live channel
    pub fn live() -> Self {
        Self { kind: StreamKind::Live, offset: 0 }
    }

    /// Query for the most-viewed archived broadcast
    pub fn on_demand() -> Self {
        Self { kind: StreamKind::OnDemand, offset: 0 }
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}

/// Platform-side identifier for a discovered candidate
///
/// Holds a channel login for live content, or a video id with the
/// platform's one-character prefix already stripped for on-demand content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentIdentifier(String);

impl ContentIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access token pair returned by the platform token endpoint
///
/// Valid for a single playlist request; the resolver never stores one
/// across cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// Hex signature, sent verbatim
    #[serde(rename = "sig")]
    pub signature: String,
    /// Opaque token blob, percent-encoded before use in a URL
    pub token: String,
}

/// Outcome of a successful resolution cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedStream {
    /// Playable variant URI taken from the playlist, verbatim
    ///
    /// Validated to parse as an absolute URL but not normalized; the
    /// playback engine receives exactly what the playlist carried.
    pub url: String,
    /// Candidate the stream belongs to
    pub identifier: ContentIdentifier,
    pub kind: StreamKind,
    /// Cycle that produced this result
    pub cycle: CycleId,
}

/// Resolver retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Consecutive same-stage failures tolerated for a live candidate
    /// before discovery moves to the next offset
    pub max_stage_attempts: u32,
    /// Delay between retry attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_stage_attempts: 5,
            retry_delay_ms: 1000,
        }
    }
}

/// Native player states surfaced through the playback boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerState {
    /// No content prepared
    Idle,
    /// Content is playing
    Playing,
    /// Playback paused
    Paused,
    /// Playback stopped, content still prepared
    Stopped,
}

impl PlayerState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: PlayerState) -> bool {
        use PlayerState::*;
        matches!(
            (self, target),
            // From Idle
            (Idle, Playing) |
            // From Playing
            (Playing, Paused) | (Playing, Stopped) |
            // From Paused
            (Paused, Playing) | (Paused, Stopped) |
            // From Stopped
            (Stopped, Playing) | (Stopped, Idle)
        )
    }

    /// True when the native player holds prepared or running content
    pub fn is_active(&self) -> bool {
        !matches!(self, PlayerState::Idle)
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerState::Idle => write!(f, "idle"),
            PlayerState::Playing => write!(f, "playing"),
            PlayerState::Paused => write!(f, "paused"),
            PlayerState::Stopped => write!(f, "stopped"),
        }
    }
}
