//! DRM mode registry
//!
//! The player exposes a small ordered set of playback configurations the
//! viewer can step through from the remote: the resolved platform stream
//! (no DRM) plus demo entries for the protected pipelines. The registry
//! owns the ordering and the focused entry and broadcasts every selection
//! change; rendering the list is the shell's concern.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

/// Key of the passthrough entry carrying the resolved stream
pub const NO_DRM_KEY: &str = "NO_DRM";

/// Demo PlayReady manifest
pub const PLAYREADY_DEMO_URL: &str =
    "http://playready.directtaps.net/smoothstreaming/SSWSS720H264PR/SuperSpeedway_720.ism/Manifest";

/// Demo PlayReady license server
pub const PLAYREADY_DEMO_LICENSE_SERVER: &str =
    "http://playready.directtaps.net/pr/svc/rightsmanager.asmx?PlayRight=1&UseSimpleNonPersistentLicense=1";

/// Demo Widevine content
pub const WIDEVINE_DEMO_URL: &str =
    "http://commondatastorage.googleapis.com/wvmedia/starz_main_720p_6br_tp.wvm";

/// Demo Widevine license server
pub const WIDEVINE_DEMO_LICENSE_SERVER: &str =
    "https://license.uat.widevine.com/getlicense/widevine";

/// One playable configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrmConfig {
    /// Stable identifier (`NO_DRM`, `PLAYREADY`, ...)
    pub key: String,
    /// Display name for the shell
    pub name: String,
    /// Content URL handed to the playback backend
    pub url: String,
    /// License server URL; `Some("")` means the application performs the
    /// license challenge itself
    pub license_server: Option<String>,
    /// Opaque data forwarded to the license request
    pub custom_data: Option<String>,
}

impl DrmConfig {
    pub fn new(key: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            url: url.into(),
            license_server: None,
            custom_data: None,
        }
    }

    /// The passthrough entry; its url is filled in once resolution finishes
    pub fn passthrough() -> Self {
        Self::new(NO_DRM_KEY, "Live", "")
    }

    pub fn with_license_server(mut self, server: impl Into<String>) -> Self {
        self.license_server = Some(server.into());
        self
    }

    pub fn with_custom_data(mut self, data: impl Into<String>) -> Self {
        self.custom_data = Some(data.into());
        self
    }

    /// True for the entry that plays the resolved platform stream
    pub fn is_passthrough(&self) -> bool {
        self.key == NO_DRM_KEY
    }
}

/// Cycle direction through the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Ordered DRM mode list with one focused entry
///
/// The passthrough entry is always present and always first. Cycling wraps
/// at both ends, so there is a current selection at all times.
pub struct DrmModeRegistry {
    modes: Vec<DrmConfig>,
    focused: usize,
    selection_tx: watch::Sender<DrmConfig>,
}

impl DrmModeRegistry {
    /// Build a registry from `modes`, forcing the passthrough entry to
    /// exist and sit at position zero
    pub fn new(mut modes: Vec<DrmConfig>) -> Self {
        match modes.iter().position(|m| m.is_passthrough()) {
            Some(0) => {}
            Some(i) => {
                let entry = modes.remove(i);
                modes.insert(0, entry);
            }
            None => modes.insert(0, DrmConfig::passthrough()),
        }

        let (selection_tx, _) = watch::channel(modes[0].clone());
        Self {
            modes,
            focused: 0,
            selection_tx,
        }
    }

    /// Registry preloaded with the demo DRM entries
    pub fn with_demo_modes() -> Self {
        Self::new(vec![
            DrmConfig::passthrough(),
            DrmConfig::new("PLAYREADY", "Playready", PLAYREADY_DEMO_URL)
                .with_license_server(PLAYREADY_DEMO_LICENSE_SERVER)
                .with_custom_data(""),
            DrmConfig::new("PLAYREADY_GET_CHALLENGE", "Playready GetChallenge", PLAYREADY_DEMO_URL)
                .with_license_server("")
                .with_custom_data(""),
            DrmConfig::new("WIDEVINE", "Widevine", WIDEVINE_DEMO_URL)
                .with_license_server(WIDEVINE_DEMO_LICENSE_SERVER)
                .with_custom_data(""),
        ])
    }

    /// Currently focused entry
    pub fn current(&self) -> &DrmConfig {
        &self.modes[self.focused]
    }

    /// All entries, in cycle order
    pub fn modes(&self) -> &[DrmConfig] {
        &self.modes
    }

    /// Move focus one step and broadcast the new selection
    pub fn cycle(&mut self, direction: Direction) -> &DrmConfig {
        let len = self.modes.len();
        self.focused = match direction {
            Direction::Next => (self.focused + 1) % len,
            Direction::Previous => (self.focused + len - 1) % len,
        };

        let current = self.modes[self.focused].clone();
        info!(mode = %current.key, name = %current.name, "DRM mode focused");
        let _ = self.selection_tx.send(current);

        &self.modes[self.focused]
    }

    /// Subscribe to selection changes
    pub fn subscribe(&self) -> watch::Receiver<DrmConfig> {
        self.selection_tx.subscribe()
    }

    /// Store the resolved stream URL in the passthrough entry
    ///
    /// Other entries keep their static demo content. Re-broadcasts when the
    /// passthrough entry is the focused one so an already-applied selection
    /// picks up the new URL.
    pub fn set_resolved_url(&mut self, url: &str) {
        if let Some(entry) = self.modes.iter_mut().find(|m| m.is_passthrough()) {
            entry.url = url.to_string();
            debug!(url = %url, "Passthrough stream url updated");
        }

        if self.modes[self.focused].is_passthrough() {
            let _ = self.selection_tx.send(self.modes[self.focused].clone());
        }
    }
}

impl Default for DrmModeRegistry {
    fn default() -> Self {
        Self::with_demo_modes()
    }
}
