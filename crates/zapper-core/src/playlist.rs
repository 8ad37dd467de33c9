//! Variant extraction from master playlists
//!
//! The platform's usher endpoint answers with an HLS master playlist in
//! which every playable variant is announced as a fixed three-line block:
//! an `#EXT-X-MEDIA:` line, an `#EXT-X-STREAM-INF:` line, then the variant
//! URI. The player only ever needs those URIs, so this module scans for
//! the blocks instead of parsing the playlist grammar.

use regex::Regex;

/// Three-line variant block pattern; `.` stops at line ends so each
/// group binds to exactly one line
const BLOCK_PATTERN: &str = "#EXT-X-MEDIA:.*\n#EXT-X-STREAM-INF:.*\n.*";

/// One matched variant block, kept as raw text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    text: String,
}

impl StreamEntry {
    /// Full matched block
    pub fn raw(&self) -> &str {
        &self.text
    }

    /// Variant URI, the third line of the block
    pub fn uri(&self) -> &str {
        self.text.splitn(3, '\n').nth(2).unwrap_or("")
    }
}

/// Scanner for variant blocks in master playlist text
pub struct StreamEntryExtractor {
    block: Regex,
}

impl StreamEntryExtractor {
    pub fn new() -> Self {
        Self {
            block: Regex::new(BLOCK_PATTERN).expect("valid variant block pattern"),
        }
    }

    /// Extract all variant blocks, in playlist order
    ///
    /// Non-overlapping left-to-right scan. Text with no blocks yields an
    /// empty vector; callers decide whether that is an error.
    pub fn extract(&self, playlist: &str) -> Vec<StreamEntry> {
        self.block
            .find_iter(playlist)
            .map(|m| StreamEntry { text: m.as_str().to_string() })
            .collect()
    }
}

impl Default for StreamEntryExtractor {
    fn default() -> Self {
        Self::new()
    }
}
