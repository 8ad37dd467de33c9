//! Stream resolution pipeline
//!
//! Turns a content query into a playable stream URL through three stages:
//! discover a candidate, fetch its access token, fetch and scan its master
//! playlist. The retry policy is mode-dependent: live candidates are
//! ephemeral, so a candidate that keeps failing is skipped by advancing
//! the listing offset and rediscovering; on-demand content is static, so
//! the same candidate is retried for as long as it takes. There is no
//! terminal failure; a long-running TV appliance has no screen for
//! "no content", so the pipeline retries until it succeeds.

use crate::api::PlatformGateway;
use crate::error::{Error, Result};
use crate::playlist::StreamEntryExtractor;
use crate::types::{
    AccessToken, ContentIdentifier, ContentQuery, CycleId, ResolvedStream, ResolverConfig,
    StreamKind,
};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};
use url::Url;

/// Pipeline stage of a resolution cycle, carrying what the stage needs
#[derive(Debug, Clone)]
enum CycleStage {
    Discovering,
    FetchingToken {
        identifier: ContentIdentifier,
    },
    FetchingLink {
        identifier: ContentIdentifier,
        token: AccessToken,
    },
}

impl CycleStage {
    fn name(&self) -> &'static str {
        match self {
            CycleStage::Discovering => "discovering",
            CycleStage::FetchingToken { .. } => "fetching_token",
            CycleStage::FetchingLink { .. } => "fetching_link",
        }
    }

    fn is_discovery(&self) -> bool {
        matches!(self, CycleStage::Discovering)
    }
}

/// Decision taken after a stage failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryStep {
    /// Run the failed stage again with the same inputs
    RetryStage,
    /// Give up on the candidate: advance the listing offset and restart
    /// discovery as a fresh cycle
    SkipCandidate,
}

/// Pure retry-policy decision
///
/// `failures` counts consecutive failures of the current stage, including
/// the one just observed. Discovery failures model a flaky listing call
/// rather than dead content and always retry in place; past discovery,
/// only live candidates have bounded patience.
fn retry_step(
    kind: StreamKind,
    stage: &CycleStage,
    failures: u32,
    config: &ResolverConfig,
) -> RetryStep {
    if stage.is_discovery() {
        return RetryStep::RetryStage;
    }
    match kind {
        StreamKind::OnDemand => RetryStep::RetryStage,
        StreamKind::Live if failures < config.max_stage_attempts => RetryStep::RetryStage,
        StreamKind::Live => RetryStep::SkipCandidate,
    }
}

/// Mutable state of a cycle chain
#[derive(Debug)]
struct CycleState {
    cycle: CycleId,
    query: ContentQuery,
    stage: CycleStage,
    /// Consecutive failures of the current stage
    stage_failures: u32,
}

impl CycleState {
    fn new(query: ContentQuery) -> Self {
        Self {
            cycle: CycleId::new(),
            query,
            stage: CycleStage::Discovering,
            stage_failures: 0,
        }
    }

    /// Enter `stage`, resetting the consecutive-failure counter
    fn enter(&mut self, stage: CycleStage) {
        self.stage = stage;
        self.stage_failures = 0;
    }

    /// Drop the current candidate and restart discovery on the next
    /// listing page under a fresh cycle id
    fn skip_candidate(&mut self) {
        self.query.offset += 1;
        self.cycle = CycleId::new();
        self.enter(CycleStage::Discovering);
    }
}

/// Resolves content queries into playable stream URLs
pub struct ContentResolver<G> {
    gateway: G,
    extractor: StreamEntryExtractor,
    config: ResolverConfig,
}

impl<G: PlatformGateway> ContentResolver<G> {
    /// Create a resolver with the default retry configuration
    pub fn new(gateway: G) -> Self {
        Self::with_config(gateway, ResolverConfig::default())
    }

    pub fn with_config(gateway: G, config: ResolverConfig) -> Self {
        Self {
            gateway,
            extractor: StreamEntryExtractor::new(),
            config,
        }
    }

    /// Resolve a playable stream URL for `query`
    ///
    /// Runs cycles of discovery, token fetch and link fetch until one
    /// succeeds. Live queries may return a candidate from a later listing
    /// page than the one asked for, when earlier candidates had to be
    /// skipped.
    #[instrument(skip(self), fields(kind = %query.kind, offset = query.offset))]
    pub async fn resolve(&self, query: ContentQuery) -> ResolvedStream {
        let mut state = CycleState::new(query);
        info!(cycle = %state.cycle, "Resolution started");

        loop {
            match self.step(&mut state).await {
                Ok(Some(stream)) => {
                    info!(
                        cycle = %stream.cycle,
                        identifier = %stream.identifier,
                        url = %stream.url,
                        "Stream resolved"
                    );
                    return stream;
                }
                Ok(None) => {}
                Err(err) => self.handle_failure(&mut state, &err).await,
            }
        }
    }

    /// Run one attempt of the current stage; `Ok(None)` means the cycle
    /// advanced to its next stage
    async fn step(&self, state: &mut CycleState) -> Result<Option<ResolvedStream>> {
        match state.stage.clone() {
            CycleStage::Discovering => {
                let identifier = self.gateway.discover(state.query).await?;
                info!(cycle = %state.cycle, identifier = %identifier, "Candidate discovered");
                state.enter(CycleStage::FetchingToken { identifier });
                Ok(None)
            }
            CycleStage::FetchingToken { identifier } => {
                let token = self
                    .gateway
                    .access_token(state.query.kind, &identifier)
                    .await?;
                info!(cycle = %state.cycle, identifier = %identifier, "Access token acquired");
                state.enter(CycleStage::FetchingLink { identifier, token });
                Ok(None)
            }
            CycleStage::FetchingLink { identifier, token } => {
                let playlist = self
                    .gateway
                    .fetch_playlist(state.query.kind, &identifier, &token)
                    .await?;
                let stream = self.select_stream(state, identifier, &playlist)?;
                Ok(Some(stream))
            }
        }
    }

    /// Pick the stream URL out of the playlist text
    ///
    /// Always the third line of the first extracted block; later blocks
    /// are alternate renditions and deliberately ignored. The line must
    /// parse as an absolute URL but is kept verbatim.
    fn select_stream(
        &self,
        state: &CycleState,
        identifier: ContentIdentifier,
        playlist: &str,
    ) -> Result<ResolvedStream> {
        let entries = self.extractor.extract(playlist);
        let entry = entries.first().ok_or(Error::NoStreamEntry)?;

        let uri = entry.uri();
        Url::parse(uri)
            .map_err(|e| Error::LinkFetch(format!("unusable stream link {:?}: {}", uri, e)))?;

        Ok(ResolvedStream {
            url: uri.to_string(),
            identifier,
            kind: state.query.kind,
            cycle: state.cycle,
        })
    }

    async fn handle_failure(&self, state: &mut CycleState, err: &Error) {
        state.stage_failures += 1;
        warn!(
            cycle = %state.cycle,
            stage = state.stage.name(),
            kind = %state.query.kind,
            offset = state.query.offset,
            failures = state.stage_failures,
            code = err.error_code(),
            error = %err,
            "Resolution stage failed"
        );

        match retry_step(state.query.kind, &state.stage, state.stage_failures, &self.config) {
            RetryStep::RetryStage => {}
            RetryStep::SkipCandidate => {
                info!(
                    cycle = %state.cycle,
                    next_offset = state.query.offset + 1,
                    "Candidate given up on, advancing listing offset"
                );
                state.skip_candidate();
            }
        }

        if self.config.retry_delay_ms > 0 {
            sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
        }
    }
}
