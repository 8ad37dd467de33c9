//! HTTP client for the streaming platform's public API
//!
//! Three endpoints drive resolution: the kraken listing endpoints that
//! discover a candidate, the access-token endpoint, and the usher playlist
//! endpoint. Live and on-demand content share the client but hit different
//! paths and query parameter names.

use crate::error::{Error, Result};
use crate::types::{AccessToken, ContentIdentifier, ContentQuery, StreamKind};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Default API base URL (discovery and token endpoints)
pub const DEFAULT_API_BASE: &str = "https://api.twitch.tv";

/// Default usher base URL (playlist endpoint)
pub const DEFAULT_USHER_BASE: &str = "http://usher.twitch.tv";

/// Demo application client id, sent as `Client-ID` on every request
pub const DEFAULT_CLIENT_ID: &str = "ypvnuqrh98wqz1sr0ov3fgfu4jh1yx";

/// Default timeout for platform requests
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

// ---------------------------------------------------------------------------
// Wire models
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LiveStreamsResponse {
    streams: Vec<LiveStream>,
}

#[derive(Debug, Deserialize)]
struct LiveStream {
    channel: LiveChannel,
}

#[derive(Debug, Deserialize)]
struct LiveChannel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TopVideosResponse {
    videos: Vec<TopVideo>,
}

#[derive(Debug, Deserialize)]
struct TopVideo {
    #[serde(rename = "_id")]
    id: String,
}

/// Video ids arrive with a one-character type prefix (`v123456` style);
/// the token and playlist endpoints want the bare number.
fn strip_video_prefix(raw: &str) -> Option<&str> {
    raw.get(1..).filter(|rest| !rest.is_empty())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Gateway to the platform endpoints the resolver drives
///
/// `PlatformClient` is the production implementation; the resolver is
/// generic over this trait so retry behavior can be exercised against
/// scripted fakes.
#[async_trait]
pub trait PlatformGateway: Send + Sync {
    /// Discover the next candidate for `query`
    async fn discover(&self, query: ContentQuery) -> Result<ContentIdentifier>;

    /// Fetch the access token for a discovered candidate
    async fn access_token(
        &self,
        kind: StreamKind,
        id: &ContentIdentifier,
    ) -> Result<AccessToken>;

    /// Fetch the master playlist for a candidate
    async fn fetch_playlist(
        &self,
        kind: StreamKind,
        id: &ContentIdentifier,
        token: &AccessToken,
    ) -> Result<String>;
}

/// Platform HTTP client
///
/// One reqwest client shared across all three resolution stages. Base URLs
/// and the client id are overridable so tests can point at a mock server.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    client: Client,
    api_base: String,
    usher_base: String,
    client_id: String,
    request_timeout: Duration,
}

impl PlatformClient {
    /// Create a client with default settings
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for configuring the client
    pub fn builder() -> PlatformClientBuilder {
        PlatformClientBuilder::default()
    }

    /// Discover the next candidate for `query`
    ///
    /// Live queries page the stream listing with `query.offset`; on-demand
    /// queries always ask for the most-viewed archived broadcast. Every
    /// failure mode here (network, timeout, bad status, malformed body,
    /// empty listing) is a discovery failure.
    #[instrument(skip(self))]
    pub async fn discover(&self, query: ContentQuery) -> Result<ContentIdentifier> {
        match query.kind {
            StreamKind::Live => self.discover_live(query.offset).await,
            StreamKind::OnDemand => self.discover_on_demand().await,
        }
    }

    async fn discover_live(&self, offset: u64) -> Result<ContentIdentifier> {
        let mut url = Url::parse(&format!("{}/kraken/streams", self.api_base))
            .map_err(|e| Error::Discovery(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("limit", "1")
            .append_pair("offset", &offset.to_string());

        debug!(url = %url, "Discovering live channel");

        let response: LiveStreamsResponse = self.get_json(url, Error::Discovery).await?;

        let stream = response
            .streams
            .into_iter()
            .next()
            .ok_or_else(|| Error::Discovery(format!("no live streams at offset {}", offset)))?;

        if stream.channel.name.is_empty() {
            return Err(Error::Discovery("empty channel name in listing".into()));
        }

        Ok(ContentIdentifier::new(stream.channel.name))
    }

    async fn discover_on_demand(&self) -> Result<ContentIdentifier> {
        let mut url = Url::parse(&format!("{}/kraken/videos/top", self.api_base))
            .map_err(|e| Error::Discovery(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("limit", "1")
            .append_pair("broadcast_type", "archive")
            .append_pair("sort", "views");

        debug!(url = %url, "Discovering top archived video");

        let response: TopVideosResponse = self.get_json(url, Error::Discovery).await?;

        let video = response
            .videos
            .into_iter()
            .next()
            .ok_or_else(|| Error::Discovery("no archived videos in listing".into()))?;

        let id = strip_video_prefix(&video.id)
            .ok_or_else(|| Error::Discovery(format!("unusable video id {:?}", video.id)))?;

        Ok(ContentIdentifier::new(id))
    }

    /// Fetch the access token for a discovered candidate
    #[instrument(skip(self))]
    pub async fn access_token(
        &self,
        kind: StreamKind,
        id: &ContentIdentifier,
    ) -> Result<AccessToken> {
        let segment = match kind {
            StreamKind::Live => "channels",
            StreamKind::OnDemand => "vods",
        };
        let url = Url::parse(&format!(
            "{}/api/{}/{}/access_token",
            self.api_base, segment, id
        ))
        .map_err(|e| Error::TokenFetch(e.to_string()))?;

        debug!(url = %url, "Fetching access token");

        self.get_json(url, Error::TokenFetch).await
    }

    /// Build the usher playlist URL for a candidate and its token
    ///
    /// Live and on-demand requests use different paths and different
    /// signature/token parameter names; everything else is shared. The
    /// token blob is percent-encoded, the signature is sent verbatim.
    pub fn playlist_url(
        &self,
        kind: StreamKind,
        id: &ContentIdentifier,
        token: &AccessToken,
    ) -> Result<Url> {
        let encoded = urlencoding::encode(&token.token);
        let raw = match kind {
            StreamKind::Live => format!(
                "{}/api/channel/hls/{}.m3u8?player=twitchweb&type=any&sig={}&token={}&allow_source=true&allow_audi_only=true",
                self.usher_base, id, token.signature, encoded
            ),
            StreamKind::OnDemand => format!(
                "{}/vod/{}.m3u8?player=twitchweb&type=any&nauthsig={}&nauth={}&allow_source=true&allow_audi_only=true",
                self.usher_base, id, token.signature, encoded
            ),
        };
        Url::parse(&raw).map_err(|e| Error::LinkFetch(e.to_string()))
    }

    /// Fetch the master playlist for a candidate
    ///
    /// Returns the raw playlist text; variant extraction is the caller's
    /// concern.
    #[instrument(skip(self, token))]
    pub async fn fetch_playlist(
        &self,
        kind: StreamKind,
        id: &ContentIdentifier,
        token: &AccessToken,
    ) -> Result<String> {
        let url = self.playlist_url(kind, id, token)?;

        debug!(url = %url, "Fetching master playlist");

        let response = self
            .client
            .get(url)
            .header("Client-ID", &self.client_id)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| Error::LinkFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::LinkFetch(format!(
                "usher returned status {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::LinkFetch(e.to_string()))
    }

    async fn get_json<T, F>(&self, url: Url, stage_error: F) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
        F: Fn(String) -> Error,
    {
        let response = self
            .client
            .get(url)
            .header("Client-ID", &self.client_id)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| stage_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(stage_error(format!(
                "API returned error status: {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| stage_error(e.to_string()))
    }
}

#[async_trait]
impl PlatformGateway for PlatformClient {
    async fn discover(&self, query: ContentQuery) -> Result<ContentIdentifier> {
        PlatformClient::discover(self, query).await
    }

    async fn access_token(
        &self,
        kind: StreamKind,
        id: &ContentIdentifier,
    ) -> Result<AccessToken> {
        PlatformClient::access_token(self, kind, id).await
    }

    async fn fetch_playlist(
        &self,
        kind: StreamKind,
        id: &ContentIdentifier,
        token: &AccessToken,
    ) -> Result<String> {
        PlatformClient::fetch_playlist(self, kind, id, token).await
    }
}

/// Builder for configuring a PlatformClient
#[derive(Debug)]
pub struct PlatformClientBuilder {
    api_base: String,
    usher_base: String,
    client_id: String,
    request_timeout: Duration,
}

impl Default for PlatformClientBuilder {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            usher_base: DEFAULT_USHER_BASE.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

impl PlatformClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API base URL (discovery and token endpoints)
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    /// Set the usher base URL (playlist endpoint)
    pub fn usher_base(mut self, url: impl Into<String>) -> Self {
        self.usher_base = url.into();
        self
    }

    /// Set the client id header value
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = id.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<PlatformClient> {
        let api_base = self.api_base.trim_end_matches('/').to_string();
        let usher_base = self.usher_base.trim_end_matches('/').to_string();

        Url::parse(&api_base)
            .map_err(|e| Error::InvalidConfig(format!("api base {:?}: {}", api_base, e)))?;
        Url::parse(&usher_base)
            .map_err(|e| Error::InvalidConfig(format!("usher base {:?}: {}", usher_base, e)))?;

        let client = Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        Ok(PlatformClient {
            client,
            api_base,
            usher_base,
            client_id: self.client_id,
            request_timeout: self.request_timeout,
        })
    }
}
