//! Integration tests for Zapper Core
//!
//! Drives the real platform client and resolver against a mock platform,
//! covering the retry policy boundaries end to end.

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zapper_core::api::DEFAULT_CLIENT_ID;
use zapper_core::{
    ContentQuery, ContentResolver, DrmModeRegistry, PlatformClient, ResolverConfig, StreamKind,
};

const MASTER: &str = "#EXT-X-MEDIA:TYPE=VIDEO,NAME=\"Source\"\n\
#EXT-X-STREAM-INF:BANDWIDTH=3000000\n\
http://edge.example.com/chunked/index.m3u8\n";

fn live_listing(name: &str) -> serde_json::Value {
    json!({ "streams": [ { "channel": { "name": name } } ] })
}

fn vod_listing(id: &str) -> serde_json::Value {
    json!({ "videos": [ { "_id": id } ] })
}

fn token_body(sig: &str) -> serde_json::Value {
    json!({ "sig": sig, "token": r#"{"user_id":null,"chansub":1}"# })
}

fn test_client(server: &MockServer) -> PlatformClient {
    PlatformClient::builder()
        .api_base(server.uri())
        .usher_base(server.uri())
        .build()
        .unwrap()
}

fn fast_resolver(client: PlatformClient) -> ContentResolver<PlatformClient> {
    ContentResolver::with_config(
        client,
        ResolverConfig {
            max_stage_attempts: 5,
            retry_delay_ms: 0,
        },
    )
}

// =============================================================================
// Live resolution
// =============================================================================

#[tokio::test]
async fn test_live_resolution_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/kraken/streams"))
        .and(query_param("limit", "1"))
        .and(query_param("offset", "0"))
        .and(header("Client-ID", DEFAULT_CLIENT_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_listing("somechannel")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/channels/somechannel/access_token"))
        .and(header("Client-ID", DEFAULT_CLIENT_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("deadbeef")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/channel/hls/somechannel.m3u8"))
        .and(query_param("player", "twitchweb"))
        .and(query_param("type", "any"))
        .and(query_param("sig", "deadbeef"))
        .and(query_param("token", r#"{"user_id":null,"chansub":1}"#))
        .and(query_param("allow_source", "true"))
        .and(query_param("allow_audi_only", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MASTER))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = fast_resolver(test_client(&server));
    let stream = resolver.resolve(ContentQuery::live()).await;

    assert_eq!(stream.url, "http://edge.example.com/chunked/index.m3u8");
    assert_eq!(stream.identifier.as_str(), "somechannel");
    assert_eq!(stream.kind, StreamKind::Live);
}

#[tokio::test]
async fn test_live_five_token_failures_advance_offset() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/kraken/streams"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_listing("dead")))
        .expect(1)
        .mount(&server)
        .await;

    // The dead candidate's token endpoint fails every time; the resolver
    // must ask exactly five times before moving on
    Mock::given(method("GET"))
        .and(path("/api/channels/dead/access_token"))
        .respond_with(ResponseTemplate::new(410))
        .expect(5)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/kraken/streams"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_listing("alive")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/channels/alive/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("cafe")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/channel/hls/alive.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MASTER))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = fast_resolver(test_client(&server));
    let stream = resolver.resolve(ContentQuery::live()).await;

    assert_eq!(stream.identifier.as_str(), "alive");
}

#[tokio::test]
async fn test_live_transient_failures_keep_candidate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/kraken/streams"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_listing("flaky")))
        .expect(1)
        .mount(&server)
        .await;

    // Four failures stay under the cap, so the same candidate recovers
    // and discovery is never re-queried
    Mock::given(method("GET"))
        .and(path("/api/channels/flaky/access_token"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(4)
        .expect(4)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/channels/flaky/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("cafe")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/channel/hls/flaky.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MASTER))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = fast_resolver(test_client(&server));
    let stream = resolver.resolve(ContentQuery::live()).await;

    assert_eq!(stream.identifier.as_str(), "flaky");
}

#[tokio::test]
async fn test_timeout_counts_like_any_other_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/kraken/streams"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_listing("slow")))
        .expect(1)
        .mount(&server)
        .await;

    // Responses slower than the client timeout: five timed-out attempts
    // must advance the offset exactly like five error statuses
    Mock::given(method("GET"))
        .and(path("/api/channels/slow/access_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("late"))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(5)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/kraken/streams"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_listing("fast")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/channels/fast/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("cafe")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/channel/hls/fast.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MASTER))
        .expect(1)
        .mount(&server)
        .await;

    let client = PlatformClient::builder()
        .api_base(server.uri())
        .usher_base(server.uri())
        .timeout(Duration::from_millis(250))
        .build()
        .unwrap();

    let stream = fast_resolver(client).resolve(ContentQuery::live()).await;
    assert_eq!(stream.identifier.as_str(), "fast");
}

// =============================================================================
// On-demand resolution
// =============================================================================

#[tokio::test]
async fn test_vod_resolution_strips_id_prefix() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/kraken/videos/top"))
        .and(query_param("limit", "1"))
        .and(query_param("broadcast_type", "archive"))
        .and(query_param("sort", "views"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vod_listing("v987654321")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/vods/987654321/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("feed")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vod/987654321.m3u8"))
        .and(query_param("nauthsig", "feed"))
        .and(query_param("nauth", r#"{"user_id":null,"chansub":1}"#))
        .respond_with(ResponseTemplate::new(200).set_body_string(MASTER))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = fast_resolver(test_client(&server));
    let stream = resolver.resolve(ContentQuery::on_demand()).await;

    assert_eq!(stream.identifier.as_str(), "987654321");
    assert_eq!(stream.kind, StreamKind::OnDemand);
}

#[tokio::test]
async fn test_vod_failures_never_advance_paging() {
    let server = MockServer::start().await;

    // Single discovery, no matter how many token failures follow
    Mock::given(method("GET"))
        .and(path("/kraken/videos/top"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vod_listing("v42")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/vods/42/access_token"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(6)
        .expect(6)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/vods/42/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("feed")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vod/42.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MASTER))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = fast_resolver(test_client(&server));
    let stream = resolver.resolve(ContentQuery::on_demand()).await;

    assert_eq!(stream.identifier.as_str(), "42");
}

#[tokio::test]
async fn test_blockless_playlist_retries_link_stage_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/kraken/videos/top"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vod_listing("v42")))
        .expect(1)
        .mount(&server)
        .await;

    // Token endpoint must be hit once: the blockless playlist retries the
    // link fetch with the same token instead of restarting the cycle
    Mock::given(method("GET"))
        .and(path("/api/vods/42/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("feed")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vod/42.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string("#EXTM3U\n#EXT-X-VERSION:3\n"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vod/42.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MASTER))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = fast_resolver(test_client(&server));
    let stream = resolver.resolve(ContentQuery::on_demand()).await;

    assert_eq!(stream.url, "http://edge.example.com/chunked/index.m3u8");
}

// =============================================================================
// Registry wiring
// =============================================================================

#[tokio::test]
async fn test_resolved_url_reaches_passthrough_mode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/kraken/streams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_listing("somechannel")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/channels/somechannel/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("deadbeef")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/channel/hls/somechannel.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MASTER))
        .mount(&server)
        .await;

    let resolver = fast_resolver(test_client(&server));
    let stream = resolver.resolve(ContentQuery::live()).await;

    let mut registry = DrmModeRegistry::with_demo_modes();
    let mut selection = registry.subscribe();
    registry.set_resolved_url(&stream.url);

    assert!(registry.current().is_passthrough());
    assert_eq!(registry.current().url, stream.url);
    // The focused passthrough entry re-broadcasts with the playable URL
    assert!(selection.has_changed().unwrap());
    assert_eq!(selection.borrow_and_update().url, stream.url);
}
