use std::{
    net::TcpListener,
    ops::Range,
    time::{Duration, Instant},
};

use reqwest::StatusCode;
use serde_json::{Value, json};
use sporldl::spotify::auth::{AuthError, TokenProvider};
use sporldl::spotify::playlist::{FetchOutcome, FetchPolicy, PaginatedFetcher};
use sporldl::types::{AccessToken, Credentials};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PLAYLIST_ID: &str = "37i9dQZF1DXcBWIGoYBM5M";

fn tracks_path() -> String {
    format!("/playlists/{}/tracks", PLAYLIST_ID)
}

// Helper function to build one page of playlist items named "Track <n>"
fn page_body(range: Range<usize>, total: usize, next: Option<String>) -> Value {
    let items: Vec<Value> = range
        .map(|i| {
            json!({
                "track": {
                    "name": format!("Track {}", i),
                    "artists": [{ "name": "Some Artist" }]
                }
            })
        })
        .collect();

    json!({ "items": items, "total": total, "next": next })
}

fn provider(server: &MockServer) -> TokenProvider {
    TokenProvider::new(
        Credentials::new("id", "secret"),
        format!("{}/api/token", server.uri()),
    )
}

fn fast_policy() -> FetchPolicy {
    FetchPolicy {
        max_retries: 3,
        backoff_unit: Duration::from_millis(1),
        page_delay: Duration::ZERO,
        page_limit: 100,
    }
}

fn titles(outcome: &FetchOutcome) -> Vec<String> {
    outcome
        .items
        .iter()
        .filter_map(|item| item.track.as_ref())
        .filter_map(|track| track.name.clone())
        .collect()
}

async fn mount_first_page(server: &MockServer, total: usize) {
    Mock::given(method("GET"))
        .and(path(tracks_path()))
        .and(query_param("limit", "100"))
        .and(query_param("offset", "0"))
        .and(header("authorization", "Bearer initial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
            0..100,
            total,
            Some(format!("{}/cursor/2", server.uri())),
        )))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_all_walks_every_page_in_order() {
    let server = MockServer::start().await;
    mount_first_page(&server, 250).await;

    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
            100..200,
            250,
            Some(format!("{}/cursor/3", server.uri())),
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cursor/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(200..250, 250, None)))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = provider(&server);
    let fetcher = PaginatedFetcher::new(server.uri(), &tokens, fast_policy());
    let outcome = fetcher
        .fetch_all(PLAYLIST_ID, AccessToken::new("initial"))
        .await
        .expect("fetch");

    let expected: Vec<String> = (0..250).map(|i| format!("Track {}", i)).collect();
    assert_eq!(titles(&outcome), expected);
    assert_eq!(outcome.total, 250);
    assert_eq!(outcome.retries, 0);
    assert_eq!(outcome.token_refreshes, 0);
    assert!(outcome.complete);
}

#[tokio::test]
async fn test_fetch_all_retries_same_page_with_backoff() {
    let server = MockServer::start().await;
    mount_first_page(&server, 200).await;

    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(100..200, 200, None)))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = provider(&server);
    let fetcher = PaginatedFetcher::new(server.uri(), &tokens, fast_policy());
    let outcome = fetcher
        .fetch_all(PLAYLIST_ID, AccessToken::new("initial"))
        .await
        .expect("fetch");

    assert_eq!(outcome.items.len(), 200);
    assert_eq!(outcome.retries, 2);
    // 2^1 + 2^2 units
    assert_eq!(outcome.backoff_waited, Duration::from_millis(6));
    assert!(outcome.complete);
}

#[tokio::test]
async fn test_fetch_all_returns_partial_result_when_retries_run_out() {
    let server = MockServer::start().await;
    mount_first_page(&server, 300).await;

    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    let tokens = provider(&server);
    let fetcher = PaginatedFetcher::new(server.uri(), &tokens, fast_policy());
    let outcome = fetcher
        .fetch_all(PLAYLIST_ID, AccessToken::new("initial"))
        .await
        .expect("partial result is not an error");

    assert_eq!(outcome.items.len(), 100);
    assert_eq!(outcome.retries, 3);
    assert_eq!(outcome.backoff_waited, Duration::from_millis(2 + 4 + 8));
    assert!(!outcome.complete);
}

#[tokio::test]
async fn test_fetch_all_refreshes_expired_token_without_spending_retries() {
    let server = MockServer::start().await;
    mount_first_page(&server, 200).await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .and(header("authorization", "Bearer initial"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(100..200, 200, None)))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = provider(&server);
    let fetcher = PaginatedFetcher::new(server.uri(), &tokens, fast_policy());
    let outcome = fetcher
        .fetch_all(PLAYLIST_ID, AccessToken::new("initial"))
        .await
        .expect("fetch");

    assert_eq!(outcome.items.len(), 200);
    assert_eq!(outcome.token_refreshes, 1);
    assert_eq!(outcome.retries, 0);
    assert!(outcome.complete);
}

#[tokio::test]
async fn test_fetch_all_stops_when_fresh_token_is_rejected() {
    let server = MockServer::start().await;
    mount_first_page(&server, 200).await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let tokens = provider(&server);
    let fetcher = PaginatedFetcher::new(server.uri(), &tokens, fast_policy());
    let outcome = fetcher
        .fetch_all(PLAYLIST_ID, AccessToken::new("initial"))
        .await
        .expect("fetch");

    assert_eq!(outcome.items.len(), 100);
    assert_eq!(outcome.token_refreshes, 1);
    assert!(!outcome.complete);
}

#[tokio::test]
async fn test_fetch_all_surfaces_failed_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(tracks_path()))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = provider(&server);
    let fetcher = PaginatedFetcher::new(server.uri(), &tokens, fast_policy());
    let result = fetcher
        .fetch_all(PLAYLIST_ID, AccessToken::new("initial"))
        .await;

    assert!(matches!(
        result,
        Err(AuthError::Rejected(status)) if status == StatusCode::BAD_REQUEST
    ));
}

#[tokio::test]
async fn test_fetch_all_stops_on_client_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(tracks_path()))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = provider(&server);
    let fetcher = PaginatedFetcher::new(server.uri(), &tokens, fast_policy());
    let outcome = fetcher
        .fetch_all(PLAYLIST_ID, AccessToken::new("initial"))
        .await
        .expect("fetch");

    assert!(outcome.items.is_empty());
    assert_eq!(outcome.retries, 0);
    assert!(!outcome.complete);
}

#[tokio::test]
async fn test_fetch_all_stops_on_undecodable_page() {
    let server = MockServer::start().await;
    mount_first_page(&server, 200).await;

    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = provider(&server);
    let fetcher = PaginatedFetcher::new(server.uri(), &tokens, fast_policy());
    let outcome = fetcher
        .fetch_all(PLAYLIST_ID, AccessToken::new("initial"))
        .await
        .expect("fetch");

    assert_eq!(outcome.items.len(), 100);
    assert!(!outcome.complete);
}

#[tokio::test]
async fn test_acquire_token_sends_basic_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        // base64("id:secret")
        .and(header("authorization", "Basic aWQ6c2VjcmV0"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "BQC4token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = provider(&server).acquire_token().await.expect("token");

    assert_eq!(token.as_str(), "BQC4token");
}

#[tokio::test]
async fn test_acquire_token_rejects_bad_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid_client" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = provider(&server).acquire_token().await;

    assert!(matches!(
        result,
        Err(AuthError::Rejected(status)) if status == StatusCode::UNAUTHORIZED
    ));
}

#[tokio::test]
async fn test_fetch_all_pauses_before_every_cursor_request() {
    let server = MockServer::start().await;
    mount_first_page(&server, 250).await;

    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
            100..200,
            250,
            Some(format!("{}/cursor/3", server.uri())),
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cursor/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(200..250, 250, None)))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = provider(&server);
    let policy = FetchPolicy {
        page_delay: Duration::from_millis(300),
        ..fast_policy()
    };
    let fetcher = PaginatedFetcher::new(server.uri(), &tokens, policy);

    let started = Instant::now();
    let outcome = fetcher
        .fetch_all(PLAYLIST_ID, AccessToken::new("initial"))
        .await
        .expect("fetch");

    assert_eq!(outcome.items.len(), 250);
    // two cursor requests, one pause each
    assert!(started.elapsed() >= Duration::from_millis(600));
}

#[tokio::test]
async fn test_fetch_all_requests_first_page_without_pause() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(tracks_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0..20, 20, None)))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = provider(&server);
    let policy = FetchPolicy {
        page_delay: Duration::from_secs(10),
        ..fast_policy()
    };
    let fetcher = PaginatedFetcher::new(server.uri(), &tokens, policy);

    let started = Instant::now();
    let outcome = fetcher
        .fetch_all(PLAYLIST_ID, AccessToken::new("initial"))
        .await
        .expect("fetch");

    assert_eq!(outcome.items.len(), 20);
    assert!(outcome.complete);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_fetch_all_stops_on_unreachable_cursor() {
    let server = MockServer::start().await;

    // bind then drop to get a port nobody listens on
    let closed_port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };

    Mock::given(method("GET"))
        .and(path(tracks_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
            0..100,
            200,
            Some(format!("http://127.0.0.1:{}/cursor/2", closed_port)),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = provider(&server);
    let fetcher = PaginatedFetcher::new(server.uri(), &tokens, fast_policy());
    let outcome = fetcher
        .fetch_all(PLAYLIST_ID, AccessToken::new("initial"))
        .await
        .expect("transport errors are not returned");

    assert_eq!(outcome.items.len(), 100);
    assert_eq!(outcome.retries, 0);
    assert!(!outcome.complete);
}

#[tokio::test]
async fn test_fetch_all_refreshes_again_after_server_error() {
    let server = MockServer::start().await;
    mount_first_page(&server, 200).await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "fresh" })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .and(header("authorization", "Bearer initial"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    // 401, refresh, 503, 401, refresh, 200
    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cursor/2"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(100..200, 200, None)))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = provider(&server);
    let fetcher = PaginatedFetcher::new(server.uri(), &tokens, fast_policy());
    let outcome = fetcher
        .fetch_all(PLAYLIST_ID, AccessToken::new("initial"))
        .await
        .expect("fetch");

    assert_eq!(outcome.items.len(), 200);
    assert_eq!(outcome.token_refreshes, 2);
    assert_eq!(outcome.retries, 1);
    assert!(outcome.complete);
}
