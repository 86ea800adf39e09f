//! Integration tests for `PageFetcher::fetch`.
//!
//! Each test stands up a local `wiremock` server, so no real network traffic
//! is made. Covers the three outcome classes and the request shape.

use std::time::Duration;

use pulse_core::SessionCredentials;
use pulse_scraper::{CountExtractor, FetchOutcome, PageFetcher};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GROUP_PATH: &str = "/my-group";

fn test_fetcher(timeout_secs: u64) -> PageFetcher {
    PageFetcher::new(
        timeout_secs,
        "pulse-test/0.1",
        "en-US",
        CountExtractor::default(),
    )
    .expect("failed to build test PageFetcher")
}

fn credentials() -> SessionCredentials {
    [("auth_token", "tok"), ("client_id", "cid")]
        .into_iter()
        .collect()
}

fn group_page(count: &str) -> String {
    format!(
        r#"<html><body><nav>
             <a href="/my-group/-/members?t=online">
               <div class="styled__TypographyWrapper-sc-70zmwu-0">{count}</div>
               <div class="styled__TypographyWrapper-sc-70zmwu-0">Online</div>
             </a>
           </nav></body></html>"#
    )
}

async fn mount_status(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(GROUP_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Success
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_returns_count_from_group_page() {
    let server = MockServer::start().await;
    mount_status(&server, 200, &group_page("42")).await;

    let outcome = test_fetcher(5)
        .fetch(&format!("{}{GROUP_PATH}", server.uri()), &credentials())
        .await;

    assert_eq!(outcome, FetchOutcome::Success(Some(42)));
}

#[tokio::test]
async fn fetch_200_without_count_is_success_absent() {
    let server = MockServer::start().await;
    mount_status(&server, 200, "<html><body><h1>Welcome</h1></body></html>").await;

    let outcome = test_fetcher(5)
        .fetch(&format!("{}{GROUP_PATH}", server.uri()), &credentials())
        .await;

    assert_eq!(outcome, FetchOutcome::Success(None));
}

#[tokio::test]
async fn fetch_sends_cookies_and_browser_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GROUP_PATH))
        .and(header("cookie", "auth_token=tok; client_id=cid"))
        .and(header("user-agent", "pulse-test/0.1"))
        .and(header("accept-language", "en-US"))
        .and(header("sec-fetch-mode", "navigate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(group_page("7")))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = test_fetcher(5)
        .fetch(&format!("{}{GROUP_PATH}", server.uri()), &credentials())
        .await;

    assert_eq!(outcome, FetchOutcome::Success(Some(7)));
}

// ---------------------------------------------------------------------------
// Auth failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_401_and_403_are_auth_failures_regardless_of_body() {
    let full_page = group_page("42");
    for status in [401_u16, 403] {
        for body in ["", "<html>forbidden</html>", full_page.as_str()] {
            let server = MockServer::start().await;
            mount_status(&server, status, body).await;

            let outcome = test_fetcher(5)
                .fetch(&format!("{}{GROUP_PATH}", server.uri()), &credentials())
                .await;

            assert_eq!(
                outcome,
                FetchOutcome::AuthFailure { status },
                "status {status} with body {body:?}"
            );
        }
    }
}

#[tokio::test]
async fn fetch_makes_exactly_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GROUP_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = test_fetcher(5)
        .fetch(&format!("{}{GROUP_PATH}", server.uri()), &credentials())
        .await;

    assert!(matches!(outcome, FetchOutcome::TransientFailure(_)));
}

// ---------------------------------------------------------------------------
// Transient failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_500_is_transient_failure() {
    let server = MockServer::start().await;
    mount_status(&server, 500, &group_page("42")).await;

    let outcome = test_fetcher(5)
        .fetch(&format!("{}{GROUP_PATH}", server.uri()), &credentials())
        .await;

    match outcome {
        FetchOutcome::TransientFailure(reason) => {
            assert!(reason.contains("500"), "reason should name status: {reason}");
        }
        other => panic!("expected TransientFailure, got: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_404_is_transient_failure() {
    let server = MockServer::start().await;
    mount_status(&server, 404, "").await;

    let outcome = test_fetcher(5)
        .fetch(&format!("{}{GROUP_PATH}", server.uri()), &credentials())
        .await;

    assert!(matches!(outcome, FetchOutcome::TransientFailure(_)));
}

#[tokio::test]
async fn fetch_timeout_is_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(GROUP_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(group_page("42"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let outcome = test_fetcher(1)
        .fetch(&format!("{}{GROUP_PATH}", server.uri()), &credentials())
        .await;

    match outcome {
        FetchOutcome::TransientFailure(reason) => {
            assert!(reason.contains("timed out"), "unexpected reason: {reason}");
        }
        other => panic!("expected TransientFailure, got: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_connection_refused_is_transient_failure() {
    // Bind then drop a server so the port is very likely closed.
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let outcome = test_fetcher(2)
        .fetch(&format!("{uri}{GROUP_PATH}"), &credentials())
        .await;

    assert!(
        matches!(outcome, FetchOutcome::TransientFailure(_)),
        "expected TransientFailure, got: {outcome:?}"
    );
}
