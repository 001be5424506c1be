use std::time::{Duration, Instant};

use kb_transport::{Client, ErrorKind, RetryConfig, TransportConfig, TransportError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A backoff long enough that any prompt return proves the sleep was
/// interrupted rather than completed.
fn glacial_retry() -> RetryConfig {
    RetryConfig::default()
        .with_base_delay(Duration::from_secs(30))
        .with_jitter(None)
}

#[tokio::test]
async fn dropping_a_call_mid_backoff_returns_promptly() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notebooks"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = Client::new(TransportConfig::new().with_base_url(server.uri()))
        .with_retry_config(glacial_retry());

    // The first attempt gets an instant 503 and the client enters a 30s
    // backoff sleep; the surrounding timeout drops the call mid-sleep.
    let started = Instant::now();
    let result = tokio::time::timeout(Duration::from_millis(50), client.get("/notebooks")).await;
    let elapsed = started.elapsed();

    assert!(result.is_err(), "call should have been cancelled");
    // 50ms until the drop, then the abort itself must be nearly immediate;
    // anything close to the 30s backoff means the sleep was not interrupted.
    assert!(
        elapsed < Duration::from_millis(100),
        "cancellation took {elapsed:?}"
    );
}

#[tokio::test]
async fn deadline_bounds_attempts_and_backoff() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notebooks"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = Client::new(
        TransportConfig::new()
            .with_base_url(server.uri())
            .with_timeout(Duration::from_millis(200)),
    )
    .with_retry_config(glacial_retry());

    let started = Instant::now();
    let err = client
        .get("/notebooks")
        .await
        .expect_err("deadline must fire");
    let elapsed = started.elapsed();

    assert!(matches!(err, TransportError::DeadlineExceeded { .. }));
    assert_eq!(err.kind(), Some(ErrorKind::Timeout));
    assert!(
        elapsed < Duration::from_secs(2),
        "deadline took {elapsed:?}"
    );
}

#[tokio::test]
async fn deadline_covers_a_slow_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let client = Client::new(
        TransportConfig::new()
            .with_base_url(server.uri())
            .with_timeout(Duration::from_millis(150)),
    );

    let err = client.get("/search").await.expect_err("deadline must fire");
    assert!(matches!(err, TransportError::DeadlineExceeded { .. }));
}
