use std::time::Duration;

use kb_transport::diagnostics::{DNS_TEST, HTTP_TEST, diagnose_connectivity};
use wiremock::MockServer;

#[tokio::test]
async fn unreachable_target_still_reports_both_probes() {
    let report = diagnose_connectivity("http://kb-transport-nonexistent.invalid").await;

    for key in [DNS_TEST, HTTP_TEST] {
        let outcome = report.checks.get(key).expect("probe key present");
        assert!(!outcome.success, "{key} should fail");
        assert!(!outcome.detail.is_empty(), "{key} needs detail");
    }
    assert!(!report.all_passed());
    // Probes run concurrently under their own 5s timeouts.
    assert!(report.total_duration < Duration::from_secs(15));
}

#[tokio::test]
async fn reachable_target_passes_even_on_404() {
    // No mocks mounted: every request draws a 404, which still proves
    // reachability.
    let server = MockServer::start().await;
    let report = diagnose_connectivity(&server.uri()).await;

    let dns = report.checks.get(DNS_TEST).expect("dns probe");
    assert!(dns.success, "dns detail: {}", dns.detail);

    let http = report.checks.get(HTTP_TEST).expect("http probe");
    assert!(http.success, "http detail: {}", http.detail);
    assert!(http.detail.contains("404"), "http detail: {}", http.detail);

    assert!(report.all_passed());
}

#[tokio::test]
async fn bare_host_targets_are_accepted() {
    let server = MockServer::start().await;
    let bare = server.uri().trim_start_matches("http://").to_string();
    let report = diagnose_connectivity(&bare).await;
    assert!(report.checks.get(HTTP_TEST).expect("http probe").success);
}
