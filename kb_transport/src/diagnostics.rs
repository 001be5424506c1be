//! Connectivity diagnostics: independent DNS and HTTP probes.
//!
//! The point of the tool is isolating *which* layer failed, so both probes
//! always run, even when one fails first, and each carries its own timeout
//! so a hung probe cannot stall the other.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::classify;

/// Report key for the DNS resolution probe.
pub const DNS_TEST: &str = "dns_test";
/// Report key for the HTTP reachability probe.
pub const HTTP_TEST: &str = "http_test";

/// Per-probe deadline, independent of the other probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Whether the probed layer is working.
    pub success: bool,
    /// Human-readable detail, never empty.
    pub detail: String,
    /// Wall-clock time the probe took.
    pub duration: Duration,
}

/// Result of one diagnostic run, produced fresh each time.
#[derive(Debug, Clone)]
pub struct DiagnosticReport {
    /// Probe outcomes keyed by [`DNS_TEST`] and [`HTTP_TEST`].
    pub checks: BTreeMap<String, ProbeOutcome>,
    /// Wall-clock time for the whole run.
    pub total_duration: Duration,
}

impl DiagnosticReport {
    /// Whether every probe succeeded.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.checks.values().all(|outcome| outcome.success)
    }
}

/// Probes `target` and reports which connectivity layers work.
///
/// `target` may be a full URL or a bare `host[:port]`; a bare host is
/// probed over plain HTTP. Bounded in total wall-clock time by the
/// per-probe timeouts; never hangs on an unreachable target.
pub async fn diagnose_connectivity(target: &str) -> DiagnosticReport {
    let started = Instant::now();
    let url = normalize_target(target);

    let (dns, http) = tokio::join!(dns_probe(&url), http_probe(&url));
    debug!(
        probed = %url,
        dns_ok = dns.success,
        http_ok = http.success,
        "diagnostics complete"
    );

    let mut checks = BTreeMap::new();
    checks.insert(DNS_TEST.to_string(), dns);
    checks.insert(HTTP_TEST.to_string(), http);
    DiagnosticReport {
        checks,
        total_duration: started.elapsed(),
    }
}

fn normalize_target(target: &str) -> String {
    if target.contains("://") {
        target.to_string()
    } else {
        format!("http://{target}")
    }
}

async fn dns_probe(url: &str) -> ProbeOutcome {
    let started = Instant::now();
    let (success, detail) = match host_and_port(url) {
        Ok((host, port)) => {
            let lookup = tokio::net::lookup_host((host.as_str(), port));
            match tokio::time::timeout(PROBE_TIMEOUT, lookup).await {
                Ok(Ok(mut addrs)) => match addrs.next() {
                    Some(addr) => (true, format!("{host} resolved to {addr}")),
                    None => (false, format!("{host} resolved to no addresses")),
                },
                Ok(Err(err)) => (false, format!("resolution of {host} failed: {err}")),
                Err(_) => (
                    false,
                    format!("resolution of {host} timed out after {PROBE_TIMEOUT:?}"),
                ),
            }
        }
        Err(detail) => (false, detail),
    };
    ProbeOutcome {
        success,
        detail,
        duration: started.elapsed(),
    }
}

fn host_and_port(url: &str) -> Result<(String, u16), String> {
    let parsed = reqwest::Url::parse(url).map_err(|err| format!("invalid target {url}: {err}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| format!("target {url} has no host"))?
        .to_string();
    let port = parsed.port_or_known_default().unwrap_or(80);
    Ok((host, port))
}

async fn http_probe(url: &str) -> ProbeOutcome {
    let started = Instant::now();
    let client = reqwest::Client::builder().timeout(PROBE_TIMEOUT).build();
    let (success, detail) = match client {
        Ok(client) => match client.get(url).send().await {
            // Any response counts; the probe measures reachability, not
            // application correctness. A 404 is still a reachable server.
            Ok(response) => (
                true,
                format!("received HTTP {}", response.status().as_u16()),
            ),
            Err(err) => (false, classify::error_chain_text(&err)),
        },
        Err(err) => (false, format!("probe client could not be built: {err}")),
    };
    ProbeOutcome {
        success,
        detail,
        duration: started.elapsed(),
    }
}
