//! Retry policy: backoff schedule math and the retryable status set.

use std::collections::BTreeSet;
use std::time::Duration;

use rand::Rng;
use reqwest::header::HeaderMap;

/// Status codes retried out of the box: request timeout, rate limiting, and
/// the transient 5xx family.
///
/// The set is fully caller-configurable; nothing in the transport assumes
/// these defaults are authoritative for a given service.
pub const DEFAULT_RETRYABLE_STATUS: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Backoff schedule and retryable-status policy for one transport client.
///
/// [`RetryConfig::default`] is the explicit shared default; there is no
/// ambient process-wide policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt. `max_retries = 3` means up to 4
    /// total attempts.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Cap applied to every computed delay.
    pub max_delay: Duration,
    /// Exponential growth factor, expected > 1.0.
    pub multiplier: f64,
    /// Optional random perturbation, as a fraction of the computed delay,
    /// to avoid synchronized retry storms across client instances.
    pub jitter: Option<f64>,
    /// HTTP status codes treated as transient.
    pub retryable_status: BTreeSet<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            jitter: Some(0.25),
            retryable_status: DEFAULT_RETRYABLE_STATUS.into_iter().collect(),
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the jitter fraction; `None` disables jitter entirely.
    #[must_use]
    pub fn with_jitter(mut self, jitter: Option<f64>) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replaces the retryable status set.
    #[must_use]
    pub fn with_retryable_status<I: IntoIterator<Item = u16>>(mut self, status: I) -> Self {
        self.retryable_status = status.into_iter().collect();
        self
    }

    /// Backoff before retrying `attempt` (0-based for the first try):
    /// `min(max_delay, base_delay * multiplier^attempt)`, perturbed by the
    /// jitter fraction when one is configured. The cap holds even under
    /// jitter: no delay ever exceeds `max_delay`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let cap = self.max_delay.as_secs_f64();
        let raw = self.base_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = raw.min(cap);
        let perturbed = match self.jitter {
            Some(fraction) if fraction > 0.0 => {
                let spread = capped * fraction;
                capped + rand::thread_rng().gen_range(-spread..=spread)
            }
            _ => capped,
        };
        Duration::from_secs_f64(perturbed.clamp(0.0, cap))
    }
}

/// Parses a `Retry-After` header carrying whole seconds, capped at 60s.
///
/// Returns `None` when the header is missing or malformed (including the
/// HTTP-date form, which this transport does not bother with).
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    if let Some(v) = headers.get("retry-after")
        && let Ok(s) = v.to_str()
        && let Ok(secs) = s.parse::<u64>()
    {
        return Some(Duration::from_secs(secs.min(60)));
    }
    None
}
