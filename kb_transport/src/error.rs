//! Transport error types.

use std::time::Duration;

use thiserror::Error;

use crate::classify::ErrorKind;
use crate::client::Response;

/// Failure of a transport call.
///
/// A reachable server answering with a non-2xx status is *not* an error at
/// this layer; it comes back as a normal [`Response`]. Errors mean the wire
/// exchange itself failed, retries against a retryable status ran out, or
/// the caller's deadline expired.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The wire exchange could not be completed.
    #[error("network error ({kind}) after {attempts} attempt(s): {detail}")]
    Network {
        /// Classified failure category, best-effort.
        kind: ErrorKind,
        /// Full error chain text the classification was derived from.
        detail: String,
        /// Total attempts made, including the first.
        attempts: u32,
        /// Underlying client error, when one exists.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Every attempt drew a status from the retryable set.
    ///
    /// Carries the last [`Response`] so callers can still inspect the status
    /// and body for diagnostics; the error is still the primary outcome.
    #[error("retryable status {status} still returned after {attempts} attempt(s)", status = .response.status)]
    RetryableStatusExhausted {
        /// Total attempts made, including the first.
        attempts: u32,
        /// The final response received before giving up.
        response: Box<Response>,
    },

    /// The overall per-call deadline elapsed, covering all attempts and
    /// backoff sleeps, possibly mid-retry.
    #[error("call deadline of {timeout:?} exceeded")]
    DeadlineExceeded {
        /// The configured per-call deadline.
        timeout: Duration,
    },

    /// The request could not be constructed at all.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Classified kind for network failures, `None` otherwise.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Network { kind, .. } => Some(*kind),
            Self::DeadlineExceeded { .. } => Some(ErrorKind::Timeout),
            Self::RetryableStatusExhausted { .. } | Self::InvalidRequest(_) => None,
        }
    }

    /// The last HTTP status seen, when the failure produced one.
    #[must_use]
    pub fn last_status(&self) -> Option<u16> {
        match self {
            Self::RetryableStatusExhausted { response, .. } => Some(response.status),
            _ => None,
        }
    }
}
