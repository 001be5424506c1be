//! Heuristic classification of raw transport failures.
//!
//! Error messages are not a stable contract across platforms or locales, so
//! classification is textual-signature matching: best-effort, never
//! authoritative. The signature table is data, not scattered string checks,
//! so the rules can be extended without touching call sites.

use std::fmt;

use crate::retry::RetryConfig;

/// Semantic category assigned to a raw transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The remote end actively refused the connection.
    ConnectionRefused,
    /// The attempt exceeded a deadline before completing.
    Timeout,
    /// The target host could not be resolved.
    DnsResolution,
    /// No route to the target network.
    NetworkUnreachable,
    /// The peer dropped an established connection.
    ConnectionReset,
    /// Anything the signature table does not recognize.
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConnectionRefused => "connection refused",
            Self::Timeout => "timeout",
            Self::DnsResolution => "dns resolution",
            Self::NetworkUnreachable => "network unreachable",
            Self::ConnectionReset => "connection reset",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Signature table consulted in order; the first matching needle wins.
///
/// Needles are matched case-insensitively against the full error chain text.
const SIGNATURES: &[(ErrorKind, &[&str])] = &[
    (
        ErrorKind::ConnectionRefused,
        &["connection refused", "econnrefused", "actively refused"],
    ),
    (
        ErrorKind::DnsResolution,
        &[
            "dns error",
            "failed to lookup address",
            "name or service not known",
            "no such host",
            "nodename nor servname",
        ],
    ),
    (
        ErrorKind::Timeout,
        &[
            "timed out",
            "timeout",
            "deadline has elapsed",
            "deadline exceeded",
        ],
    ),
    (
        ErrorKind::NetworkUnreachable,
        &["network is unreachable", "enetunreach", "no route to host"],
    ),
    (
        ErrorKind::ConnectionReset,
        &[
            "connection reset",
            "econnreset",
            "reset by peer",
            "broken pipe",
        ],
    ),
];

/// Classifies raw failure text into an [`ErrorKind`].
///
/// Total over arbitrary input: unmatched text maps to [`ErrorKind::Unknown`].
#[must_use]
pub fn classify(raw: &str) -> ErrorKind {
    let lowered = raw.to_lowercase();
    for (kind, needles) in SIGNATURES {
        if needles.iter().any(|needle| lowered.contains(needle)) {
            return *kind;
        }
    }
    ErrorKind::Unknown
}

/// Classifies a [`reqwest::Error`], preferring structural signals over text.
#[must_use]
pub fn classify_reqwest(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        return ErrorKind::Timeout;
    }
    classify(&error_chain_text(err))
}

/// Renders an error and its full source chain as one line of text.
///
/// reqwest surfaces the interesting detail (refused, reset, lookup failure)
/// several levels down the chain, so the top-level message alone is useless
/// for classification.
#[must_use]
pub fn error_chain_text(err: &reqwest::Error) -> String {
    let mut text = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Whether a failure of this kind is worth another attempt under `config`.
///
/// DNS failures and unrecognized failures are never retried. The remaining
/// kinds are retryable as a matter of policy: only when the config allows
/// retries at all.
#[must_use]
pub fn is_retryable(kind: ErrorKind, config: &RetryConfig) -> bool {
    match kind {
        ErrorKind::DnsResolution | ErrorKind::Unknown => false,
        ErrorKind::ConnectionRefused
        | ErrorKind::Timeout
        | ErrorKind::NetworkUnreachable
        | ErrorKind::ConnectionReset => config.max_retries > 0,
    }
}

/// Whether an HTTP status is in the config's retryable set.
#[must_use]
pub fn is_retryable_status(status: u16, config: &RetryConfig) -> bool {
    config.retryable_status.contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn classify_known_signatures() {
        assert_eq!(
            classify("tcp connect error: Connection refused (os error 111)"),
            ErrorKind::ConnectionRefused
        );
        assert_eq!(classify("operation timed out"), ErrorKind::Timeout);
        assert_eq!(
            classify("dns error: failed to lookup address information"),
            ErrorKind::DnsResolution
        );
        assert_eq!(
            classify("connect error: Network is unreachable (os error 101)"),
            ErrorKind::NetworkUnreachable
        );
        assert_eq!(
            classify("Connection reset by peer (os error 104)"),
            ErrorKind::ConnectionReset
        );
    }

    #[test]
    fn classify_unmatched_is_unknown() {
        assert_eq!(classify(""), ErrorKind::Unknown);
        assert_eq!(classify("certificate has expired"), ErrorKind::Unknown);
    }

    #[test]
    fn dns_beats_timeout_needles() {
        // A lookup failure that also mentions a timeout is still DNS.
        assert_eq!(
            classify("failed to lookup address information: query timed out"),
            ErrorKind::DnsResolution
        );
    }

    // Classification and retryability are separate questions: these tests
    // assert them independently on the same inputs.

    #[test]
    fn dns_is_classified_but_never_retryable() {
        let config = RetryConfig::default();
        let kind = classify("no such host is known");
        assert_eq!(kind, ErrorKind::DnsResolution);
        assert!(!is_retryable(kind, &config));
    }

    #[test]
    fn refused_is_classified_and_retryable_by_policy() {
        let config = RetryConfig::default();
        let kind = classify("connection refused");
        assert_eq!(kind, ErrorKind::ConnectionRefused);
        assert!(is_retryable(kind, &config));

        // Same kind, retries disabled: not retryable.
        let no_retries = RetryConfig::default().with_max_retries(0);
        assert!(!is_retryable(kind, &no_retries));
    }

    #[test]
    fn unknown_never_retryable() {
        let config = RetryConfig::default();
        assert!(!is_retryable(ErrorKind::Unknown, &config));
    }

    #[test]
    fn status_retryability_is_set_membership() {
        let config = RetryConfig::default();
        assert!(is_retryable_status(503, &config));
        assert!(is_retryable_status(429, &config));
        assert!(!is_retryable_status(404, &config));
        assert!(!is_retryable_status(400, &config));

        let without_500 = RetryConfig::default().with_retryable_status([502, 503]);
        assert!(!is_retryable_status(500, &without_500));
        assert!(is_retryable_status(503, &without_500));
    }

    proptest! {
        #[test]
        fn classify_is_total_and_deterministic(raw in ".*") {
            let first = classify(&raw);
            let second = classify(&raw);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn classify_case_insensitive(raw in "[a-zA-Z ]{0,40}") {
            prop_assert_eq!(classify(&raw), classify(&raw.to_uppercase()));
        }
    }
}
