//! Degradation advisor: recommends a reduced operating posture for a failure.
//!
//! Purely advisory. The transport client never consults this module; a
//! higher layer decides whether to act on the recommendation.

use crate::classify::{self, ErrorKind};

/// Recommended operating mode, ordered by severity.
///
/// `Normal < Limited < Cached < Offline`, so callers can compare modes and
/// keep the most severe recommendation seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FallbackMode {
    /// No degradation required.
    Normal,
    /// Connectivity is degraded; results may be incomplete.
    Limited,
    /// Prefer cached data where available.
    Cached,
    /// No server reachable; operate offline.
    Offline,
}

/// Maps raw failure text to a recommended [`FallbackMode`].
///
/// A pure function of the input text: identical input always yields the
/// identical mode, with no memoization or hidden state. Uses the same
/// textual signals as the error classifier.
#[must_use]
pub fn evaluate_fallback(raw: &str) -> FallbackMode {
    match classify::classify(raw) {
        ErrorKind::ConnectionRefused => FallbackMode::Offline,
        ErrorKind::Timeout => FallbackMode::Limited,
        ErrorKind::ConnectionReset => FallbackMode::Cached,
        ErrorKind::DnsResolution | ErrorKind::NetworkUnreachable | ErrorKind::Unknown => {
            FallbackMode::Normal
        }
    }
}

/// Human-readable advisory for a mode, suitable for direct display.
#[must_use]
pub const fn fallback_message(mode: FallbackMode) -> &'static str {
    match mode {
        FallbackMode::Normal => "operating normally, no degradation required",
        FallbackMode::Limited => "connectivity is degraded, results may be incomplete",
        FallbackMode::Cached => "serving cached data where available",
        FallbackMode::Offline => "switching to offline mode, no server reachable",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_by_signature() {
        assert_eq!(
            evaluate_fallback("connection refused"),
            FallbackMode::Offline
        );
        assert_eq!(
            evaluate_fallback("request timed out"),
            FallbackMode::Limited
        );
        assert_eq!(
            evaluate_fallback("connection reset by peer"),
            FallbackMode::Cached
        );
        assert_eq!(
            evaluate_fallback("some other failure"),
            FallbackMode::Normal
        );
    }

    #[test]
    fn evaluation_is_pure() {
        let raw = "tcp connect error: Connection refused (os error 111)";
        assert_eq!(evaluate_fallback(raw), evaluate_fallback(raw));

        for raw in ["timed out", "reset by peer", "", "tls handshake failed"] {
            assert_eq!(evaluate_fallback(raw), evaluate_fallback(raw));
        }
    }

    #[test]
    fn severity_ordering() {
        assert!(FallbackMode::Normal < FallbackMode::Limited);
        assert!(FallbackMode::Limited < FallbackMode::Cached);
        assert!(FallbackMode::Cached < FallbackMode::Offline);
    }

    #[test]
    fn messages_are_nonempty_and_distinct() {
        let modes = [
            FallbackMode::Normal,
            FallbackMode::Limited,
            FallbackMode::Cached,
            FallbackMode::Offline,
        ];
        for (i, a) in modes.iter().enumerate() {
            assert!(!fallback_message(*a).is_empty());
            for b in &modes[i + 1..] {
                assert_ne!(fallback_message(*a), fallback_message(*b));
            }
        }
    }
}
