//! Transport configuration.

use std::time::Duration;

/// Default base URL of the knowledge-base service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5055";

/// Overall per-call deadline, covering every attempt and backoff sleep.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Construction-time settings for a [`Client`](crate::Client).
///
/// The base URL and timeouts are fixed for the life of the client; the
/// bearer token set here is only the initial value and can be replaced
/// later via [`Client::set_auth`](crate::Client::set_auth).
#[derive(Debug, Clone)]
pub struct TransportConfig {
    base_url: String,
    timeout: Duration,
    connect_timeout: Duration,
    bearer: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            bearer: None,
        }
    }
}

impl TransportConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service base URL; a trailing slash is trimmed so paths can
    /// always start with `/`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    /// Sets the overall per-call deadline (all attempts plus backoff).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Sets the initial bearer token.
    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub(crate) fn initial_bearer(&self) -> Option<String> {
        self.bearer.clone()
    }

    /// Joins a request path onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joining_trims_trailing_slash() {
        let config = TransportConfig::new().with_base_url("http://kb.local:5055/");
        assert_eq!(config.url("/notebooks"), "http://kb.local:5055/notebooks");
    }

    #[test]
    fn defaults() {
        let config = TransportConfig::new();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert!(config.initial_bearer().is_none());
    }

    #[test]
    fn bearer_builder() {
        let config = TransportConfig::new().with_bearer("tok-1");
        assert_eq!(config.initial_bearer().as_deref(), Some("tok-1"));
    }
}
