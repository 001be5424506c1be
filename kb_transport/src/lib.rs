//! # `kb-transport`
//!
//! Resilient HTTP transport for the knowledge-base CLI.
//!
//! The CLI's command and repository layers map typed domain calls
//! (notebooks, notes, sources, search, jobs) onto the verbs here; this
//! crate turns each of those into a reliable network operation: retry with
//! exponential backoff, failure classification, degradation advice, SSE
//! streaming, and connectivity diagnostics.
//!
//! ## Quick Start
//!
//! ```no_run
//! use kb_transport::{Client, TransportConfig};
//!
//! # async fn example() -> Result<(), kb_transport::TransportError> {
//! let client = Client::new(
//!     TransportConfig::new()
//!         .with_base_url("http://localhost:5055")
//!         .with_bearer("token"),
//! );
//!
//! let response = client.get("/notebooks").await?;
//! println!("status {}", response.status);
//! # Ok(())
//! # }
//! ```
//!
//! ## Retry behavior
//!
//! Each call makes up to `max_retries + 1` attempts. Wire-level failures
//! are retried when their classified [`ErrorKind`] allows it; responses
//! with a status in the configured retryable set are retried the same way.
//! When retries exhaust against a retryable status, the error still
//! carries the last [`Response`] for inspection. See [`RetryConfig`].
//!
//! ## Cancellation
//!
//! Calls are plain futures: dropping one cancels the in-flight attempt or
//! backoff sleep immediately. The configured per-call timeout additionally
//! bounds the sum of all attempts and sleeps.

/// Heuristic failure classification
pub mod classify;
/// Transport client implementation
pub mod client;
/// Construction-time configuration
pub mod config;
/// Connectivity diagnostics probes
pub mod diagnostics;
/// Transport error types
pub mod error;
/// Degradation mode advisor
pub mod fallback;
/// Retry policy and backoff schedule
pub mod retry;
/// SSE streaming reader
pub mod sse;

pub use crate::classify::ErrorKind;
pub use crate::client::{Client, MultipartField, MultipartValue, Request, RequestBody, Response};
pub use crate::config::TransportConfig;
pub use crate::diagnostics::{DiagnosticReport, ProbeOutcome, diagnose_connectivity};
pub use crate::error::TransportError;
pub use crate::fallback::{FallbackMode, evaluate_fallback, fallback_message};
pub use crate::retry::RetryConfig;
pub use crate::sse::PayloadStream;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::classify::ErrorKind;
    pub use crate::client::{Client, Request, Response};
    pub use crate::config::TransportConfig;
    pub use crate::error::TransportError;
    pub use crate::fallback::FallbackMode;
    pub use crate::retry::RetryConfig;
}
