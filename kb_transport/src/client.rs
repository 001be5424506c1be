//! Transport client: retrying HTTP execution over a pooled connection.

use std::sync::{Arc, RwLock};

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::classify;
use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::retry::{self, RetryConfig};
use crate::sse::{self, PayloadStream};

// =========================================================================
// Request / Response value types
// =========================================================================

/// One logical HTTP operation, immutable once constructed.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP verb.
    pub method: Method,
    /// Path relative to the configured base URL.
    pub path: String,
    /// Optional payload.
    pub body: Option<RequestBody>,
    /// Extra per-request headers, merged over the defaults.
    pub headers: HeaderMap,
}

impl Request {
    /// Creates a bodiless request.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// Attaches a JSON body.
    #[must_use]
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Attaches an opaque byte body.
    #[must_use]
    pub fn with_bytes(mut self, body: Bytes) -> Self {
        self.body = Some(RequestBody::Bytes(body));
        self
    }

    /// Adds a per-request header.
    #[must_use]
    pub fn with_header(
        mut self,
        name: reqwest::header::HeaderName,
        value: reqwest::header::HeaderValue,
    ) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Request payload.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Structured value serialized as JSON.
    Json(serde_json::Value),
    /// Opaque bytes sent as-is.
    Bytes(Bytes),
}

/// A wire-complete HTTP exchange, regardless of status.
///
/// A 500 is a valid `Response`, not an error; interpreting statuses and
/// decoding JSON bodies is the caller's responsibility.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Raw body bytes.
    pub body: Bytes,
    /// Response headers; keys are case-insensitive and repeated headers
    /// keep all their values.
    pub headers: HeaderMap,
}

impl Response {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One field of a multipart upload.
///
/// Fields own their data so the form can be re-encoded from scratch on
/// every retry attempt; request streams cannot be replayed.
#[derive(Debug, Clone)]
pub struct MultipartField {
    /// Form field name.
    pub name: String,
    /// Field payload.
    pub value: MultipartValue,
}

impl MultipartField {
    /// A plain text field.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: MultipartValue::Text(value.into()),
        }
    }

    /// A file field with an explicit content type.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Bytes,
    ) -> Self {
        Self {
            name: name.into(),
            value: MultipartValue::File {
                file_name: file_name.into(),
                content_type: content_type.into(),
                data,
            },
        }
    }
}

/// Payload of a [`MultipartField`].
#[derive(Debug, Clone)]
pub enum MultipartValue {
    /// Plain text value.
    Text(String),
    /// File upload.
    File {
        /// File name reported to the server.
        file_name: String,
        /// MIME type of the file.
        content_type: String,
        /// File contents.
        data: Bytes,
    },
}

/// Body representation held across attempts.
#[derive(Debug)]
enum AttemptBody {
    None,
    Json(serde_json::Value),
    Bytes(Bytes),
    Multipart(Vec<MultipartField>),
}

// =========================================================================
// Client
// =========================================================================

/// HTTP transport for the knowledge-base service.
///
/// Cheap to clone and safe for concurrent use: independent calls share one
/// pooled connection set, and the bearer token and retry policy are read
/// once at the start of each call. Updating either is an atomic swap seen
/// by calls that start afterward; in-flight calls keep what they started
/// with.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    config: TransportConfig,
    auth: Arc<RwLock<Option<String>>>,
    retry: Arc<RwLock<RetryConfig>>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

impl Client {
    /// Creates a client with the given configuration and the default retry
    /// policy.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be built.
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .expect("reqwest client");
        Self {
            http,
            auth: Arc::new(RwLock::new(config.initial_bearer())),
            retry: Arc::new(RwLock::new(RetryConfig::default())),
            config,
        }
    }

    /// Replaces the pooled HTTP client, for custom proxies or TLS setup.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Replaces the retry policy used by the next call to start.
    #[must_use]
    pub fn with_retry_config(self, retry: RetryConfig) -> Self {
        self.set_retry_config(retry);
        self
    }

    /// Returns the construction-time configuration.
    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Replaces the bearer token used on subsequent calls.
    ///
    /// In-flight calls keep the token they started with.
    pub fn set_auth(&self, token: impl Into<String>) {
        write_lock(&self.auth, Some(token.into()));
    }

    /// Clears the bearer token.
    pub fn clear_auth(&self) {
        write_lock(&self.auth, None);
    }

    /// Atomically replaces the retry policy for subsequent calls.
    pub fn set_retry_config(&self, retry: RetryConfig) {
        write_lock(&self.retry, retry);
    }

    /// Snapshot of the current retry policy.
    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        read_lock(&self.retry)
    }

    // ---------------------------------------------------------------------
    // Verb helpers
    // ---------------------------------------------------------------------

    /// `GET path`.
    pub async fn get(&self, path: &str) -> Result<Response, TransportError> {
        self.execute(&Request::new(Method::GET, path)).await
    }

    /// `POST path` with a JSON body.
    pub async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, TransportError> {
        self.execute(&Request::new(Method::POST, path).with_json(to_json(body)?))
            .await
    }

    /// `PUT path` with a JSON body.
    pub async fn put<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, TransportError> {
        self.execute(&Request::new(Method::PUT, path).with_json(to_json(body)?))
            .await
    }

    /// `DELETE path`.
    pub async fn delete(&self, path: &str) -> Result<Response, TransportError> {
        self.execute(&Request::new(Method::DELETE, path)).await
    }

    /// `POST path` with a multipart body, re-encoded on every attempt.
    pub async fn post_multipart(
        &self,
        path: &str,
        fields: Vec<MultipartField>,
    ) -> Result<Response, TransportError> {
        self.execute_inner(
            Method::POST,
            path,
            AttemptBody::Multipart(fields),
            &HeaderMap::new(),
        )
        .await
    }

    /// Executes one logical request with retry and classification applied.
    pub async fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        let body = match &request.body {
            None => AttemptBody::None,
            Some(RequestBody::Json(value)) => AttemptBody::Json(value.clone()),
            Some(RequestBody::Bytes(bytes)) => AttemptBody::Bytes(bytes.clone()),
        };
        self.execute_inner(
            request.method.clone(),
            &request.path,
            body,
            &request.headers,
        )
        .await
    }

    /// Opens a streamed request and returns decoded SSE payloads.
    ///
    /// A single attempt: streamed responses are never retried mid-stream.
    /// `body`, when present, is sent as JSON via POST; otherwise a bare GET
    /// is issued. The body is decoded regardless of HTTP status; status
    /// handling for streams is the caller's concern. Dropping the returned
    /// stream cancels the transfer.
    pub async fn stream(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<PayloadStream, TransportError> {
        let url = self.config.url(path);
        let method = if body.is_some() {
            Method::POST
        } else {
            Method::GET
        };
        debug!(%method, %url, "opening stream");

        let mut builder = self.http.request(method, url.as_str());
        if let Some(token) = read_lock(&self.auth) {
            builder = builder.bearer_auth(token);
        }
        if let Some(value) = body {
            builder = builder.json(&value);
        }

        let response = builder.send().await.map_err(|err| {
            let kind = classify::classify_reqwest(&err);
            let detail = classify::error_chain_text(&err);
            TransportError::Network {
                kind,
                detail,
                attempts: 1,
                source: Some(err),
            }
        })?;
        Ok(sse::payload_stream(response))
    }

    // ---------------------------------------------------------------------
    // Retry loop
    // ---------------------------------------------------------------------

    async fn execute_inner(
        &self,
        method: Method,
        path: &str,
        body: AttemptBody,
        headers: &HeaderMap,
    ) -> Result<Response, TransportError> {
        // Policy snapshot: swaps affect calls that start after them.
        let retry = self.retry_config();
        let timeout = self.config.timeout();

        // The deadline bounds all attempts and all backoff sleeps, so a
        // call fails with a timeout even mid-retry.
        match tokio::time::timeout(
            timeout,
            self.run_attempts(method, path, &body, headers, &retry),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::DeadlineExceeded { timeout }),
        }
    }

    async fn run_attempts(
        &self,
        method: Method,
        path: &str,
        body: &AttemptBody,
        headers: &HeaderMap,
        retry: &RetryConfig,
    ) -> Result<Response, TransportError> {
        let url = self.config.url(path);
        let mut attempt: u32 = 0;
        loop {
            debug!(%method, %url, attempt, "issuing request");
            match self.send_once(&method, &url, body, headers).await {
                Ok(response) => {
                    if !classify::is_retryable_status(response.status, retry) {
                        return Ok(response);
                    }
                    if attempt < retry.max_retries {
                        // Retry-After wins over the computed backoff.
                        let delay = retry::parse_retry_after(&response.headers)
                            .unwrap_or_else(|| retry.delay(attempt));
                        warn!(
                            status = response.status,
                            attempt,
                            ?delay,
                            "retryable status, backing off"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    warn!(
                        status = response.status,
                        attempts = attempt + 1,
                        "retries exhausted"
                    );
                    return Err(TransportError::RetryableStatusExhausted {
                        attempts: attempt + 1,
                        response: Box::new(response),
                    });
                }
                Err(err) => {
                    let kind = classify::classify_reqwest(&err);
                    if classify::is_retryable(kind, retry) && attempt < retry.max_retries {
                        let delay = retry.delay(attempt);
                        warn!(%kind, attempt, ?delay, "network failure, backing off");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    let detail = classify::error_chain_text(&err);
                    return Err(TransportError::Network {
                        kind,
                        detail,
                        attempts: attempt + 1,
                        source: Some(err),
                    });
                }
            }
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        body: &AttemptBody,
        headers: &HeaderMap,
    ) -> Result<Response, reqwest::Error> {
        let mut builder = self
            .http
            .request(method.clone(), url)
            .headers(headers.clone());
        if let Some(token) = read_lock(&self.auth) {
            builder = builder.bearer_auth(token);
        }
        builder = match body {
            AttemptBody::None => builder,
            AttemptBody::Json(value) => builder.json(value),
            AttemptBody::Bytes(bytes) => builder.body(bytes.clone()),
            AttemptBody::Multipart(fields) => builder.multipart(build_form(fields)?),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Response {
            status,
            body,
            headers,
        })
    }
}

fn build_form(fields: &[MultipartField]) -> Result<reqwest::multipart::Form, reqwest::Error> {
    let mut form = reqwest::multipart::Form::new();
    for field in fields {
        form = match &field.value {
            MultipartValue::Text(text) => form.text(field.name.clone(), text.clone()),
            MultipartValue::File {
                file_name,
                content_type,
                data,
            } => {
                let part = reqwest::multipart::Part::bytes(data.to_vec())
                    .file_name(file_name.clone())
                    .mime_str(content_type)?;
                form.part(field.name.clone(), part)
            }
        };
    }
    Ok(form)
}

fn to_json<B: Serialize>(body: &B) -> Result<serde_json::Value, TransportError> {
    serde_json::to_value(body)
        .map_err(|err| TransportError::InvalidRequest(format!("body serialization: {err}")))
}

// Poison-tolerant lock access: a panicked writer cannot leave the token or
// retry policy permanently unreadable.
fn read_lock<T: Clone>(lock: &RwLock<T>) -> T {
    match lock.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

fn write_lock<T>(lock: &RwLock<T>, value: T) {
    match lock.write() {
        Ok(mut guard) => *guard = value,
        Err(poisoned) => *poisoned.into_inner() = value,
    }
}
