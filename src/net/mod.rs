//! HTTP access to the book server.
//!
//! This module provides the networking infrastructure for Shiori:
//!
//! - **HTTP Client**: An owned, configured client with connection pooling
//! - **Authentication**: HTTP basic credentials or an API key header
//! - **Rate Limiting**: Optional minimum delay between requests
//! - **Retry Logic**: Automatic retries with exponential backoff
//!
//! There is no process-wide client. Each [`HttpClient`] owns its
//! `reqwest::Client`, so a reader session's network stack lives and dies with
//! the services it was built from.
//!
//! # Examples
//!
//! ```rust,no_run
//! use shiori::net::{HttpClient, ServerAuth};
//!
//! # async fn example() -> shiori::Result<()> {
//! let client = HttpClient::new("https://komga.example.com", ServerAuth::api_key("secret"))?
//!     .with_max_retries(3);
//!
//! let json: serde_json::Value = client.get_json("api/v1/books/0A1B2C").await?;
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

/// Header carrying a Komga API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Minimum delay enforcer shared by clones of one client.
///
/// # Thread Safety
///
/// The rate limiter uses a `Mutex` internally and is safe to use across multiple
/// threads and async tasks.
#[derive(Debug)]
pub struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    delay: Duration,
}

impl RateLimiter {
    /// Creates a rate limiter; a delay of `0` disables it.
    ///
    /// ```rust
    /// use shiori::net::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(250);
    /// ```
    pub fn new(delay_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Waits until the configured delay has passed since the last request.
    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }
        let wait_duration = {
            let last = self.last_request.lock();
            last.map(|last| last.elapsed())
                .filter(|elapsed| *elapsed < self.delay)
                .map(|elapsed| self.delay - elapsed)
        };

        if let Some(duration) = wait_duration {
            tokio::time::sleep(duration).await;
        }

        *self.last_request.lock() = Some(Instant::now());
    }
}

/// Credentials sent with every request.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum ServerAuth {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    ApiKey(String),
}

impl ServerAuth {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        ServerAuth::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn api_key(key: impl Into<String>) -> Self {
        ServerAuth::ApiKey(key.into())
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            ServerAuth::None => request,
            ServerAuth::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            ServerAuth::ApiKey(key) => request.header(API_KEY_HEADER, key),
        }
    }
}

// Credentials never show up in logs.
impl std::fmt::Debug for ServerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerAuth::None => f.write_str("None"),
            ServerAuth::Basic { username, .. } => {
                f.debug_struct("Basic").field("username", username).finish_non_exhaustive()
            }
            ServerAuth::ApiKey(_) => f.write_str("ApiKey(..)"),
        }
    }
}

/// HTTP client bound to one server.
///
/// `HttpClient` resolves request paths against the server's base URL,
/// attaches credentials, applies rate limiting and retries transient
/// failures with exponential backoff. Non-success responses are mapped to
/// [`Error`] variants by [`status_error`].
///
/// Cloning is cheap and clones share the connection pool and rate limiter.
///
/// # Examples
///
/// ```rust
/// use shiori::net::{HttpClient, ServerAuth};
///
/// # fn example() -> shiori::Result<()> {
/// let client = HttpClient::new("https://komga.example.com/", ServerAuth::None)?
///     .with_rate_limit(100)
///     .with_max_retries(5);
/// assert_eq!(
///     client.url("api/v1/books/42")?.as_str(),
///     "https://komga.example.com/api/v1/books/42"
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
    auth: ServerAuth,
    rate_limiter: Arc<RateLimiter>,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpClient {
    /// Creates a client for the server at `base_url`.
    ///
    /// The client is initialized with:
    /// - 30-second timeout
    /// - Connection pooling (10 idle connections per host)
    /// - Compression support (gzip, brotli)
    /// - 3 maximum retries, starting at a 500ms backoff
    ///
    /// # Errors
    ///
    /// * [`Error::Url`] - If `base_url` cannot be parsed
    /// * [`Error::Network`] - If the TLS backend cannot be initialized
    pub fn new(base_url: &str, auth: ServerAuth) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("Shiori/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(10)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            base_url,
            auth,
            rate_limiter: Arc::new(RateLimiter::new(0)),
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// Sets a minimum delay between requests in milliseconds.
    pub fn with_rate_limit(mut self, delay_ms: u64) -> Self {
        self.rate_limiter = Arc::new(RateLimiter::new(delay_ms));
        self
    }

    /// Sets the maximum number of retries for failed requests.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the delay before the first retry; later retries double it.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `path` against the base URL.
    ///
    /// Leading slashes are ignored so that servers mounted under a sub-path
    /// keep their prefix.
    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay
            .saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response> {
        let url = self.url(path)?;
        let mut attempts = 0;

        loop {
            self.rate_limiter.wait().await;

            let mut request = self
                .auth
                .apply(self.client.request(method.clone(), url.clone()));
            if let Some(body) = body {
                request = request.json(body);
            }

            let error = match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => status_error(response).await,
                Err(e) => Error::from(e),
            };

            if error.is_retryable() && attempts < self.max_retries {
                attempts += 1;
                let delay = self.backoff(attempts);
                debug!(%url, attempts, ?delay, %error, "Retrying request");
                tokio::time::sleep(delay).await;
                continue;
            }

            warn!(%url, %method, %error, "Request failed");
            return Err(error);
        }
    }

    /// Performs a GET request and returns the response body.
    ///
    /// # Errors
    ///
    /// * [`Error::Unauthorized`] - For 401 and 403 responses
    /// * [`Error::NotFound`] - For 404 responses
    /// * [`Error::Http`] - For other non-success responses, after retries
    /// * [`Error::Network`] - For network/connection errors, after retries
    pub async fn get(&self, path: &str) -> Result<Bytes> {
        let response = self.send(Method::GET, path, None).await?;
        Ok(response.bytes().await?)
    }

    /// Performs a GET request and deserializes the response as JSON.
    ///
    /// # Errors
    ///
    /// * All errors from [`get()`](HttpClient::get)
    /// * [`Error::Json`] - If JSON parsing fails
    pub async fn get_json<T>(&self, path: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let bytes = self.get(path).await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }

    /// Sends `body` as JSON with a PATCH request, discarding the response body.
    pub async fn patch_json<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.send(Method::PATCH, path, Some(&body)).await?;
        Ok(())
    }
}

/// Maps a non-success response to an [`Error`].
pub async fn status_error(response: Response) -> Error {
    let status = response.status();
    let path = response.url().path().to_string();
    let message = response.text().await.unwrap_or_default();
    error_for_status(status, &path, message)
}

fn error_for_status(status: StatusCode, path: &str, message: String) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized,
        StatusCode::NOT_FOUND => Error::not_found(path.to_string()),
        status => {
            let message = if message.trim().is_empty() {
                status.canonical_reason().unwrap_or("Unknown status").to_string()
            } else {
                message
            };
            Error::http(status.as_u16(), message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_keep_the_mount_path() {
        let client = HttpClient::new("https://example.com/komga", ServerAuth::None).unwrap();
        assert_eq!(
            client.url("/api/v1/books/1/pages").unwrap().as_str(),
            "https://example.com/komga/api/v1/books/1/pages"
        );
    }

    #[test]
    fn invalid_base_url() {
        let result = HttpClient::new("not a url", ServerAuth::None);
        assert!(matches!(result, Err(Error::Url(_))));
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            error_for_status(StatusCode::FORBIDDEN, "/x", String::new()),
            Error::Unauthorized
        ));
        assert!(matches!(
            error_for_status(StatusCode::NOT_FOUND, "/api/v1/books/9", String::new()),
            Error::NotFound(path) if path == "/api/v1/books/9"
        ));
        let error = error_for_status(StatusCode::BAD_GATEWAY, "/x", String::new());
        assert_eq!(error.to_string(), "HTTP 502: Bad Gateway");
        assert!(error.is_retryable());
    }

    #[test]
    fn backoff_doubles() {
        let client = HttpClient::new("https://example.com", ServerAuth::None)
            .unwrap()
            .with_retry_delay(Duration::from_millis(100));
        assert_eq!(client.backoff(1), Duration::from_millis(100));
        assert_eq!(client.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn credentials_are_not_logged() {
        let auth = ServerAuth::basic("reader", "hunter2");
        let printed = format!("{:?}", auth);
        assert!(printed.contains("reader"));
        assert!(!printed.contains("hunter2"));
        assert_eq!(format!("{:?}", ServerAuth::api_key("k")), "ApiKey(..)");
    }

    #[tokio::test]
    async fn zero_delay_rate_limiter_does_not_wait() {
        let limiter = RateLimiter::new(0);
        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
