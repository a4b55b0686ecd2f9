//! Error types and result handling for Shiori operations.
//!
//! All fallible operations return a [`Result<T>`] which is a type alias for
//! `std::result::Result<T, Error>`.
//!
//! Note that the pagination core ([`layout`](crate::layout),
//! [`navigation`](crate::navigation), [`gesture`](crate::gesture)) never
//! produces errors: out-of-range indices are clamped or ignored there. Errors
//! only come from the collaborators around it (server access, the page cache,
//! configuration loading and session setup).
//!
//! # Error Categories
//!
//! - **Network Errors**: Connection issues, timeouts, transport failures
//! - **HTTP Errors**: Non-success responses from the server
//! - **Authorization**: Missing or rejected credentials
//! - **Not Found**: Missing books or pages
//! - **Unsupported**: Media the paginated reader cannot display
//! - **IO / JSON / Config**: Local cache, payload and configuration failures
//!
//! # Examples
//!
//! ```rust
//! use shiori::error::{Error, Result};
//!
//! fn describe(result: Result<()>) -> &'static str {
//!     match result {
//!         Ok(()) => "ok",
//!         Err(Error::Unauthorized) => "log in again",
//!         Err(Error::NotFound(_)) => "book removed from the server",
//!         Err(_) => "retry later",
//!     }
//! }
//!
//! assert_eq!(describe(Err(Error::Unauthorized)), "log in again");
//! ```

use thiserror::Error;

/// Type alias for Results with Shiori errors.
///
/// ```rust
/// use shiori::{Error, Result};
///
/// fn example_with_error() -> Result<()> {
///     Err(Error::parse("page list is not an array"))
/// }
///
/// assert!(example_with_error().is_err());
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all Shiori operations.
///
/// # Variants
///
/// * [`Network`](Error::Network) - HTTP client and connection errors
/// * [`Http`](Error::Http) - Non-success status codes
/// * [`Unauthorized`](Error::Unauthorized) - Rejected credentials (401/403)
/// * [`NotFound`](Error::NotFound) - Missing resources
/// * [`Parse`](Error::Parse) - Unexpected payload shapes
/// * [`Unsupported`](Error::Unsupported) - Media that cannot be paginated
/// * [`Io`](Error::Io) - Cache and file system errors
/// * [`Json`](Error::Json) - JSON serialization errors
/// * [`Config`](Error::Config) - Invalid configuration files
/// * [`Url`](Error::Url) - Malformed server URLs
/// * [`Cancelled`](Error::Cancelled) - Work abandoned because its session closed
/// * [`Other`](Error::Other) - Generic error messages
#[derive(Error, Debug)]
pub enum Error {
    /// Network-related errors from HTTP operations.
    ///
    /// Wraps errors from the underlying HTTP client (reqwest): connection
    /// timeouts, DNS resolution failures, TLS errors.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    ///
    /// # Fields
    ///
    /// * `status` - HTTP status code
    /// * `message` - Response body or reason phrase
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The server rejected the configured credentials.
    #[error("Unauthorized: check the server credentials")]
    Unauthorized,

    /// Resource not found errors.
    ///
    /// ```rust
    /// use shiori::Error;
    ///
    /// let error = Error::not_found("Book with ID '0A1B2C'");
    /// assert_eq!(error.to_string(), "Not found: Book with ID '0A1B2C'");
    /// ```
    #[error("Not found: {0}")]
    NotFound(String),

    /// Data parsing and format errors.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The book's media cannot be shown by the paginated reader.
    ///
    /// Raised for media that is not `READY`, or for reflowable EPUB content
    /// that has no DIVINA rendition.
    #[error("Unsupported media: {0}")]
    Unsupported(String),

    /// File system and IO operation errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization and deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file errors.
    #[error("Config error: {0}")]
    Config(String),

    /// Malformed server URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The owning reader session was closed before the work finished.
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error messages.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a parse error with the given message.
    ///
    /// ```rust
    /// use shiori::Error;
    ///
    /// let error = Error::parse(format!("Expected {} pages, found {}", 10, 5));
    /// assert!(matches!(error, Error::Parse(_)));
    /// ```
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Creates a not found error with the given message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Creates an HTTP status error.
    ///
    /// ```rust
    /// use shiori::Error;
    ///
    /// let error = Error::http(502, "Bad Gateway");
    /// assert_eq!(error.to_string(), "HTTP 502: Bad Gateway");
    /// ```
    pub fn http(status: u16, msg: impl Into<String>) -> Self {
        Error::Http {
            status,
            message: msg.into(),
        }
    }

    /// Creates an unsupported media error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Returns `true` when retrying the same request may succeed.
    ///
    /// Transport failures and 5xx/429 responses are retryable; everything
    /// else is a permanent answer from the server.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
