//! Unified error types for the market admin client.

use thiserror::Error;

/// Fallback shown when the server gives no message of its own.
pub const GENERIC_FAILURE: &str = "request failed";

/// Unified error type for the market admin client.
#[derive(Error, Debug)]
pub enum AdminError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Remote API error.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Local market state error.
    #[error("market error: {0}")]
    Market(#[from] MarketError),

    /// Create form error.
    #[error("form error: {0}")]
    Form(#[from] FormError),

    /// Token store error.
    #[error("token store error: {0}")]
    Store(#[from] StoreError),
}

impl AdminError {
    /// Message suitable for a user-facing notice.
    ///
    /// API failures surface the server's own message when it sent one.
    pub fn notice_message(&self) -> String {
        match self {
            AdminError::Api(e) => e.message().to_string(),
            AdminError::Market(e) => e.to_string(),
            AdminError::Form(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

/// Remote API errors.
///
/// The client does not distinguish auth, not-found or validation failures;
/// all of them are a `RequestFailed` carrying whatever the server said.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-2xx response.
    #[error("{operation} failed: HTTP {status} - {message}")]
    RequestFailed {
        /// Operation that failed.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or a generic fallback.
        message: String,
    },

    /// Network or body decoding failure.
    #[error("{operation} failed: {source}")]
    Transport {
        /// Operation that failed.
        operation: &'static str,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// Endpoint URL could not be built.
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// The message carried by this failure.
    pub fn message(&self) -> &str {
        match self {
            ApiError::RequestFailed { message, .. } => message,
            ApiError::Transport { .. } | ApiError::Url(_) => GENERIC_FAILURE,
        }
    }
}

/// Local market state errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MarketError {
    /// No market with this id in the local collection.
    #[error("market {market_id} not found")]
    NotFound {
        /// The id that was looked up.
        market_id: String,
    },

    /// A market is already being added.
    #[error("a market is already being added")]
    AddInProgress,
}

/// Create form validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    /// Time is not a 24-hour `HH:MM` value.
    #[error("invalid {field} '{value}': expected HH:MM")]
    InvalidTime {
        /// Which field was malformed.
        field: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Market name is empty.
    #[error("market name is required")]
    EmptyName,

    /// The form is not open.
    #[error("form is closed")]
    Closed,
}

/// Token store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No usable store location.
    #[error("no token store path available")]
    NoPath,

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AdminError>;
