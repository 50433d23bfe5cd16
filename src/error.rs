//! Error types for spotremote
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for spotremote operations
///
/// The variants follow the failure taxonomy of the remote: configuration
/// and storage problems, authorization-flow failures (which restart the
/// flow), token lifecycle failures (which force a logout), control-plane
/// failures (which are logged and swallowed), and malformed user input
/// (which is reported back to the user).
#[derive(Error, Debug)]
pub enum SpotRemoteError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Durable storage errors (opening or accessing the key/value store)
    #[error("Storage error: {0}")]
    Storage(String),

    /// The token exchange was triggered but no PKCE verifier was stored
    #[error("No stored PKCE verifier; authorization must be restarted")]
    MissingVerifier,

    /// The token endpoint rejected the exchange or returned a malformed body
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// The provider redirected back with an `error` parameter
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// No access token is stored
    #[error("Not authenticated; run `spotremote login` first")]
    NotAuthenticated,

    /// The stored access token is past its expiry
    #[error("Access token expired")]
    TokenExpired,

    /// The stored access token has a missing or unreadable expiry
    #[error("Stored access token is malformed: {0}")]
    TokenMalformed(String),

    /// Control-plane API returned a non-success status
    #[error("API error: status={status}, {message}")]
    Api {
        /// HTTP status code returned by the API
        status: u16,
        /// Response body or a short description
        message: String,
    },

    /// The playlist URL does not contain a `playlist/<id>` segment
    #[error("Invalid playlist URL: {0}")]
    InvalidPlaylistUrl(String),

    /// The playback device never became ready
    #[error("Playback device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The loopback redirect listener failed
    #[error("Redirect callback error: {0}")]
    Callback(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for spotremote operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation. Callers that
/// need to branch on a failure kind use `downcast_ref::<SpotRemoteError>()`.
pub type Result<T> = anyhow::Result<T>;
