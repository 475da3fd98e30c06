//! Error types for lcu-bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use lcu_bridge::{LcuClient, Result};
//!
//! async fn example(client: &LcuClient) -> Result<()> {
//!     let response = client.request(Method::GET, "/lol-summoner/v1/current-summoner", None, false).await?;
//!     println!("{}", response.status());
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidApiKey`] |
//! | Session | [`Error::NotConnected`], [`Error::AlreadyInProgress`], [`Error::HandshakeFailed`] |
//! | Subscription | [`Error::DuplicateCallback`], [`Error::Unparseable`] |
//! | Request | [`Error::RequestFailed`], [`Error::UnexpectedStatus`] |
//! | Listener | [`Error::AlreadyRunning`], [`Error::NotRunning`], [`Error::UnexpectedPollFailure`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Http`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use reqwest::StatusCode;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when a builder is given an invalid configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// API key does not match the `RGAPI-xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` format.
    #[error("Invalid API key format")]
    InvalidApiKey,

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Operation requires an active session.
    #[error("Not connected to the client API")]
    NotConnected,

    /// A connect or disconnect is already running.
    ///
    /// Single-flight violations are swallowed by the public API; this
    /// variant only travels between internal layers.
    #[error("Operation already in progress: {operation}")]
    AlreadyInProgress {
        /// The operation that was already running.
        operation: &'static str,
    },

    /// A connection attempt stopped at one of its gates.
    ///
    /// Never surfaced by [`LcuClient::try_connect`](crate::LcuClient::try_connect);
    /// the attempt is simply retried.
    #[error("Handshake failed: {reason}")]
    HandshakeFailed {
        /// Which gate failed.
        reason: String,
    },

    // ========================================================================
    // Subscription Errors
    // ========================================================================
    /// The same callback handle is already registered for this endpoint.
    #[error("Callback already registered for {endpoint}")]
    DuplicateCallback {
        /// Normalized endpoint.
        endpoint: String,
    },

    /// Malformed inbound frame.
    ///
    /// The inbound loop logs and skips these.
    #[error("Unparseable frame: {message}")]
    Unparseable {
        /// What was wrong with the frame.
        message: String,
    },

    // ========================================================================
    // Request Errors
    // ========================================================================
    /// Transport failure on a control-API request.
    #[error("Request to {endpoint} failed: {source}")]
    RequestFailed {
        /// Normalized endpoint the request targeted.
        endpoint: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Response status was not a success.
    #[error("Request to {endpoint} returned {status}")]
    UnexpectedStatus {
        /// Normalized endpoint the request targeted.
        endpoint: String,
        /// Status code returned.
        status: StatusCode,
    },

    // ========================================================================
    // Listener Errors
    // ========================================================================
    /// Listener is already polling.
    #[error("Listener is already running")]
    AlreadyRunning,

    /// Listener is not polling.
    #[error("Listener is not running")]
    NotRunning,

    /// Polling task failed for a reason other than a lost connection.
    #[error("Unexpected poll failure: {message}")]
    UnexpectedPollFailure {
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    ///
    /// Returned when the socket or its TLS layer cannot be set up.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// WebSocket connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// HTTP client error outside of a specific request.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an already-in-progress error.
    #[inline]
    pub fn already_in_progress(operation: &'static str) -> Self {
        Self::AlreadyInProgress { operation }
    }

    /// Creates a handshake failure.
    #[inline]
    pub fn handshake_failed(reason: impl Into<String>) -> Self {
        Self::HandshakeFailed {
            reason: reason.into(),
        }
    }

    /// Creates a duplicate callback error.
    #[inline]
    pub fn duplicate_callback(endpoint: impl Into<String>) -> Self {
        Self::DuplicateCallback {
            endpoint: endpoint.into(),
        }
    }

    /// Creates an unparseable frame error.
    #[inline]
    pub fn unparseable(message: impl Into<String>) -> Self {
        Self::Unparseable {
            message: message.into(),
        }
    }

    /// Creates a request failure wrapping the transport error.
    #[inline]
    pub fn request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::RequestFailed {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Creates an unexpected status error.
    #[inline]
    pub fn unexpected_status(endpoint: impl Into<String>, status: StatusCode) -> Self {
        Self::UnexpectedStatus {
            endpoint: endpoint.into(),
            status,
        }
    }

    /// Creates an unexpected poll failure.
    #[inline]
    pub fn unexpected_poll_failure(message: impl Into<String>) -> Self {
        Self::UnexpectedPollFailure {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::HandshakeFailed { .. }
                | Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the error was caused by calling the API incorrectly.
    #[inline]
    #[must_use]
    pub fn is_caller_misuse(&self) -> bool {
        matches!(
            self,
            Self::DuplicateCallback { .. }
                | Self::AlreadyRunning
                | Self::NotRunning
                | Self::Config { .. }
                | Self::InvalidApiKey
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::HandshakeFailed { .. }
                | Self::RequestFailed { .. }
                | Self::Connection { .. }
                | Self::ConnectionClosed
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("tls handshake");
        assert_eq!(err.to_string(), "Connection failed: tls handshake");
    }

    #[test]
    fn test_duplicate_callback_display() {
        let err = Error::duplicate_callback("/lol-gameflow/v1/session");
        assert_eq!(
            err.to_string(),
            "Callback already registered for /lol-gameflow/v1/session"
        );
    }

    #[test]
    fn test_unexpected_status_display() {
        let err = Error::unexpected_status("/lol-chat/v1/me", StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Request to /lol-chat/v1/me returned 404 Not Found");
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::NotConnected.is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(Error::handshake_failed("api not ready").is_connection_error());
        assert!(!Error::AlreadyRunning.is_connection_error());
    }

    #[test]
    fn test_is_caller_misuse() {
        assert!(Error::duplicate_callback("/a").is_caller_misuse());
        assert!(Error::AlreadyRunning.is_caller_misuse());
        assert!(Error::NotRunning.is_caller_misuse());
        assert!(!Error::unexpected_poll_failure("boom").is_caller_misuse());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::NotConnected.is_recoverable());
        assert!(!Error::unexpected_poll_failure("boom").is_recoverable());
        assert!(!Error::config("bad").is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "no such process");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
