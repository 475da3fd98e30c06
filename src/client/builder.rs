//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`LcuClient`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use lcu_bridge::LcuClient;
//!
//! # fn example() -> lcu_bridge::Result<()> {
//! let client = LcuClient::builder()
//!     .retry_interval(Duration::from_secs(2))
//!     .preserve_subscriptions(false)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::process::{ProcessLocator, SystemProcessLocator};
use crate::transport::shared_client;

use super::core::LcuClient;

// ============================================================================
// Constants
// ============================================================================

/// Process whose command line carries the API credentials.
pub const DEFAULT_PROCESS_NAME: &str = "LeagueClientUx";

/// Delay between attempts in [`LcuClient::force_connect`].
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound for the socket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// ClientConfig
// ============================================================================

/// Validated client settings.
#[derive(Debug, Clone)]
pub(crate) struct ClientConfig {
    pub(crate) process_name: String,
    pub(crate) retry_interval: Duration,
    pub(crate) preserve_subscriptions: bool,
    pub(crate) track_state: bool,
    pub(crate) connect_timeout: Duration,
}

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring an [`LcuClient`] instance.
///
/// Use [`LcuClient::builder()`] to create a new builder.
#[derive(Clone)]
pub struct ClientBuilder {
    /// Name of the process to discover.
    process_name: String,
    /// Delay between connection attempts.
    retry_interval: Duration,
    /// Keep subscriptions across disconnects.
    preserve_subscriptions: bool,
    /// Track gameflow phase and summoner.
    track_state: bool,
    /// Socket handshake timeout.
    connect_timeout: Duration,
    /// Process discovery seam.
    locator: Option<Arc<dyn ProcessLocator>>,
    /// HTTP client override.
    http_client: Option<reqwest::Client>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            process_name: DEFAULT_PROCESS_NAME.to_string(),
            retry_interval: DEFAULT_RETRY_INTERVAL,
            preserve_subscriptions: true,
            track_state: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            locator: None,
            http_client: None,
        }
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("process_name", &self.process_name)
            .field("retry_interval", &self.retry_interval)
            .field("preserve_subscriptions", &self.preserve_subscriptions)
            .field("track_state", &self.track_state)
            .field("connect_timeout", &self.connect_timeout)
            .field("custom_locator", &self.locator.is_some())
            .field("custom_http_client", &self.http_client.is_some())
            .finish()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the process name to discover.
    ///
    /// # Arguments
    ///
    /// * `name` - Executable name, with or without `.exe`
    #[inline]
    #[must_use]
    pub fn process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = name.into();
        self
    }

    /// Sets the delay between attempts in [`LcuClient::force_connect`].
    #[inline]
    #[must_use]
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Keeps subscriptions across disconnects and re-sends them on connect.
    #[inline]
    #[must_use]
    pub fn preserve_subscriptions(mut self, preserve: bool) -> Self {
        self.preserve_subscriptions = preserve;
        self
    }

    /// Tracks gameflow phase and current summoner from the event stream.
    #[inline]
    #[must_use]
    pub fn track_state(mut self, track: bool) -> Self {
        self.track_state = track;
        self
    }

    /// Sets the socket handshake timeout.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Replaces the OS process locator.
    #[inline]
    #[must_use]
    pub fn locator(mut self, locator: Arc<dyn ProcessLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Replaces the shared HTTP client.
    ///
    /// The client must accept the local self-signed certificate.
    #[inline]
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the client with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the process name is empty
    /// - [`Error::Config`] if the retry interval or connect timeout is zero
    /// - [`Error::Http`] if the shared HTTP client cannot be built
    pub fn build(self) -> Result<LcuClient> {
        let config = self.validate()?;

        let locator = self
            .locator
            .unwrap_or_else(|| Arc::new(SystemProcessLocator::new()));
        let http = match self.http_client {
            Some(client) => client,
            None => shared_client()?,
        };

        Ok(LcuClient::from_parts(config, locator, http))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Validates the settings.
    fn validate(&self) -> Result<ClientConfig> {
        if self.process_name.trim().is_empty() {
            return Err(Error::config(
                "Process name must not be empty.\n\
                 Example: LcuClient::builder().process_name(\"LeagueClientUx\")",
            ));
        }

        if self.retry_interval.is_zero() {
            return Err(Error::config("Retry interval must be greater than zero"));
        }

        if self.connect_timeout.is_zero() {
            return Err(Error::config("Connect timeout must be greater than zero"));
        }

        Ok(ClientConfig {
            process_name: self.process_name.trim().to_string(),
            retry_interval: self.retry_interval,
            preserve_subscriptions: self.preserve_subscriptions,
            track_state: self.track_state,
            connect_timeout: self.connect_timeout,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
