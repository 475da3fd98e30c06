//! Session secrets for one live connection.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};
use crate::process::CommandLineArgs;

// ============================================================================
// Constants
// ============================================================================

/// Username the client expects in Basic credentials.
pub const AUTH_USERNAME: &str = "riot";

/// Command-line keys a session is built from.
const PORT_KEY: &str = "app-port";
const REGION_KEY: &str = "region";
const LOCALE_KEY: &str = "locale";
const TOKEN_KEY: &str = "remoting-auth-token";

// ============================================================================
// Session
// ============================================================================

/// Credentials and metadata of a connected client.
///
/// Created by the handshake and dropped on disconnect. The token is kept in
/// its derived `base64("riot:" + raw)` form only.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    port: u16,
    region: String,
    locale: String,
    auth_token: String,
}

impl Session {
    /// Creates a session, deriving the auth token from the raw secret.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandshakeFailed`] if `port` is 0.
    pub fn new(
        port: u16,
        region: impl Into<String>,
        locale: impl Into<String>,
        raw_token: &str,
    ) -> Result<Self> {
        if port == 0 {
            return Err(Error::handshake_failed("port 0 is not a valid app-port"));
        }

        Ok(Self {
            port,
            region: region.into(),
            locale: locale.into(),
            auth_token: derive_auth_token(raw_token),
        })
    }

    /// Extracts a session from the client's command line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandshakeFailed`] if any of `app-port`, `region`,
    /// `locale`, `remoting-auth-token` is missing or the port is invalid.
    pub fn from_command_line(args: &CommandLineArgs) -> Result<Self> {
        let require = |key: &str| {
            args.get(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| Error::handshake_failed(format!("missing --{key}")))
        };

        let port = require(PORT_KEY)?;
        let port: u16 = port
            .parse()
            .map_err(|_| Error::handshake_failed(format!("invalid --{PORT_KEY}: {port}")))?;

        Self::new(port, require(REGION_KEY)?, require(LOCALE_KEY)?, require(TOKEN_KEY)?)
    }

    /// Returns the API port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the client region.
    #[inline]
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Returns the client locale.
    #[inline]
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Returns the derived token (`base64("riot:" + raw)`).
    #[inline]
    #[must_use]
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Returns the `Authorization` header value.
    #[inline]
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("Basic {}", self.auth_token)
    }

    /// Returns the REST base URL.
    ///
    /// Format: `https://127.0.0.1:{port}`
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("https://127.0.0.1:{}", self.port)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("port", &self.port)
            .field("region", &self.region)
            .field("locale", &self.locale)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// Encodes `riot:<raw>` as base64.
#[must_use]
pub fn derive_auth_token(raw_token: &str) -> String {
    STANDARD.encode(format!("{AUTH_USERNAME}:{raw_token}"))
}

// ============================================================================
// Tests
// ============================================================================
