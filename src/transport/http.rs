//! Shared HTTP client for both local APIs.
//!
//! `reqwest::Client` pools connections internally and is safe to share, so
//! one process-wide instance serves every [`LcuClient`](crate::LcuClient)
//! and [`LiveClientApi`](crate::LiveClientApi) unless a caller injects its
//! own through the builders.

// ============================================================================
// Imports
// ============================================================================

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Per-request timeout for local API calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Process-wide client.
static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

// ============================================================================
// Public API
// ============================================================================

/// Builds a new client that accepts the local self-signed certificate.
///
/// Both APIs live on loopback, so system proxies are bypassed.
///
/// # Errors
///
/// Returns [`Error::Http`](crate::Error::Http) if the TLS backend fails to
/// initialize.
pub fn local_client() -> Result<Client> {
    let client = Client::builder()
        .danger_accept_invalid_certs(true)
        .no_proxy()
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()?;

    Ok(client)
}

/// Returns the process-wide client, building it on first use.
///
/// # Errors
///
/// Returns [`Error::Http`](crate::Error::Http) if the first build fails.
pub fn shared_client() -> Result<Client> {
    if let Some(client) = SHARED_CLIENT.get() {
        return Ok(client.clone());
    }

    let client = local_client()?;
    if SHARED_CLIENT.set(client.clone()).is_ok() {
        debug!("Shared HTTP client initialized");
    }

    Ok(SHARED_CLIENT.get().cloned().unwrap_or(client))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_client_builds() {
        assert!(shared_client().is_ok());
        assert!(shared_client().is_ok());
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(DEFAULT_REQUEST_TIMEOUT.as_secs(), 10);
    }
}
