//! WebSocket connection to the control API.
//!
//! # Handshake
//!
//! 1. Build a request for `wss://127.0.0.1:{port}/`
//! 2. Offer the `wamp` subprotocol
//! 3. Attach `Authorization: Basic base64("riot:" + token)`
//! 4. Connect through a rustls connector that accepts the local certificate

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::{AUTHORIZATION, SEC_WEBSOCKET_PROTOCOL};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream, connect_async_tls_with_config};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::tls;

// ============================================================================
// Constants
// ============================================================================

/// Subprotocol the client's socket speaks.
pub const SUBPROTOCOL: &str = "wamp";

// ============================================================================
// Types
// ============================================================================

/// Socket type produced by [`connect`].
pub type LcuSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// Public API
// ============================================================================

/// Returns the socket URL for a port.
///
/// Format: `wss://127.0.0.1:{port}/`
#[inline]
#[must_use]
pub fn socket_url(port: u16) -> String {
    format!("wss://127.0.0.1:{port}/")
}

/// Opens the control-API socket.
///
/// # Arguments
///
/// * `port` - Port from the client's command line
/// * `authorization` - Full `Authorization` header value (`Basic ...`)
/// * `connect_timeout` - Upper bound for TCP + TLS + upgrade
///
/// # Errors
///
/// - [`Error::Connection`] on timeout, TLS setup failure, or a rejected header
/// - [`Error::WebSocket`] if the upgrade fails
pub async fn connect(
    port: u16,
    authorization: &str,
    connect_timeout: Duration,
) -> Result<LcuSocket> {
    let url = socket_url(port);
    let mut request = url.as_str().into_client_request()?;

    let headers = request.headers_mut();
    headers.insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(SUBPROTOCOL));
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(authorization)
            .map_err(|_| Error::connection("Authorization header contains invalid characters"))?,
    );

    let connector = Connector::Rustls(tls::local_client_config()?);

    debug!(port, "Opening control socket");

    let (socket, response) = timeout(
        connect_timeout,
        connect_async_tls_with_config(request, None, false, Some(connector)),
    )
    .await
    .map_err(|_| {
        Error::connection(format!(
            "Socket handshake timed out after {}ms",
            connect_timeout.as_millis()
        ))
    })??;

    info!(port, status = %response.status(), "Control socket established");

    Ok(socket)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_url_format() {
        assert_eq!(socket_url(51234), "wss://127.0.0.1:51234/");
    }

    #[tokio::test]
    async fn test_connect_refused_port_fails() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = connect(port, "Basic cmlvdDp4", Duration::from_secs(2)).await;
        assert!(result.is_err());
    }
}
