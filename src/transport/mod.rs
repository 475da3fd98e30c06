//! Transport layer for the local APIs.
//!
//! Both APIs listen on `127.0.0.1` behind a self-signed certificate.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐        HTTPS (REST)          ┌─────────────────┐
//! │  LcuClient      │◄────────────────────────────►│  Client process │
//! │                 │        WSS (wamp)            │  app-port       │
//! │  event loop     │◄────────────────────────────►│                 │
//! └─────────────────┘                              └─────────────────┘
//!
//! ┌─────────────────┐        HTTPS (GET only)      ┌─────────────────┐
//! │  LiveClientApi  │◄────────────────────────────►│  Game process   │
//! │  LiveListener   │        127.0.0.1:2999        │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `http` | Shared `reqwest` client |
//! | `socket` | WebSocket handshake |
//! | `tls` | rustls config accepting the local certificate |

// ============================================================================
// Submodules
// ============================================================================

/// Shared HTTP client.
pub mod http;

/// WebSocket handshake.
pub mod socket;

/// TLS configuration.
pub mod tls;

// ============================================================================
// Re-exports
// ============================================================================

pub use http::{local_client, shared_client};
pub use socket::{LcuSocket, connect, socket_url};
