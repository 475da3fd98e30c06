//! LCU Bridge - Async client for the local League Client APIs.
//!
//! This library talks to a running game client over its two private local
//! APIs:
//!
//! - **Control API (LCU)**: REST plus a WebSocket carrying WAMP-style
//!   subscribe/event frames, on a random port published on the client's
//!   command line
//! - **Live Client Data**: read-only REST telemetry served by the game
//!   process while a match is loaded
//!
//! # Architecture
//!
//! ```text
//! LcuClient ──try_connect──► ProcessLocator ─► Session (port, token)
//!     │                                            │
//!     │                          availability check (REST)
//!     │                                            │
//!     └── event loop ◄──── WSS wamp ◄──────────────┘
//!            │
//!            ├─► DerivedState   (gameflow phase, summoner)
//!            └─► SubscriptionRegistry ─► callbacks
//!
//! LiveListener ──poll──► SnapshotSource (LiveClientApi)
//!     │
//!     └─ EventCursor ─► data_updated, game_event × new records
//! ```
//!
//! Key design principles:
//!
//! - Each connection owns one event-loop task and one command channel
//! - Subscriptions survive reconnects when configured to
//! - The listener reports each event record exactly once per match
//! - Callback panics are contained and logged
//!
//! # Quick Start
//!
//! ```no_run
//! use lcu_bridge::{Callback, LcuClient, Result, SubscriptionMessage};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = LcuClient::builder()
//!         .preserve_subscriptions(true)
//!         .build()?;
//!
//!     client.subscribe(
//!         "/lol-champ-select/v1/session",
//!         Callback::new(|message: &SubscriptionMessage| println!("{:?}: {}", message.event_type, message.data)),
//!     )?;
//!
//!     client.force_connect(None).await;
//!     println!("Phase: {}", client.gameflow_phase());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api_key`] | Developer API key format check |
//! | [`client`] | Control-API connection, subscriptions, requests |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`live`] | Telemetry accessors and polling listener |
//! | [`observer`] | Callback handles and observer lists |
//! | [`process`] | Client process discovery |
//! | [`protocol`] | WAMP frame types and endpoints |
//! | [`transport`] | TLS, HTTP and WebSocket plumbing |

// ============================================================================
// Modules
// ============================================================================

/// Developer API key.
pub mod api_key;

/// Control-API client.
///
/// Use [`LcuClient::builder()`] to configure a client.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// In-match telemetry.
///
/// - [`LiveClientApi`] - Typed accessors
/// - [`LiveListener`] - Event-log polling
pub mod live;

/// Callback handles and observer lists.
pub mod observer;

/// Client process discovery.
pub mod process;

/// WAMP protocol message types.
///
/// Mostly internal; [`SubscriptionMessage`] is what subscribers receive.
pub mod protocol;

/// Transport layer.
///
/// Internal module handling TLS, HTTP and the WebSocket handshake.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ClientBuilder, GameflowPhase, Handler, LcuClient, Session, Summoner};

// Telemetry types
pub use live::{
    AllGameData, GameEvent, GameEventKind, ListenerBuilder, LiveClientApi, LiveListener,
    SnapshotSource,
};

// Protocol types
pub use protocol::{Endpoint, EventType, SubscriptionMessage};

// Process discovery
pub use process::{CommandLineArgs, ProcessLocator, SystemProcessLocator};

// Shared types
pub use api_key::ApiKey;
pub use error::{Error, Result};
pub use observer::{Callback, Observers};
