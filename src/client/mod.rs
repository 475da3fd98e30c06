//! Control-API connection management.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | [`ClientBuilder`] |
//! | `core` | [`LcuClient`] lifecycle, subscriptions, requests |
//! | `event_loop` | Per-connection socket task |
//! | `registry` | Endpoint → callbacks map |
//! | `session` | Port, region, locale, derived token |
//! | `state` | Gameflow phase and summoner tracking |

// ============================================================================
// Submodules
// ============================================================================

/// Client builder.
pub mod builder;

/// Client core.
pub mod core;

/// Socket event loop.
mod event_loop;

/// Subscription registry.
pub mod registry;

/// Session credentials.
pub mod session;

/// Derived client state.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{
    ClientBuilder, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PROCESS_NAME, DEFAULT_RETRY_INTERVAL,
};
pub use core::LcuClient;
pub use registry::{ControlAction, Handler, SubscriptionRegistry};
pub use session::{AUTH_USERNAME, Session, derive_auth_token};
pub use state::{DerivedState, GameflowPhase, RerollPoints, Summoner};
