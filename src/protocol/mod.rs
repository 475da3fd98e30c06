//! Control-API socket protocol types.
//!
//! This module defines the message format spoken over the client's
//! WAMP-flavoured WebSocket.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Shape |
//! |---------|-----------|-------|
//! | [`ControlMessage`] | Local → Client | `[opcode, eventName]` |
//! | [`InboundFrame`] | Client → Local | `[kind, eventName, payload]` |
//! | [`SubscriptionMessage`] | decoded | `{ endpoint, eventType, data }` |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `buffer` | Fragment reassembly |
//! | `endpoint` | Path normalization and event-name derivation |
//! | `message` | Outbound and inbound frames |

// ============================================================================
// Submodules
// ============================================================================

/// Fragment reassembly.
pub mod buffer;

/// Endpoint normalization.
pub mod endpoint;

/// Socket message types.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use buffer::MessageBuffer;
pub use endpoint::{
    AVAILABILITY_ENDPOINT, CURRENT_SUMMONER_ENDPOINT, EVENT_PREFIX, Endpoint,
    GAMEFLOW_PHASE_ENDPOINT, PROCESS_EXIT_ENDPOINT, normalize,
};
pub use message::{ControlMessage, EventType, InboundFrame, Opcode, SubscriptionMessage};
