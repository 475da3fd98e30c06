//! Control-channel and inbound socket messages.
//!
//! # Outbound
//!
//! ```json
//! [5, "OnJsonApiEvent_lol-gameflow_v1_gameflow-phase"]
//! ```
//!
//! # Inbound
//!
//! ```json
//! [8, "OnJsonApiEvent_lol-gameflow_v1_gameflow-phase",
//!  { "uri": "/lol-gameflow/v1/gameflow-phase", "eventType": "Update", "data": "Lobby" }]
//! ```
//!
//! Frames whose second element does not start with `OnJsonApiEvent` are
//! protocol acknowledgements (for example the welcome frame) and carry
//! nothing to dispatch.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Error, Result};

use super::endpoint::{EVENT_PREFIX, Endpoint};

// ============================================================================
// Opcode
// ============================================================================

/// Control-channel opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Start receiving an event stream.
    Subscribe = 5,
    /// Stop receiving an event stream.
    Unsubscribe = 6,
}

impl Opcode {
    /// Returns the wire value.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

// ============================================================================
// ControlMessage
// ============================================================================

/// An outbound subscribe/unsubscribe message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlMessage {
    /// Subscribe or unsubscribe.
    pub opcode: Opcode,
    /// Event stream name.
    pub event_name: String,
}

impl ControlMessage {
    /// Creates a subscribe message for an endpoint.
    #[inline]
    #[must_use]
    pub fn subscribe(endpoint: &Endpoint) -> Self {
        Self {
            opcode: Opcode::Subscribe,
            event_name: endpoint.event_name(),
        }
    }

    /// Creates an unsubscribe message for an endpoint.
    #[inline]
    #[must_use]
    pub fn unsubscribe(endpoint: &Endpoint) -> Self {
        Self {
            opcode: Opcode::Unsubscribe,
            event_name: endpoint.event_name(),
        }
    }

    /// Creates a message for a literal event stream name.
    #[inline]
    #[must_use]
    pub fn for_event(opcode: Opcode, event_name: impl Into<String>) -> Self {
        Self {
            opcode,
            event_name: event_name.into(),
        }
    }

    /// Serializes to the `[opcode, eventName]` wire form.
    #[must_use]
    pub fn to_json(&self) -> String {
        json!([self.opcode.code(), self.event_name]).to_string()
    }
}

// ============================================================================
// EventType
// ============================================================================

/// Kind of change reported for an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Resource created.
    Create,
    /// Resource updated.
    Update,
    /// Resource deleted.
    Delete,
    /// Any other value.
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("Create"),
            Self::Update => f.write_str("Update"),
            Self::Delete => f.write_str("Delete"),
            Self::Other(other) => f.write_str(other),
        }
    }
}

// ============================================================================
// SubscriptionMessage
// ============================================================================

/// A decoded event delivered to endpoint subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionMessage {
    /// Normalized endpoint the event belongs to.
    pub endpoint: Endpoint,
    /// Kind of change.
    pub event_type: EventType,
    /// Event payload.
    pub data: Value,
}

impl SubscriptionMessage {
    /// Deserializes the payload into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the payload does not match `T`.
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.data)?)
    }
}

/// Payload object of a dispatchable frame.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventPayload {
    uri: String,
    event_type: EventType,
    #[serde(default)]
    data: Value,
}

// ============================================================================
// InboundFrame
// ============================================================================

/// A parsed `[kind, eventName, payload]` frame.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    /// Message kind (8 for events).
    pub kind: i64,
    /// Event stream name, or a session identifier for acks.
    pub event_name: String,
    /// Third element, `Null` when absent.
    pub payload: Value,
}

impl InboundFrame {
    /// Parses a complete text message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unparseable`] if the text is not a JSON array whose
    /// first two elements are an integer and a string.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::unparseable(format!("invalid JSON: {e}")))?;

        let Value::Array(mut items) = value else {
            return Err(Error::unparseable("frame is not an array"));
        };

        if items.len() < 2 {
            return Err(Error::unparseable(format!(
                "frame has {} elements, expected at least 2",
                items.len()
            )));
        }

        let kind = items[0]
            .as_i64()
            .ok_or_else(|| Error::unparseable("frame kind is not an integer"))?;
        let event_name = items[1]
            .as_str()
            .ok_or_else(|| Error::unparseable("frame event name is not a string"))?
            .to_string();
        let payload = if items.len() > 2 {
            items.swap_remove(2)
        } else {
            Value::Null
        };

        Ok(Self {
            kind,
            event_name,
            payload,
        })
    }

    /// Returns `true` if this frame carries a dispatchable event.
    #[inline]
    #[must_use]
    pub fn is_event(&self) -> bool {
        self.event_name.starts_with(EVENT_PREFIX)
    }

    /// Decodes the payload into a [`SubscriptionMessage`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unparseable`] if the payload lacks `uri` or
    /// `eventType`.
    pub fn into_message(self) -> Result<SubscriptionMessage> {
        let payload: EventPayload = serde_json::from_value(self.payload)
            .map_err(|e| Error::unparseable(format!("invalid event payload: {e}")))?;

        Ok(SubscriptionMessage {
            endpoint: Endpoint::new(payload.uri),
            event_type: payload.event_type,
            data: payload.data,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_message_wire_format() {
        let endpoint = Endpoint::new("/lol-gameflow/v1/gameflow-phase/");
        let message = ControlMessage::subscribe(&endpoint);
        assert_eq!(
            message.to_json(),
            r#"[5,"OnJsonApiEvent_lol-gameflow_v1_gameflow-phase"]"#
        );

        let message = ControlMessage::unsubscribe(&endpoint);
        assert!(message.to_json().starts_with("[6,"));
    }

    #[test]
    fn test_literal_event_name() {
        let message = ControlMessage::for_event(Opcode::Subscribe, "OnJsonApiEvent");
        assert_eq!(message.to_json(), r#"[5,"OnJsonApiEvent"]"#);
    }

    #[test]
    fn test_parse_event_frame() {
        let text = r#"[8,"OnJsonApiEvent_lol-gameflow_v1_gameflow-phase",{"uri":"/lol-gameflow/v1/gameflow-phase","eventType":"Update","data":"ChampSelect"}]"#;
        let frame = InboundFrame::parse(text).unwrap();
        assert_eq!(frame.kind, 8);
        assert!(frame.is_event());

        let message = frame.into_message().unwrap();
        assert_eq!(message.endpoint.as_str(), "/lol-gameflow/v1/gameflow-phase");
        assert_eq!(message.event_type, EventType::Update);
        assert_eq!(message.data, Value::String("ChampSelect".into()));
    }

    #[test]
    fn test_welcome_frame_is_not_event() {
        let text = r#"[0,"0d1b6f3a-session",1,"Riot Games WAMP server"]"#;
        let frame = InboundFrame::parse(text).unwrap();
        assert_eq!(frame.kind, 0);
        assert!(!frame.is_event());
    }

    #[test]
    fn test_ack_frame_without_payload() {
        let frame = InboundFrame::parse(r#"[5,"ok"]"#).unwrap();
        assert_eq!(frame.payload, Value::Null);
        assert!(!frame.is_event());
    }

    #[test]
    fn test_unparseable_frames() {
        for text in ["", "{}", "[8]", r#"["8","x"]"#, r#"[8, 3]"#, "[8,"] {
            let err = InboundFrame::parse(text).unwrap_err();
            assert!(matches!(err, Error::Unparseable { .. }), "{text}");
        }
    }

    #[test]
    fn test_event_payload_missing_uri() {
        let frame = InboundFrame::parse(r#"[8,"OnJsonApiEvent",{"eventType":"Update"}]"#).unwrap();
        assert!(matches!(
            frame.into_message(),
            Err(Error::Unparseable { .. })
        ));
    }

    #[test]
    fn test_unknown_event_type() {
        let frame = InboundFrame::parse(
            r#"[8,"OnJsonApiEvent_x",{"uri":"x/","eventType":"Replace","data":null}]"#,
        )
        .unwrap();
        let message = frame.into_message().unwrap();
        assert_eq!(message.event_type, EventType::Other("Replace".into()));
        assert_eq!(message.endpoint.as_str(), "/x");
    }

    #[test]
    fn test_data_as() {
        let message = SubscriptionMessage {
            endpoint: Endpoint::new("/process-control/v1/process"),
            event_type: EventType::Update,
            data: serde_json::json!({ "status": "Stopping" }),
        };

        #[derive(Deserialize)]
        struct Status {
            status: String,
        }

        let status: Status = message.data_as().unwrap();
        assert_eq!(status.status, "Stopping");
    }
}
