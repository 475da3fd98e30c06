//! Normalized control-API endpoint paths.
//!
//! Every path entering the crate is canonicalized to `/segment/segment`:
//! one leading slash, no trailing slash. Registry keys, request URLs and
//! event names are all derived from the canonical form.
//!
//! # Event Names
//!
//! The socket names an endpoint's event stream by prefixing
//! `OnJsonApiEvent` and replacing every `/` with `_`:
//!
//! | Endpoint | Event name |
//! |----------|------------|
//! | `/lol-gameflow/v1/gameflow-phase` | `OnJsonApiEvent_lol-gameflow_v1_gameflow-phase` |
//! | `/process-control/v1/process` | `OnJsonApiEvent_process-control_v1_process` |

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// Constants
// ============================================================================

/// Prefix of every dispatchable event name.
pub const EVENT_PREFIX: &str = "OnJsonApiEvent";

/// Endpoint that reports the client process shutting down.
pub const PROCESS_EXIT_ENDPOINT: &str = "/process-control/v1/process";

/// Endpoint carrying the current gameflow phase.
pub const GAMEFLOW_PHASE_ENDPOINT: &str = "/lol-gameflow/v1/gameflow-phase";

/// Endpoint carrying the signed-in summoner.
pub const CURRENT_SUMMONER_ENDPOINT: &str = "/lol-summoner/v1/current-summoner";

/// Endpoint checked during the handshake.
pub const AVAILABILITY_ENDPOINT: &str = "/lol-gameflow/v1/availability";

// ============================================================================
// Endpoint
// ============================================================================

/// A normalized endpoint path.
///
/// # Example
///
/// ```ignore
/// let endpoint = Endpoint::new("//lol-chat/v1/me/");
/// assert_eq!(endpoint.as_str(), "/lol-chat/v1/me");
/// assert_eq!(endpoint.event_name(), "OnJsonApiEvent_lol-chat_v1_me");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint(String);

impl Endpoint {
    /// Normalizes `path` into an endpoint.
    #[must_use]
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(normalize(path.as_ref()))
    }

    /// Recovers the endpoint from a socket event name.
    ///
    /// Returns `None` if `event_name` lacks the `OnJsonApiEvent` prefix.
    #[must_use]
    pub fn from_event_name(event_name: &str) -> Option<Self> {
        let rest = event_name.strip_prefix(EVENT_PREFIX)?;
        Some(Self::new(rest.replace('_', "/")))
    }

    /// Returns the socket event name for this endpoint.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> String {
        format!("{EVENT_PREFIX}{}", self.0.replace('/', "_"))
    }

    /// Returns the path as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the process-exit notification endpoint.
    #[inline]
    #[must_use]
    pub fn is_process_exit(&self) -> bool {
        self.0 == PROCESS_EXIT_ENDPOINT
    }
}

/// Canonicalizes a path: one leading slash, no trailing slash.
#[must_use]
pub fn normalize(path: &str) -> String {
    let trimmed = path.trim_start_matches('/').trim_end_matches('/');
    let mut out = String::with_capacity(trimmed.len() + 1);
    out.push('/');
    out.push_str(trimmed);
    out
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Endpoint {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Endpoint {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Endpoint {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl Serialize for Endpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_normalize_examples() {
        assert_eq!(normalize("//foo/bar/"), "/foo/bar");
        assert_eq!(normalize("foo/bar"), "/foo/bar");
        assert_eq!(normalize("/foo/bar///"), "/foo/bar");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("///"), "/");
    }

    #[test]
    fn test_event_name() {
        let endpoint = Endpoint::new(PROCESS_EXIT_ENDPOINT);
        assert_eq!(
            endpoint.event_name(),
            "OnJsonApiEvent_process-control_v1_process"
        );
        assert!(endpoint.is_process_exit());
    }

    #[test]
    fn test_from_event_name() {
        let endpoint = Endpoint::from_event_name("OnJsonApiEvent_lol-chat_v1_me").unwrap();
        assert_eq!(endpoint.as_str(), "/lol-chat/v1/me");
        assert!(Endpoint::from_event_name("GetLolSummonerV1CurrentSummoner").is_none());
    }

    #[test]
    fn test_deserialize_normalizes() {
        let endpoint: Endpoint = serde_json::from_str("\"lol-lobby/v2/lobby/\"").unwrap();
        assert_eq!(endpoint.as_str(), "/lol-lobby/v2/lobby");
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(path in "[/a-z0-9-]{0,40}") {
            let once = normalize(&path);
            prop_assert_eq!(normalize(&once), once.clone());
            prop_assert!(once.starts_with('/'));
            prop_assert!(once == "/" || !once.ends_with('/'));
        }

        #[test]
        fn prop_event_name_round_trips(path in "(/[a-z0-9-]{1,12}){1,5}") {
            let endpoint = Endpoint::new(&path);
            let event_name = endpoint.event_name();
            prop_assert!(event_name.starts_with(EVENT_PREFIX));
            let recovered = Endpoint::from_event_name(&event_name).unwrap();
            prop_assert_eq!(recovered, endpoint);
        }
    }
}
