//! Client state derived from the event stream.
//!
//! When tracking is enabled the connection keeps two values current without
//! any caller subscription:
//!
//! | Endpoint | Value |
//! |----------|-------|
//! | `/lol-gameflow/v1/gameflow-phase` | [`GameflowPhase`] |
//! | `/lol-summoner/v1/current-summoner` | [`Summoner`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::observer::Observers;
use crate::protocol::{
    CURRENT_SUMMONER_ENDPOINT, EventType, GAMEFLOW_PHASE_ENDPOINT, SubscriptionMessage,
};

// ============================================================================
// GameflowPhase
// ============================================================================

/// Phase of the client's game flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum GameflowPhase {
    /// Idle, no lobby.
    #[default]
    None,
    /// In a lobby.
    Lobby,
    /// Searching for a match.
    Matchmaking,
    /// Checked into a tournament.
    CheckedIntoTournament,
    /// Match found, awaiting accept.
    ReadyCheck,
    /// Champion select.
    ChampSelect,
    /// Game process launching.
    GameStart,
    /// Game process failed to launch.
    FailedToLaunch,
    /// Game running.
    InProgress,
    /// Game running, client reconnecting to it.
    Reconnect,
    /// Game ended, waiting for stats.
    WaitingForStats,
    /// Pre end-of-game screens.
    PreEndOfGame,
    /// End-of-game screen.
    EndOfGame,
    /// Game ended in an error.
    TerminatedInError,
    /// A phase this crate does not know.
    Unknown(String),
}

impl GameflowPhase {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "None",
            Self::Lobby => "Lobby",
            Self::Matchmaking => "Matchmaking",
            Self::CheckedIntoTournament => "CheckedIntoTournament",
            Self::ReadyCheck => "ReadyCheck",
            Self::ChampSelect => "ChampSelect",
            Self::GameStart => "GameStart",
            Self::FailedToLaunch => "FailedToLaunch",
            Self::InProgress => "InProgress",
            Self::Reconnect => "Reconnect",
            Self::WaitingForStats => "WaitingForStats",
            Self::PreEndOfGame => "PreEndOfGame",
            Self::EndOfGame => "EndOfGame",
            Self::TerminatedInError => "TerminatedInError",
            Self::Unknown(other) => other,
        }
    }

    /// Returns `true` while a game process is running.
    #[inline]
    #[must_use]
    pub fn is_in_game(&self) -> bool {
        matches!(self, Self::InProgress | Self::Reconnect)
    }
}

impl From<String> for GameflowPhase {
    fn from(value: String) -> Self {
        match value.as_str() {
            "None" | "" => Self::None,
            "Lobby" => Self::Lobby,
            "Matchmaking" => Self::Matchmaking,
            "CheckedIntoTournament" => Self::CheckedIntoTournament,
            "ReadyCheck" => Self::ReadyCheck,
            "ChampSelect" => Self::ChampSelect,
            "GameStart" => Self::GameStart,
            "FailedToLaunch" => Self::FailedToLaunch,
            "InProgress" => Self::InProgress,
            "Reconnect" => Self::Reconnect,
            "WaitingForStats" => Self::WaitingForStats,
            "PreEndOfGame" => Self::PreEndOfGame,
            "EndOfGame" => Self::EndOfGame,
            "TerminatedInError" => Self::TerminatedInError,
            _ => Self::Unknown(value),
        }
    }
}

impl From<&str> for GameflowPhase {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl fmt::Display for GameflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Summoner
// ============================================================================

/// The signed-in summoner.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Summoner {
    pub account_id: i64,
    pub display_name: String,
    pub game_name: String,
    pub tag_line: String,
    pub internal_name: String,
    pub name_change_flag: bool,
    pub percent_complete_for_next_level: i32,
    pub privacy: String,
    pub profile_icon_id: i32,
    pub puuid: String,
    pub reroll_points: RerollPoints,
    pub summoner_id: i64,
    pub summoner_level: i32,
    pub unnamed: bool,
    pub xp_since_last_level: i64,
    pub xp_until_next_level: i64,
}

impl Summoner {
    /// Returns `gameName#tagLine`, or the display name for legacy accounts.
    #[must_use]
    pub fn riot_id(&self) -> String {
        if self.game_name.is_empty() {
            self.display_name.clone()
        } else {
            format!("{}#{}", self.game_name, self.tag_line)
        }
    }
}

/// ARAM reroll counters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RerollPoints {
    pub current_points: i32,
    pub max_rolls: i32,
    pub number_of_rolls: i32,
    pub points_cost_to_roll: i32,
    pub points_to_reroll: i32,
}

// ============================================================================
// DerivedState
// ============================================================================

/// Phase and summoner values plus their change observers.
#[derive(Debug, Default)]
pub struct DerivedState {
    phase: RwLock<GameflowPhase>,
    summoner: RwLock<Option<Summoner>>,
    on_phase_changed: Observers<GameflowPhase>,
    on_summoner_changed: Observers<Option<Summoner>>,
}

impl DerivedState {
    /// Creates empty state.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> GameflowPhase {
        self.phase.read().clone()
    }

    /// Returns the current summoner.
    #[must_use]
    pub fn summoner(&self) -> Option<Summoner> {
        self.summoner.read().clone()
    }

    /// Observers of phase changes.
    #[inline]
    #[must_use]
    pub fn on_phase_changed(&self) -> &Observers<GameflowPhase> {
        &self.on_phase_changed
    }

    /// Observers of summoner changes.
    #[inline]
    #[must_use]
    pub fn on_summoner_changed(&self) -> &Observers<Option<Summoner>> {
        &self.on_summoner_changed
    }

    /// Applies an event if it targets a tracked endpoint.
    ///
    /// Returns `true` if the event was consumed.
    pub fn apply(&self, message: &SubscriptionMessage) -> bool {
        let deleted = message.event_type == EventType::Delete;

        match message.endpoint.as_str() {
            GAMEFLOW_PHASE_ENDPOINT => {
                let phase = if deleted {
                    GameflowPhase::None
                } else {
                    match message.data_as::<GameflowPhase>() {
                        Ok(phase) => phase,
                        Err(e) => {
                            debug!(error = %e, "Ignoring undecodable gameflow phase");
                            return true;
                        }
                    }
                };
                self.set_phase(phase);
                true
            }

            CURRENT_SUMMONER_ENDPOINT => {
                let summoner = if deleted {
                    None
                } else {
                    match message.data_as::<Summoner>() {
                        Ok(summoner) => Some(summoner),
                        Err(e) => {
                            debug!(error = %e, "Ignoring undecodable summoner");
                            return true;
                        }
                    }
                };
                self.set_summoner(summoner);
                true
            }

            _ => false,
        }
    }

    /// Stores a phase, notifying only on change.
    pub fn set_phase(&self, phase: GameflowPhase) {
        {
            let mut current = self.phase.write();
            if *current == phase {
                return;
            }
            *current = phase.clone();
        }

        trace!(%phase, "Gameflow phase changed");
        self.on_phase_changed.notify(&phase);
    }

    /// Stores a summoner, notifying only on change.
    pub fn set_summoner(&self, summoner: Option<Summoner>) {
        {
            let mut current = self.summoner.write();
            if *current == summoner {
                return;
            }
            current.clone_from(&summoner);
        }

        trace!(present = summoner.is_some(), "Current summoner changed");
        self.on_summoner_changed.notify(&summoner);
    }

    /// Resets both values, notifying observers of any change.
    pub fn reset(&self) {
        self.set_phase(GameflowPhase::None);
        self.set_summoner(None);
    }
}

// ============================================================================
// Tests
// ============================================================================
