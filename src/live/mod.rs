//! In-match telemetry.
//!
//! While a match is loaded the game process serves read-only telemetry.
//! [`LiveClientApi`] exposes it as typed accessors; [`LiveListener`] polls it
//! and reports new event records as they are appended.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `api` | [`LiveClientApi`] accessors |
//! | `cursor` | Event-log delta tracking |
//! | `events` | Typed event records |
//! | `listener` | [`LiveListener`] polling task |
//! | `model` | Snapshot schemas |

// ============================================================================
// Submodules
// ============================================================================

/// Telemetry accessors.
pub mod api;

/// Event-log cursor.
pub mod cursor;

/// Event records.
pub mod events;

/// Polling listener.
pub mod listener;

/// Snapshot schemas.
pub mod model;

// ============================================================================
// Re-exports
// ============================================================================

pub use api::{DEFAULT_BASE_URL, LiveClientApi, LiveClientApiBuilder};
pub use cursor::EventCursor;
pub use events::{
    Ace, ChampionKill, EpicMonsterKill, FirstBlood, FirstBrick, GameEnd, GameEvent,
    GameEventKind, InhibStatus, Multikill, StructureKill,
};
pub use listener::{DEFAULT_POLL_INTERVAL, ListenerBuilder, LiveListener, SnapshotSource};
pub use model::{
    Abilities, Ability, ActivePlayer, AllGameData, ChampionStats, EventLog, FullRunes, GameData,
    Item, MainRunes, Player, Rune, Scores, StatRune, SummonerSpell, SummonerSpells, Team,
};
