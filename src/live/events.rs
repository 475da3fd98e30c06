//! Match event records.
//!
//! Each record in the event log carries `EventID`, `EventName`, `EventTime`
//! plus fields specific to its name. The name selects a decoder from a fixed
//! table; names missing from the table, and records whose fields do not
//! match their decoder, decode to [`GameEventKind::Unknown`] with the raw
//! record kept. Only a broken header fails the record.
//!
//! | `EventName` | Variant |
//! |-------------|---------|
//! | `GameStart` | [`GameEventKind::GameStart`] |
//! | `MinionsSpawning` | [`GameEventKind::MinionsSpawning`] |
//! | `FirstBrick` | [`GameEventKind::FirstBrick`] |
//! | `FirstBlood` | [`GameEventKind::FirstBlood`] |
//! | `TurretKilled` | [`GameEventKind::TurretKilled`] |
//! | `InhibKilled` | [`GameEventKind::InhibKilled`] |
//! | `InhibRespawningSoon` | [`GameEventKind::InhibRespawningSoon`] |
//! | `InhibRespawned` | [`GameEventKind::InhibRespawned`] |
//! | `DragonKill` | [`GameEventKind::DragonKill`] |
//! | `HeraldKill` | [`GameEventKind::HeraldKill`] |
//! | `HordeKill` | [`GameEventKind::HordeKill`] |
//! | `BaronKill` | [`GameEventKind::BaronKill`] |
//! | `ChampionKill` | [`GameEventKind::ChampionKill`] |
//! | `Multikill` | [`GameEventKind::Multikill`] |
//! | `Ace` | [`GameEventKind::Ace`] |
//! | `GameEnd` | [`GameEventKind::GameEnd`] |

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use rustc_hash::FxHashMap;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

// ============================================================================
// Payloads
// ============================================================================

/// `FirstBrick`: first turret of the match.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FirstBrick {
    pub killer_name: String,
}

/// `FirstBlood`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FirstBlood {
    pub recipient: String,
}

/// `TurretKilled` and `InhibKilled`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct StructureKill {
    pub killer_name: String,
    /// Structure identifier, e.g. `Turret_T2_R_03_A`.
    #[serde(alias = "TurretKilled", alias = "InhibKilled")]
    pub structure: String,
    pub assisters: Vec<String>,
}

/// `InhibRespawningSoon` and `InhibRespawned`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct InhibStatus {
    #[serde(alias = "InhibRespawningSoon", alias = "InhibRespawned")]
    pub inhib: String,
}

/// Dragon, herald, voidgrub and baron kills.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EpicMonsterKill {
    pub killer_name: String,
    pub assisters: Vec<String>,
    #[serde(deserialize_with = "flexible_bool")]
    pub stolen: bool,
    /// Element for dragon kills (`Fire`, `Elder`, ...).
    pub dragon_type: Option<String>,
}

/// `ChampionKill`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ChampionKill {
    pub killer_name: String,
    pub victim_name: String,
    pub assisters: Vec<String>,
}

/// `Multikill`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Multikill {
    pub killer_name: String,
    pub kill_streak: u32,
}

/// `Ace`: a whole team is dead.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Ace {
    pub acer: String,
    pub acing_team: String,
}

/// `GameEnd`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GameEnd {
    /// `Win` or `Lose`, from the active player's view.
    pub result: String,
}

/// Accepts `true`, `"True"`, `"true"`, and their false forms.
fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        Value::Null => Ok(false),
        other => Err(de::Error::custom(format!("expected boolean, got {other}"))),
    }
}

// ============================================================================
// GameEventKind
// ============================================================================

/// Name-specific part of a [`GameEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum GameEventKind {
    GameStart,
    MinionsSpawning,
    FirstBrick(FirstBrick),
    FirstBlood(FirstBlood),
    TurretKilled(StructureKill),
    InhibKilled(StructureKill),
    InhibRespawningSoon(InhibStatus),
    InhibRespawned(InhibStatus),
    DragonKill(EpicMonsterKill),
    HeraldKill(EpicMonsterKill),
    HordeKill(EpicMonsterKill),
    BaronKill(EpicMonsterKill),
    ChampionKill(ChampionKill),
    Multikill(Multikill),
    Ace(Ace),
    GameEnd(GameEnd),
    /// A name without a decoder, or fields its decoder rejects; holds the
    /// whole record.
    Unknown(Value),
}

impl GameEventKind {
    /// Returns `true` for [`GameEventKind::Unknown`].
    #[inline]
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

/// Builds a kind from the full record.
type Factory = fn(&Value) -> serde_json::Result<GameEventKind>;

/// Deserializes a payload struct from a borrowed record.
fn payload<T: DeserializeOwned>(record: &Value) -> serde_json::Result<T> {
    T::deserialize(record)
}

/// Decoder table keyed by `EventName`.
static FACTORIES: LazyLock<FxHashMap<&'static str, Factory>> = LazyLock::new(|| {
    let entries: [(&'static str, Factory); 16] = [
        ("GameStart", |_| Ok(GameEventKind::GameStart)),
        ("MinionsSpawning", |_| Ok(GameEventKind::MinionsSpawning)),
        ("FirstBrick", |r| payload(r).map(GameEventKind::FirstBrick)),
        ("FirstBlood", |r| payload(r).map(GameEventKind::FirstBlood)),
        ("TurretKilled", |r| payload(r).map(GameEventKind::TurretKilled)),
        ("InhibKilled", |r| payload(r).map(GameEventKind::InhibKilled)),
        ("InhibRespawningSoon", |r| {
            payload(r).map(GameEventKind::InhibRespawningSoon)
        }),
        ("InhibRespawned", |r| payload(r).map(GameEventKind::InhibRespawned)),
        ("DragonKill", |r| payload(r).map(GameEventKind::DragonKill)),
        ("HeraldKill", |r| payload(r).map(GameEventKind::HeraldKill)),
        ("HordeKill", |r| payload(r).map(GameEventKind::HordeKill)),
        ("BaronKill", |r| payload(r).map(GameEventKind::BaronKill)),
        ("ChampionKill", |r| payload(r).map(GameEventKind::ChampionKill)),
        ("Multikill", |r| payload(r).map(GameEventKind::Multikill)),
        ("Ace", |r| payload(r).map(GameEventKind::Ace)),
        ("GameEnd", |r| payload(r).map(GameEventKind::GameEnd)),
    ];
    entries.into_iter().collect()
});

// ============================================================================
// GameEvent
// ============================================================================

/// One record of the match event log.
#[derive(Debug, Clone, PartialEq)]
pub struct GameEvent {
    /// Position-like id assigned by the game.
    pub id: u64,
    /// Discriminator as sent.
    pub name: String,
    /// Seconds since the match started.
    pub time: f64,
    /// Decoded payload.
    pub kind: GameEventKind,
}

/// Fields common to every record.
#[derive(Deserialize)]
struct Header {
    #[serde(rename = "EventID")]
    id: u64,
    #[serde(rename = "EventName")]
    name: String,
    #[serde(rename = "EventTime", default)]
    time: f64,
}

impl GameEvent {
    /// Decodes one raw record.
    ///
    /// # Errors
    ///
    /// Fails if `EventID` or `EventName` is missing or mistyped.
    pub fn from_value(record: Value) -> serde_json::Result<Self> {
        let header = Header::deserialize(&record)?;

        let kind = match FACTORIES.get(header.name.as_str()) {
            Some(factory) => match factory(&record) {
                Ok(kind) => kind,
                Err(e) => {
                    warn!(event_name = %header.name, error = %e, "Keeping undecodable event as raw record");
                    GameEventKind::Unknown(record)
                }
            },
            None => GameEventKind::Unknown(record),
        };

        Ok(Self {
            id: header.id,
            name: header.name,
            time: header.time,
            kind,
        })
    }

    /// Returns `true` if the record was kept raw.
    #[inline]
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.kind.is_unknown()
    }
}

impl<'de> Deserialize<'de> for GameEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = Value::deserialize(deserializer)?;
        Self::from_value(record).map_err(de::Error::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================
