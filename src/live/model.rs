//! Live Client Data schemas.
//!
//! Every struct tolerates missing fields (`#[serde(default)]`); the API omits
//! some of them depending on game mode and loading state. A field of the
//! wrong type is still a decode error.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;

use super::events::GameEvent;

// ============================================================================
// Snapshot
// ============================================================================

/// Full snapshot returned by `allgamedata`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllGameData {
    pub active_player: ActivePlayer,
    pub all_players: Vec<Player>,
    pub events: EventLog,
    pub game_data: GameData,
}

/// Append-only event log of the current match.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct EventLog {
    #[serde(rename = "Events")]
    pub events: Vec<GameEvent>,
}

impl EventLog {
    /// Returns the number of records.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if the log is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Match metadata returned by `gamestats`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameData {
    pub game_mode: String,
    /// Seconds since the match started.
    pub game_time: f64,
    pub map_name: String,
    pub map_number: i32,
    pub map_terrain: String,
}

// ============================================================================
// Active Player
// ============================================================================

/// The player running this game client.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivePlayer {
    pub abilities: Abilities,
    pub champion_stats: ChampionStats,
    pub current_gold: f64,
    pub full_runes: FullRunes,
    pub level: i32,
    pub riot_id: String,
    pub riot_id_game_name: String,
    pub riot_id_tag_line: String,
    pub summoner_name: String,
    pub team_relative_colors: bool,
}

/// Ability set of the active player.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Abilities {
    #[serde(rename = "Passive")]
    pub passive: Ability,
    #[serde(rename = "Q")]
    pub q: Ability,
    #[serde(rename = "W")]
    pub w: Ability,
    #[serde(rename = "E")]
    pub e: Ability,
    #[serde(rename = "R")]
    pub r: Ability,
}

/// One ability. The passive has no level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ability {
    pub ability_level: Option<i32>,
    pub display_name: String,
    pub id: String,
    pub raw_description: String,
    pub raw_display_name: String,
}

/// Current champion stats of the active player.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChampionStats {
    pub ability_haste: f64,
    pub ability_power: f64,
    pub armor: f64,
    pub armor_penetration_flat: f64,
    pub armor_penetration_percent: f64,
    pub attack_damage: f64,
    pub attack_range: f64,
    pub attack_speed: f64,
    pub bonus_armor_penetration_percent: f64,
    pub bonus_magic_penetration_percent: f64,
    pub crit_chance: f64,
    pub crit_damage: f64,
    pub current_health: f64,
    pub heal_shield_power: f64,
    pub health_regen_rate: f64,
    pub life_steal: f64,
    pub magic_lethality: f64,
    pub magic_penetration_flat: f64,
    pub magic_penetration_percent: f64,
    pub magic_resist: f64,
    pub max_health: f64,
    pub move_speed: f64,
    pub omnivamp: f64,
    pub physical_lethality: f64,
    pub physical_vamp: f64,
    pub resource_max: f64,
    pub resource_regen_rate: f64,
    /// `MANA`, `ENERGY`, `NONE`, ...
    pub resource_type: String,
    pub resource_value: f64,
    pub spell_vamp: f64,
    pub tenacity: f64,
}

// ============================================================================
// Runes
// ============================================================================

/// Complete rune page of the active player.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FullRunes {
    pub general_runes: Vec<Rune>,
    pub keystone: Rune,
    pub primary_rune_tree: Rune,
    pub secondary_rune_tree: Rune,
    pub stat_runes: Vec<StatRune>,
}

/// Keystone and trees, available for every player.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MainRunes {
    pub keystone: Rune,
    pub primary_rune_tree: Rune,
    pub secondary_rune_tree: Rune,
}

/// A rune or rune tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rune {
    pub display_name: String,
    pub id: i32,
    pub raw_description: String,
    pub raw_display_name: String,
}

/// A stat shard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatRune {
    pub id: i32,
    pub raw_description: String,
}

// ============================================================================
// Players
// ============================================================================

/// Side of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Team {
    /// Blue side.
    Order,
    /// Red side.
    Chaos,
    /// Anything else the API reports.
    #[default]
    #[serde(other)]
    Unknown,
}

impl Team {
    /// Returns the wire name used by the `teamID` filter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "ORDER",
            Self::Chaos => "CHAOS",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of `playerlist`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Player {
    pub champion_name: String,
    pub is_bot: bool,
    pub is_dead: bool,
    pub items: Vec<Item>,
    pub level: i32,
    pub position: String,
    pub raw_champion_name: String,
    pub raw_skin_name: String,
    pub respawn_timer: f64,
    pub riot_id: String,
    pub riot_id_game_name: String,
    pub riot_id_tag_line: String,
    pub runes: MainRunes,
    pub scores: Scores,
    #[serde(rename = "skinID")]
    pub skin_id: i32,
    pub skin_name: String,
    pub summoner_name: String,
    pub summoner_spells: SummonerSpells,
    pub team: Team,
}

/// An inventory slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Item {
    pub can_use: bool,
    pub consumable: bool,
    pub count: i32,
    pub display_name: String,
    #[serde(rename = "itemID")]
    pub item_id: i32,
    pub price: i32,
    pub raw_description: String,
    pub raw_display_name: String,
    pub slot: i32,
}

/// Scoreboard line.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scores {
    pub assists: i32,
    pub creep_score: i32,
    pub deaths: i32,
    pub kills: i32,
    pub ward_score: f64,
}

/// Both summoner spells.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummonerSpells {
    pub summoner_spell_one: SummonerSpell,
    pub summoner_spell_two: SummonerSpell,
}

/// One summoner spell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummonerSpell {
    pub display_name: String,
    pub raw_description: String,
    pub raw_display_name: String,
}

// ============================================================================
// Tests
// ============================================================================
