//! Live Client Data API facade.
//!
//! The game process serves match telemetry on `https://127.0.0.1:2999`
//! while a match is loaded. Every accessor is one GET; a missing game,
//! a non-200 answer, or an undecodable body all read as "no data".
//!
//! | Accessor | Path |
//! |----------|------|
//! | [`LiveClientApi::all_game_data`] | `allgamedata` |
//! | [`LiveClientApi::event_data`] | `eventdata` |
//! | [`LiveClientApi::game_stats`] | `gamestats` |
//! | [`LiveClientApi::player_list`] | `playerlist[?teamID=]` |
//! | [`LiveClientApi::active_player`] | `activeplayer` |
//! | [`LiveClientApi::active_player_abilities`] | `activeplayerabilities` |
//! | [`LiveClientApi::active_player_name`] | `activeplayername` |
//! | [`LiveClientApi::active_player_runes`] | `activeplayerrunes` |
//! | [`LiveClientApi::player_main_runes`] | `playermainrunes?riotId=` |
//! | [`LiveClientApi::player_items`] | `playeritems?riotId=` |
//! | [`LiveClientApi::player_scores`] | `playerscores?riotId=` |
//! | [`LiveClientApi::player_summoner_spells`] | `playersummonerspells?riotId=` |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::transport::shared_client;

use super::listener::SnapshotSource;
use super::model::{
    Abilities, ActivePlayer, AllGameData, EventLog, FullRunes, GameData, Item, MainRunes, Player,
    Scores, SummonerSpells, Team,
};

// ============================================================================
// Constants
// ============================================================================

/// Default root of the telemetry API.
pub const DEFAULT_BASE_URL: &str = "https://127.0.0.1:2999/liveclientdata/";

// ============================================================================
// LiveClientApi
// ============================================================================

/// Read-only client for the telemetry API.
///
/// Cheap to clone.
///
/// # Example
///
/// ```no_run
/// use lcu_bridge::LiveClientApi;
///
/// # async fn example() -> lcu_bridge::Result<()> {
/// let api = LiveClientApi::new()?;
/// if let Some(stats) = api.game_stats().await {
///     println!("{} at {:.0}s", stats.game_mode, stats.game_time);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LiveClientApi {
    http: reqwest::Client,
    base_url: Url,
}

impl LiveClientApi {
    /// Creates a facade for the default address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the shared HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> LiveClientApiBuilder {
        LiveClientApiBuilder::new()
    }

    /// Returns the API root.
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full snapshot of the match.
    pub async fn all_game_data(&self) -> Option<AllGameData> {
        self.lookup("allgamedata").await
    }

    /// Event log of the match.
    pub async fn event_data(&self) -> Option<EventLog> {
        self.lookup("eventdata").await
    }

    /// Mode, map, and clock.
    pub async fn game_stats(&self) -> Option<GameData> {
        self.lookup("gamestats").await
    }

    /// Every player, or only one side's.
    pub async fn player_list(&self, team: Option<Team>) -> Option<Vec<Player>> {
        match team {
            Some(team) => self.lookup(&format!("playerlist?teamID={team}")).await,
            None => self.lookup("playerlist").await,
        }
    }

    /// The player running this game client.
    pub async fn active_player(&self) -> Option<ActivePlayer> {
        self.lookup("activeplayer").await
    }

    /// Abilities of the active player.
    pub async fn active_player_abilities(&self) -> Option<Abilities> {
        self.lookup("activeplayerabilities").await
    }

    /// Riot ID of the active player.
    pub async fn active_player_name(&self) -> Option<String> {
        self.lookup("activeplayername").await
    }

    /// Full rune page of the active player.
    pub async fn active_player_runes(&self) -> Option<FullRunes> {
        self.lookup("activeplayerrunes").await
    }

    /// Keystone and trees of any player.
    pub async fn player_main_runes(&self, riot_id: &str) -> Option<MainRunes> {
        self.lookup(&player_path("playermainrunes", riot_id)).await
    }

    /// Inventory of any player.
    pub async fn player_items(&self, riot_id: &str) -> Option<Vec<Item>> {
        self.lookup(&player_path("playeritems", riot_id)).await
    }

    /// Scoreboard line of any player.
    pub async fn player_scores(&self, riot_id: &str) -> Option<Scores> {
        self.lookup(&player_path("playerscores", riot_id)).await
    }

    /// Summoner spells of any player.
    pub async fn player_summoner_spells(&self, riot_id: &str) -> Option<SummonerSpells> {
        self.lookup(&player_path("playersummonerspells", riot_id)).await
    }

    /// Fetches `path`, folding every failure into `None`.
    async fn lookup<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        match self.fetch(path).await {
            Ok(value) => value,
            Err(e) => {
                warn!(path, error = %e, "Undecodable telemetry response");
                None
            }
        }
    }

    /// Fetches `path`.
    ///
    /// Returns `Ok(None)` when the game is unreachable or answers non-200.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `path` does not form a valid URL
    /// - [`Error::Json`] if a 200 body does not match `T`
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| Error::config(format!("invalid telemetry path {path}: {e}")))?;

        trace!(%url, "Telemetry request");

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(path, error = %e, "Telemetry API unreachable");
                return Ok(None);
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            debug!(path, %status, "Telemetry API returned non-200");
            return Ok(None);
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path, error = %e, "Telemetry body interrupted");
                return Ok(None);
            }
        };

        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}

#[async_trait]
impl SnapshotSource for LiveClientApi {
    async fn snapshot(&self) -> Result<Option<AllGameData>> {
        self.fetch("allgamedata").await
    }
}

/// Builds a player-scoped path with an encoded Riot ID.
fn player_path(resource: &str, riot_id: &str) -> String {
    format!("{resource}?riotId={}", urlencoding::encode(riot_id))
}

// ============================================================================
// LiveClientApiBuilder
// ============================================================================

/// Builder for [`LiveClientApi`].
#[derive(Debug, Clone, Default)]
pub struct LiveClientApiBuilder {
    base_url: Option<String>,
    http_client: Option<reqwest::Client>,
}

impl LiveClientApiBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the API root.
    #[inline]
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Replaces the shared HTTP client.
    #[inline]
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the facade with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the base URL does not parse or is not HTTP(S)
    /// - [`Error::Http`] if the shared HTTP client cannot be built
    pub fn build(self) -> Result<LiveClientApi> {
        let base_url = self.validate_base_url()?;
        let http = match self.http_client {
            Some(client) => client,
            None => shared_client()?,
        };

        Ok(LiveClientApi { http, base_url })
    }

    /// Parses the base URL, ensuring a trailing slash so joins append.
    fn validate_base_url(&self) -> Result<Url> {
        let raw = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let with_slash = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };

        let url = Url::parse(&with_slash)
            .map_err(|e| Error::config(format!("invalid telemetry base URL {raw}: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "telemetry base URL must be http or https, got {}",
                url.scheme()
            )));
        }

        Ok(url)
    }
}

// ============================================================================
// Tests
// ============================================================================
