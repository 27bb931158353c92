//! Identifiers and records that travel on the wire.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The stable identity of a player, as resolved by the authenticator.
///
/// Serializes as the bare username string, so `PlayerId::new("alice")`
/// appears in JSON as `"alice"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identifier of one game, assigned by the game store at creation.
///
/// Opaque to clients; they only echo it back in `make_move`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Game status
// ---------------------------------------------------------------------------

/// Where a game is in its lifecycle.
///
/// Moves forward only: `Waiting` → `Ongoing` → `Completed`. A `Waiting`
/// game can also be deleted outright, which has no status of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Ongoing,
    Completed,
}

impl GameStatus {
    /// The statuses that count as "occupying" a player.
    pub const LIVE: [GameStatus; 2] = [GameStatus::Waiting, GameStatus::Ongoing];

    /// Returns `true` for `Waiting` and `Ongoing`.
    pub fn is_live(self) -> bool {
        matches!(self, GameStatus::Waiting | GameStatus::Ongoing)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Ongoing => "ongoing",
            GameStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Read-side records
// ---------------------------------------------------------------------------

/// A game as shown in listings. The board and turn are deliberately absent;
/// listings are history, not a way to spectate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub game_id: GameId,
    pub player1: PlayerId,
    pub player2: Option<PlayerId>,
    pub status: GameStatus,
    pub winner: Option<PlayerId>,
    pub loser: Option<PlayerId>,
    pub is_draw: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// One page of the game listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamesPage {
    pub games: Vec<GameSummary>,
    pub total: u64,
    /// 1-based.
    pub page: u64,
    pub per_page: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// A player's row on the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub username: PlayerId,
    pub wins: u64,
    pub draws: u64,
    pub score: u64,
}

/// The caller's own leaderboard row and position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStanding {
    #[serde(flatten)]
    pub entry: RankingEntry,
    /// 1 + the number of players with a strictly greater score.
    pub rank: u64,
}
