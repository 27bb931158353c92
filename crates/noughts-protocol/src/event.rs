//! Inbound and outbound events, and the envelope that carries them.

use serde::{Deserialize, Serialize};

use crate::{GameId, GamesPage, PlayerId, PlayerStanding, RankingEntry};

/// The protocol version a client must announce in its handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// The outer wrapper for every frame in either direction.
///
/// `seq` numbers the sender's frames on one connection; `timestamp` is
/// milliseconds since that connection was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub seq: u64,
    pub timestamp: u64,
    pub event: T,
}

/// Client → server.
///
/// In JSON: `{"type": "make_move", "game_id": "...", "position": 4}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Must be the first frame on a connection.
    Handshake {
        version: u32,
        token: Option<String>,
    },

    Heartbeat {
        client_time: u64,
    },

    /// Find an opponent, or open a new game and wait for one.
    JoinGame,

    MakeMove {
        game_id: GameId,
        position: u32,
    },

    ListGames {
        page: Option<u64>,
        per_page: Option<u64>,
    },

    Leaderboard {
        limit: Option<u64>,
    },

    /// Close the connection. Treated exactly like a dropped socket.
    Leave {
        #[serde(default)]
        reason: String,
    },
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    Win,
    Draw,
}

/// Why a game ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    /// The other player disconnected mid-game and forfeited.
    OpponentLeft,
}

/// Server → client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    HandshakeAck {
        player_id: PlayerId,
        server_time: u64,
    },

    HeartbeatAck {
        client_time: u64,
        server_time: u64,
    },

    /// The caller opened a new game and is waiting for an opponent.
    JoinedWaiting {
        game_id: GameId,
    },

    /// The caller filled a waiting game; the opponent moves first.
    JoinedStarted {
        game_id: GameId,
        opponent: PlayerId,
    },

    /// Sent to the waiting player when someone takes the second seat.
    OpponentJoined {
        game_id: GameId,
        opponent: PlayerId,
    },

    /// Sent to the mover's opponent only.
    MoveMade {
        game_id: GameId,
        player: PlayerId,
        position: u32,
    },

    GameOver {
        game_id: GameId,
        result: GameResult,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winner: Option<PlayerId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<GameOverReason>,
    },

    GamesPage(GamesPage),

    Leaderboard {
        top_players: Vec<RankingEntry>,
        current_player: Option<PlayerStanding>,
    },

    /// `code` follows HTTP conventions (400, 401, 404, 409, 503).
    Error {
        code: u16,
        message: String,
    },
}
