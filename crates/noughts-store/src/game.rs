//! The persisted game record.

use chrono::{DateTime, Utc};
use noughts_protocol::{GameId, GameStatus, GameSummary, PlayerId};
use serde::{Deserialize, Serialize};

use crate::board::{Board, Mark};

/// Note stored on a game that ended because a player left mid-game.
pub const WITHDRAWAL_NOTE: &str = "Opponent withdrew";

/// The two seats. `slot1` is filled at creation and plays [`Mark::X`];
/// `slot2` stays empty until an opponent joins and plays [`Mark::O`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    pub slot1: PlayerId,
    pub slot2: Option<PlayerId>,
}

/// One match, from creation through completion.
///
/// When `status` is `Completed`, exactly one of "`winner` and `loser`
/// set" or "`is_draw`" holds. `current_turn` is set only while `Ongoing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub players: Players,
    pub status: GameStatus,
    pub board: Board,
    pub current_turn: Option<PlayerId>,
    pub winner: Option<PlayerId>,
    pub loser: Option<PlayerId>,
    pub is_draw: bool,
    pub notes: Option<String>,
    /// When the game was opened, refreshed to the moment the second
    /// player joined.
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Game {
    /// A fresh waiting game with `player` in the first seat.
    pub fn new(id: GameId, player: PlayerId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            players: Players {
                slot1: player,
                slot2: None,
            },
            status: GameStatus::Waiting,
            board: Board::new(),
            current_turn: None,
            winner: None,
            loser: None,
            is_draw: false,
            notes: None,
            created_at,
            ended_at: None,
        }
    }

    pub fn is_participant(&self, player: &PlayerId) -> bool {
        self.mark_of(player).is_some()
    }

    /// The mark `player` plays in this game, from their seat.
    pub fn mark_of(&self, player: &PlayerId) -> Option<Mark> {
        if self.players.slot1 == *player {
            Some(Mark::X)
        } else if self.players.slot2.as_ref() == Some(player) {
            Some(Mark::O)
        } else {
            None
        }
    }

    /// The player seated with `mark`, if that seat is filled.
    pub fn player_for(&self, mark: Mark) -> Option<&PlayerId> {
        match mark {
            Mark::X => Some(&self.players.slot1),
            Mark::O => self.players.slot2.as_ref(),
        }
    }

    /// The other seated player.
    pub fn opponent_of(&self, player: &PlayerId) -> Option<&PlayerId> {
        self.mark_of(player)
            .and_then(|mark| self.player_for(mark.other()))
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            game_id: self.id.clone(),
            player1: self.players.slot1.clone(),
            player2: self.players.slot2.clone(),
            status: self.status,
            winner: self.winner.clone(),
            loser: self.loser.clone(),
            is_draw: self.is_draw,
            notes: self.notes.clone(),
            created_at: self.created_at,
            ended_at: self.ended_at,
        }
    }
}

/// How a decisive game was won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinReason {
    /// Three in a row.
    Line,
    /// The opponent disconnected mid-game.
    Withdrawal,
}

/// The terminal outcome written by
/// [`GameStore::set_completed`](crate::GameStore::set_completed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Draw,
    Win {
        winner: PlayerId,
        loser: PlayerId,
        reason: WinReason,
    },
}

impl Completion {
    /// The note to store alongside the outcome.
    pub fn note(&self) -> Option<&'static str> {
        match self {
            Completion::Win {
                reason: WinReason::Withdrawal,
                ..
            } => Some(WITHDRAWAL_NOTE),
            _ => None,
        }
    }
}
