//! Error types for the session layer.

use noughts_protocol::{GameId, PlayerId};
use noughts_store::StoreError;

/// Why a move was refused. A refused move never changes the board or
/// the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    #[error("game is not in progress")]
    NotOngoing,

    #[error("not a player in this game")]
    NotAParticipant,

    #[error("not your turn")]
    NotYourTurn,

    #[error("position {0} is outside the board")]
    OutOfRange(u32),

    #[error("position {0} is already taken")]
    Occupied(u32),
}

/// Errors returned by [`SessionManager`](crate::SessionManager) operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The player already occupies a waiting or ongoing game.
    #[error("player {0} is already in game {1}")]
    AlreadyInSession(PlayerId, GameId),

    #[error("game {0} not found")]
    SessionNotFound(GameId),

    #[error("illegal move: {0}")]
    IllegalMove(MoveRejection),

    /// A store read or write failed. Nothing past the failed write was
    /// applied.
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),

    /// The waiting game was claimed or abandoned before this join reached
    /// it. Matchmaking retries with the next candidate.
    #[error("game {0} can no longer be joined")]
    NotJoinable(GameId),

    /// The game's actor stopped before answering.
    #[error("game {0} is unavailable")]
    Unavailable(GameId),
}

impl SessionError {
    /// HTTP-style status code reported to the client.
    pub fn status_code(&self) -> u16 {
        match self {
            SessionError::AlreadyInSession(..) | SessionError::NotJoinable(_) => 409,
            SessionError::SessionNotFound(_) => 404,
            SessionError::IllegalMove(_) => 400,
            SessionError::Persistence(_) | SessionError::Unavailable(_) => 503,
        }
    }
}
