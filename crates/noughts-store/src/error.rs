//! Error types for the persistence layer.

use noughts_protocol::GameId;

/// Errors returned by [`GameStore`](crate::GameStore),
/// [`RankingStore`](crate::RankingStore), and
/// [`ProfileStore`](crate::ProfileStore) implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("game {0} not found")]
    NotFound(GameId),

    /// A write named a value the record cannot hold, such as a turn for a
    /// player who is not seated in the game.
    #[error("invalid field: {0}")]
    InvalidField(String),

    /// A conditional write lost: the record was no longer in the state the
    /// caller expected (already joined, already completed).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store could not be reached or refused the write.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
