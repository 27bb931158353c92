//! The persistence traits the session manager is written against.
//!
//! Each trait is a thin repository over one collection: no matchmaking,
//! turn order, or scoring policy lives here beyond field validation and
//! the conditional writes noted on each method.

use std::future::Future;

use noughts_protocol::{GameId, GameStatus, GameSummary, GamesPage, PlayerId, RankingEntry};
use serde::{Deserialize, Serialize};

use crate::{Board, Completion, Game, StoreError};

/// Score added for a win.
pub const WIN_POINTS: u64 = 3;
/// Score added for a draw.
pub const DRAW_POINTS: u64 = 1;

/// Largest page a listing will return.
pub const MAX_PER_PAGE: u64 = 100;

/// Game records.
pub trait GameStore: Send + Sync + 'static {
    /// Opens a waiting game with `player` in the first seat.
    fn create(
        &self,
        player: &PlayerId,
    ) -> impl Future<Output = Result<GameId, StoreError>> + Send;

    /// Seats `player` in a waiting game and starts it: `slot2` is filled,
    /// status becomes ongoing, the first seat moves first, and
    /// `created_at` is reset to now.
    ///
    /// # Errors
    /// [`StoreError::Conflict`] unless the game is still waiting with an
    /// empty second seat and `player` is not already in the first one.
    fn join(
        &self,
        id: &GameId,
        player: &PlayerId,
    ) -> impl Future<Output = Result<Game, StoreError>> + Send;

    fn get(&self, id: &GameId) -> impl Future<Output = Result<Option<Game>, StoreError>> + Send;

    fn update_board(
        &self,
        id: &GameId,
        board: &Board,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// # Errors
    /// [`StoreError::InvalidField`] if `player` is not seated in the game.
    fn update_turn(
        &self,
        id: &GameId,
        player: &PlayerId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Persists a move: the new board and whose turn is next.
    ///
    /// The default writes the board, then the turn, and stops at the first
    /// failure, so the turn never advances past a board that was not saved.
    /// Stores that can write both in one operation should override it.
    fn apply_move(
        &self,
        id: &GameId,
        board: &Board,
        next_turn: &PlayerId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            self.update_board(id, board).await?;
            self.update_turn(id, next_turn).await
        }
    }

    /// Ends an ongoing game and returns the final record. Sets the outcome
    /// fields, the note, and `ended_at`; clears `current_turn`.
    ///
    /// # Errors
    /// [`StoreError::Conflict`] if the game is already completed, which is
    /// what keeps a terminal transition from being applied twice.
    fn set_completed(
        &self,
        id: &GameId,
        completion: &Completion,
    ) -> impl Future<Output = Result<Game, StoreError>> + Send;

    /// Removes the game. Returns whether it existed.
    fn delete(&self, id: &GameId) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// The waiting game with the earliest `created_at`.
    fn find_oldest_waiting(&self) -> impl Future<Output = Result<Option<Game>, StoreError>> + Send;

    /// A game `player` is seated in whose status is one of `statuses`.
    fn find_by_participant_and_status(
        &self,
        player: &PlayerId,
        statuses: &[GameStatus],
    ) -> impl Future<Output = Result<Option<Game>, StoreError>> + Send;

    /// One page of all games in creation order.
    fn list_page(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = Result<GamesPage, StoreError>> + Send;

    /// Every game `player` took part in, in creation order.
    fn find_all_by_player(
        &self,
        player: &PlayerId,
    ) -> impl Future<Output = Result<Vec<GameSummary>, StoreError>> + Send;

    /// Deletes every waiting or ongoing game. Returns how many went.
    fn purge_unfinished(&self) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

/// Leaderboard counters.
pub trait RankingStore: Send + Sync + 'static {
    /// Adds a win and [`WIN_POINTS`], creating the entry if needed.
    fn record_win(&self, player: &PlayerId) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Adds a draw and [`DRAW_POINTS`], creating the entry if needed.
    fn record_draw(&self, player: &PlayerId) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Up to `n` entries, highest score first, ties by username.
    fn top(&self, n: usize) -> impl Future<Output = Result<Vec<RankingEntry>, StoreError>> + Send;

    /// 1 + the number of players with a strictly greater score, or `None`
    /// if `player` has no entry.
    fn rank_of(
        &self,
        player: &PlayerId,
    ) -> impl Future<Output = Result<Option<u64>, StoreError>> + Send;

    fn entry(
        &self,
        player: &PlayerId,
    ) -> impl Future<Output = Result<Option<RankingEntry>, StoreError>> + Send;
}

/// A player's lifetime record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub username: PlayerId,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    pub games_played: u64,
}

impl PlayerProfile {
    pub fn new(username: PlayerId) -> Self {
        Self {
            username,
            wins: 0,
            losses: 0,
            draws: 0,
            games_played: 0,
        }
    }
}

/// Per-player win/loss/draw counters. Every `record_*` also counts one
/// game played.
pub trait ProfileStore: Send + Sync + 'static {
    fn record_win(&self, player: &PlayerId) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn record_loss(&self, player: &PlayerId) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn record_draw(&self, player: &PlayerId) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get(
        &self,
        player: &PlayerId,
    ) -> impl Future<Output = Result<Option<PlayerProfile>, StoreError>> + Send;
}

/// A normalized page request: `page` is 1-based and at least 1,
/// `per_page` is within `1..=MAX_PER_PAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    per_page: u64,
}

impl PageRequest {
    /// Clamps out-of-range values instead of rejecting them; page 0 reads
    /// as page 1.
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// How many records precede this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Wraps one page of results. `total` counts every record, not just
    /// this page's.
    pub fn into_page(self, games: Vec<GameSummary>, total: u64) -> GamesPage {
        GamesPage {
            games,
            total,
            page: self.page,
            per_page: self.per_page,
            has_next: self.page.saturating_mul(self.per_page) < total,
            has_prev: self.page > 1,
        }
    }
}
