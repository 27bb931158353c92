//! Game rules and persistence for the noughts match server.
//!
//! - **Board engine** ([`Board`], [`evaluate`]): the 3×3 grid and its
//!   win/draw check. Pure, no I/O.
//! - **Records** ([`Game`], [`Completion`]): what a match looks like at
//!   rest.
//! - **Stores** ([`GameStore`], [`RankingStore`], [`ProfileStore`]):
//!   repository traits the session layer drives, with in-memory
//!   implementations in [`memory`].

mod board;
mod error;
mod game;
pub mod memory;
mod store;

pub use board::{Board, BoardError, CELLS, Mark, Outcome, evaluate};
pub use error::StoreError;
pub use game::{Completion, Game, Players, WITHDRAWAL_NOTE, WinReason};
pub use memory::{MemoryGameStore, MemoryProfileStore, MemoryRankingStore};
pub use store::{
    DRAW_POINTS, GameStore, MAX_PER_PAGE, PageRequest, PlayerProfile, ProfileStore, RankingStore,
    WIN_POINTS,
};
