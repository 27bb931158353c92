//! Match sessions for the noughts server.
//!
//! This crate owns the game rules in motion:
//!
//! 1. **Matchmaking**: pair a joining player with the oldest waiting
//!    game, or open a new one ([`SessionManager::join_game`]).
//! 2. **Moves**: enforce turn order and cell legality, persist the move,
//!    and finish the game on a line or a full board
//!    ([`SessionManager::make_move`]).
//! 3. **Disconnects**: delete a waiting game or forfeit an ongoing one so
//!    no game is left hanging ([`SessionManager::disconnect`]).
//!
//! # How it fits in the stack
//!
//! ```text
//! Server handler (above)  ← turns client events into manager calls
//!     ↕
//! Session layer (this crate)  ← one actor per live game
//!     ↕
//! Store + Gateway (below)  ← records at rest, delivery to players
//! ```

mod actor;
mod config;
mod error;
mod manager;

pub use actor::{DisconnectOutcome, MoveOutcome};
pub use config::SessionConfig;
pub use error::{MoveRejection, SessionError};
pub use manager::{JoinOutcome, SessionManager};
