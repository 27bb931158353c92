//! # Noughts
//!
//! A real-time two-player noughts and crosses match server.
//!
//! Players connect over WebSocket, announce themselves in a handshake, and
//! are paired with whoever has been waiting longest. The server owns the
//! board: it validates every move, detects wins and draws, forfeits a game
//! whose player drops out, and keeps a leaderboard.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use noughts::prelude::*;
//!
//! # async fn start() -> Result<(), NoughtsError> {
//! let config = ServerConfig::default().bind("0.0.0.0:8080");
//! let server = NoughtsServer::builder()
//!     .config(config)
//!     .build_in_memory(UsernameAuth)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod cli;
mod config;
mod error;
mod handler;
mod server;

pub use cli::Cli;
pub use config::ServerConfig;
pub use error::NoughtsError;
pub use server::{NoughtsServer, NoughtsServerBuilder};

/// Everything needed to build and run a server.
pub mod prelude {
    pub use crate::{Cli, NoughtsError, NoughtsServer, NoughtsServerBuilder, ServerConfig};
    pub use noughts_gateway::{Authenticator, GatewayError, UsernameAuth};
    pub use noughts_protocol::{
        ClientEvent, Envelope, GameId, GameOverReason, GameResult, GameStatus, PROTOCOL_VERSION, PlayerId,
        ServerEvent,
    };
    pub use noughts_session::SessionConfig;
    pub use noughts_store::{
        GameStore, MemoryGameStore, MemoryProfileStore, MemoryRankingStore, ProfileStore,
        RankingStore,
    };
}
