//! Wire protocol for the noughts match server.
//!
//! - **Types** ([`PlayerId`], [`GameId`], [`GameStatus`], [`GameSummary`],
//!   [`RankingEntry`]) shared by every layer.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]) wrapped in an
//!   [`Envelope`].
//! - **Codec** ([`Codec`], [`JsonCodec`]) turning envelopes into bytes.
//!
//! The protocol layer knows nothing about connections or games in
//! progress; it only describes what is said.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Gateway / Session
//! ```

mod codec;
mod error;
mod event;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use event::{
    ClientEvent, Envelope, GameOverReason, GameResult, PROTOCOL_VERSION, ServerEvent,
};
pub use types::{
    GameId, GameStatus, GameSummary, GamesPage, PlayerId, PlayerStanding, RankingEntry,
};
