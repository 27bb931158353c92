//! The connection gateway for the noughts match server.
//!
//! 1. **Identity** ([`Authenticator`]) turns a handshake token into a
//!    [`PlayerId`](noughts_protocol::PlayerId).
//! 2. **Registry and rooms** ([`Gateway`]) knows which connection belongs
//!    to which player and which players share a game, and routes
//!    [`ServerEvent`](noughts_protocol::ServerEvent)s by [`Recipient`].
//!
//! ```text
//! Session Manager (above)  ← decides what to say and to whom
//!     ↕
//! Gateway (this crate)     ← knows where each player is listening
//!     ↕
//! Connection handlers      ← drain each player's outbound queue
//! ```

mod auth;
mod error;
mod gateway;

pub use auth::{Authenticator, UsernameAuth};
pub use error::GatewayError;
pub use gateway::{Gateway, PlayerReceiver, PlayerSender, Recipient, SharedGateway};
