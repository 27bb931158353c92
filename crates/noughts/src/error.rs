//! Unified error type for the noughts server.

use noughts_gateway::GatewayError;
use noughts_protocol::ProtocolError;
use noughts_session::SessionError;
use noughts_store::StoreError;
use noughts_transport::TransportError;

/// Top-level error that wraps every layer's error.
///
/// The `#[from]` conversions let `?` lift a sub-crate error straight into
/// the server's own result type.
#[derive(Debug, thiserror::Error)]
pub enum NoughtsError {
    /// Binding, accepting, sending, or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded, or broke the handshake.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The connection was refused at the gateway.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A store call made outside any session failed (e.g. the startup purge).
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
