//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown event `type`,
    /// or a field of the wrong shape (e.g. a negative `position`).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but breaks a protocol rule, such as a first
    /// frame that is not a handshake.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
