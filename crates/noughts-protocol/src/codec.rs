//! Codec trait and implementations for turning frames into bytes.
//!
//! The handler never touches `serde_json` directly; it encodes and decodes
//! [`Envelope`](crate::Envelope)s through whatever [`Codec`] the server
//! was built with.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do not
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that speaks JSON, which browser clients can produce and
/// inspect without extra tooling.
///
/// ```rust
/// use noughts_protocol::{ClientEvent, Codec, Envelope, JsonCodec};
///
/// let codec = JsonCodec;
/// let frame = br#"{"seq":1,"timestamp":0,"event":{"type":"join_game"}}"#;
///
/// let envelope: Envelope<ClientEvent> = codec.decode(frame).unwrap();
/// assert_eq!(envelope.event, ClientEvent::JoinGame);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
