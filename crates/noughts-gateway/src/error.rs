//! Error types for the gateway layer.

use noughts_protocol::PlayerId;

/// Errors raised while admitting a connection.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No identity could be resolved from the handshake, or the
    /// [`Authenticator`](crate::Authenticator) rejected it.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The player already has a live connection.
    #[error("player {0} is already connected")]
    AlreadyConnected(PlayerId),
}

impl GatewayError {
    /// The HTTP-style code sent to the client in an error event.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Unauthenticated(_) => 401,
            GatewayError::AlreadyConnected(_) => 409,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_unauthenticated_is_401() {
        let err = GatewayError::Unauthenticated("no token".into());
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_string(), "unauthenticated: no token");
    }

    #[test]
    fn test_status_code_already_connected_is_409() {
        let err = GatewayError::AlreadyConnected(PlayerId::new("alice"));
        assert_eq!(err.status_code(), 409);
        assert!(err.to_string().contains("alice"));
    }
}
