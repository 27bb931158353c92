//! Resolving a player's identity from the handshake token.
//!
//! The server does not manage accounts. Whatever sits in front of it
//! (a login service, a signed cookie, a reverse proxy) hands the client a
//! token, and an [`Authenticator`] turns that token into a stable
//! [`PlayerId`] during the handshake.

use noughts_protocol::PlayerId;

use crate::GatewayError;

/// Validates a client's token and returns their identity.
///
/// # Example
///
/// ```rust
/// use noughts_gateway::{Authenticator, GatewayError};
/// use noughts_protocol::PlayerId;
///
/// /// Accepts exactly one shared secret and names everyone "guest".
/// struct SharedSecret(String);
///
/// impl Authenticator for SharedSecret {
///     async fn authenticate(&self, token: &str) -> Result<PlayerId, GatewayError> {
///         if token == self.0 {
///             Ok(PlayerId::new("guest"))
///         } else {
///             Err(GatewayError::Unauthenticated("bad secret".into()))
///         }
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Returns the identity behind `token`.
    ///
    /// # Errors
    /// [`GatewayError::Unauthenticated`] when the token is rejected.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<PlayerId, GatewayError>> + Send;
}

/// Longest username [`UsernameAuth`] accepts.
const MAX_USERNAME_LEN: usize = 32;

/// Trusts the token to *be* the username.
///
/// For development and for deployments where an upstream proxy has already
/// authenticated the user and forwards only the name. Surrounding
/// whitespace is trimmed; empty names, names longer than 32 characters,
/// and names containing control characters are refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsernameAuth;

impl Authenticator for UsernameAuth {
    async fn authenticate(&self, token: &str) -> Result<PlayerId, GatewayError> {
        let name = token.trim();
        if name.is_empty() {
            return Err(GatewayError::Unauthenticated("username is empty".into()));
        }
        if name.chars().count() > MAX_USERNAME_LEN {
            return Err(GatewayError::Unauthenticated(format!(
                "username longer than {MAX_USERNAME_LEN} characters"
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(GatewayError::Unauthenticated(
                "username contains control characters".into(),
            ));
        }
        Ok(PlayerId::new(name))
    }
}
