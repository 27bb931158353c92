/// Errors raised while accepting or driving a connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listener, accepting a socket, or upgrading it failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Writing a frame to the peer failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading a frame from the peer failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
