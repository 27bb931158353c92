//! `NoughtsServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → gateway → session,
//! with the stores injected at build time.

use std::net::SocketAddr;
use std::sync::Arc;

use noughts_gateway::{Authenticator, Gateway};
use noughts_protocol::{Codec, JsonCodec};
use noughts_session::{SessionConfig, SessionManager};
use noughts_store::{
    GameStore, MemoryGameStore, MemoryProfileStore, MemoryRankingStore, ProfileStore,
    RankingStore,
};
use noughts_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{NoughtsError, ServerConfig};

/// Shared server state handed to every connection task.
pub(crate) struct ServerState<G, R, P, A, C> {
    pub(crate) sessions: SessionManager<G, R, P>,
    pub(crate) auth: A,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a noughts server.
///
/// # Example
///
/// ```rust,no_run
/// use noughts::prelude::*;
///
/// # async fn start() -> Result<(), NoughtsError> {
/// let server = NoughtsServer::builder()
///     .bind("0.0.0.0:8080")
///     .build_in_memory(UsernameAuth)
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct NoughtsServerBuilder {
    config: ServerConfig,
    session_config: SessionConfig,
}

impl NoughtsServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            session_config: SessionConfig::default(),
        }
    }

    /// Replaces the whole server configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds the listener and wires the session manager to the given
    /// stores.
    ///
    /// With `purge_on_start` set, every waiting or ongoing game is deleted
    /// before the listener opens.
    pub async fn build<G, R, P, A>(
        self,
        games: Arc<G>,
        rankings: Arc<R>,
        profiles: Arc<P>,
        auth: A,
    ) -> Result<NoughtsServer<G, R, P, A, JsonCodec>, NoughtsError>
    where
        G: GameStore,
        R: RankingStore,
        P: ProfileStore,
        A: Authenticator,
    {
        if self.config.purge_on_start {
            let purged = games.purge_unfinished().await?;
            tracing::info!(purged, "purged unfinished games");
        }

        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let sessions = SessionManager::new(
            games,
            rankings,
            profiles,
            Gateway::shared(),
            self.session_config,
        );
        let state = Arc::new(ServerState {
            sessions,
            auth,
            codec: JsonCodec,
            config: self.config,
        });

        Ok(NoughtsServer { transport, state })
    }

    /// [`build`](Self::build) with fresh in-memory stores.
    pub async fn build_in_memory<A: Authenticator>(
        self,
        auth: A,
    ) -> Result<
        NoughtsServer<MemoryGameStore, MemoryRankingStore, MemoryProfileStore, A, JsonCodec>,
        NoughtsError,
    > {
        self.build(
            Arc::new(MemoryGameStore::new()),
            Arc::new(MemoryRankingStore::new()),
            Arc::new(MemoryProfileStore::new()),
            auth,
        )
        .await
    }
}

impl Default for NoughtsServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound noughts server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct NoughtsServer<G, R, P, A, C> {
    transport: WebSocketTransport,
    state: Arc<ServerState<G, R, P, A, C>>,
}

impl NoughtsServer<MemoryGameStore, MemoryRankingStore, MemoryProfileStore, (), JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> NoughtsServerBuilder {
        NoughtsServerBuilder::new()
    }
}

impl<G, R, P, A, C> NoughtsServer<G, R, P, A, C>
where
    G: GameStore,
    R: RankingStore,
    P: ProfileStore,
    A: Authenticator,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, NoughtsError> {
        Ok(self.transport.local_addr()?)
    }

    /// The configuration the server was built with.
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Runs the accept loop.
    ///
    /// Each accepted connection gets its own task that performs the
    /// handshake and then serves the player until they disconnect. Runs
    /// until the process is terminated.
    pub async fn run(mut self) -> Result<(), NoughtsError> {
        tracing::info!(addr = %self.state.config.bind_addr, "noughts server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
