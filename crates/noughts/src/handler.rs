//! Per-connection handler: handshake, identity, and event routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Handshake → validate version
//!   2. Authenticate token → get PlayerId, refuse players already playing
//!   3. Register with the gateway → send HandshakeAck
//!   4. Loop: dispatch client events, forward the player's queued
//!      server events
//!   5. On exit, settle the player's game and unregister

use std::sync::Arc;
use std::time::Instant;

use noughts_gateway::{Authenticator, PlayerReceiver};
use noughts_protocol::{
    ClientEvent, Codec, Envelope, PROTOCOL_VERSION, PlayerId, ProtocolError, ServerEvent,
};
use noughts_session::SessionError;
use noughts_store::{GameStore, ProfileStore, RankingStore};
use noughts_transport::{Connection, ConnectionId, WebSocketConnection};

use crate::NoughtsError;
use crate::server::ServerState;

/// Drop guard that settles a player's game when the handler exits.
///
/// `Drop` is synchronous, so the cleanup runs in a spawned task: the game
/// is settled first, then the gateway registration is released, so a
/// reconnect cannot slip in while the old game is still live.
struct SessionGuard<G, R, P, A, C>
where
    G: GameStore,
    R: RankingStore,
    P: ProfileStore,
    A: Authenticator,
    C: Codec,
{
    player_id: PlayerId,
    conn_id: ConnectionId,
    state: Arc<ServerState<G, R, P, A, C>>,
}

impl<G, R, P, A, C> Drop for SessionGuard<G, R, P, A, C>
where
    G: GameStore,
    R: RankingStore,
    P: ProfileStore,
    A: Authenticator,
    C: Codec,
{
    fn drop(&mut self) {
        let player_id = self.player_id.clone();
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            // Failures are logged by the manager; the registration goes
            // regardless.
            let _ = state.sessions.disconnect(&player_id).await;
            state
                .sessions
                .gateway()
                .lock()
                .await
                .unregister(&player_id, conn_id);
            tracing::info!(%conn_id, %player_id, "player disconnected");
        });
    }
}

/// What the loop does after one client event.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<G, R, P, A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<G, R, P, A, C>>,
) -> Result<(), NoughtsError>
where
    G: GameStore,
    R: RankingStore,
    P: ProfileStore,
    A: Authenticator,
    C: Codec,
{
    let start = Instant::now();
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    // --- Step 1: Handshake ---
    let (player_id, mut outbound) = match perform_handshake(&conn, &state, &start).await {
        Ok(admitted) => admitted,
        Err(e) => {
            let _ = conn.close().await;
            return Err(e);
        }
    };
    let _guard = SessionGuard {
        player_id: player_id.clone(),
        conn_id,
        state: Arc::clone(&state),
    };
    tracing::info!(%conn_id, %player_id, "player connected");

    // --- Step 2: Message loop ---
    let idle = state.config.idle_timeout;
    let mut deadline = tokio::time::Instant::now() + idle;
    let mut seq: u64 = 1;

    loop {
        tokio::select! {
            inbound = tokio::time::timeout_at(deadline, conn.recv()) => {
                let data = match inbound {
                    Ok(Ok(Some(data))) => data,
                    Ok(Ok(None)) => {
                        tracing::debug!(%player_id, "connection closed by peer");
                        break;
                    }
                    Ok(Err(e)) => {
                        tracing::debug!(%player_id, error = %e, "receive failed");
                        break;
                    }
                    Err(_) => {
                        tracing::info!(%player_id, "idle timeout");
                        break;
                    }
                };
                deadline = tokio::time::Instant::now() + idle;

                let envelope: Envelope<ClientEvent> = match state.codec.decode(&data) {
                    Ok(env) => env,
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "skipping undecodable frame");
                        continue;
                    }
                };

                let flow =
                    dispatch(&conn, &state, &player_id, envelope.event, &mut seq, &start).await?;
                if flow == Flow::Close {
                    break;
                }
            }
            Some(event) = outbound.recv() => {
                send_event(&conn, &state.codec, event, next_seq(&mut seq), &start).await?;
            }
        }
    }

    let _ = conn.close().await;
    Ok(())
}

/// Reads the handshake, resolves the player, and registers the
/// connection. Every refusal is reported to the client before the error
/// is returned.
async fn perform_handshake<G, R, P, A, C>(
    conn: &WebSocketConnection,
    state: &ServerState<G, R, P, A, C>,
    start: &Instant,
) -> Result<(PlayerId, PlayerReceiver), NoughtsError>
where
    G: GameStore,
    R: RankingStore,
    P: ProfileStore,
    A: Authenticator,
    C: Codec,
{
    let codec = &state.codec;

    let data = match tokio::time::timeout(state.config.handshake_timeout, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage("closed before handshake".into()).into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let envelope: Envelope<ClientEvent> = match codec.decode(&data) {
        Ok(env) => env,
        Err(e) => return Err(refuse(conn, codec, 400, e, start).await),
    };

    let ClientEvent::Handshake { version, token } = envelope.event else {
        let err = ProtocolError::InvalidMessage("expected handshake".into());
        return Err(refuse(conn, codec, 400, err, start).await);
    };

    if version != PROTOCOL_VERSION {
        let err = ProtocolError::InvalidMessage(format!(
            "unsupported protocol version {version}, expected {PROTOCOL_VERSION}"
        ));
        return Err(refuse(conn, codec, 400, err, start).await);
    }

    let player_id = match state.auth.authenticate(token.as_deref().unwrap_or("")).await {
        Ok(id) => id,
        Err(e) => return Err(refuse(conn, codec, e.status_code(), e, start).await),
    };

    match state.sessions.active_game(&player_id).await {
        Ok(None) => {}
        Ok(Some(game)) => {
            let err = SessionError::AlreadyInSession(player_id, game.id);
            return Err(refuse(conn, codec, err.status_code(), err, start).await);
        }
        Err(e) => return Err(refuse(conn, codec, e.status_code(), e, start).await),
    }

    let registered = state
        .sessions
        .gateway()
        .lock()
        .await
        .register(player_id.clone(), conn.id());
    let outbound = match registered {
        Ok(rx) => rx,
        Err(e) => return Err(refuse(conn, codec, e.status_code(), e, start).await),
    };

    let ack = ServerEvent::HandshakeAck {
        player_id: player_id.clone(),
        server_time: elapsed_ms(start),
    };
    if let Err(e) = send_event(conn, codec, ack, 0, start).await {
        state
            .sessions
            .gateway()
            .lock()
            .await
            .unregister(&player_id, conn.id());
        return Err(e);
    }

    Ok((player_id, outbound))
}

/// Handles one client event after the handshake.
async fn dispatch<G, R, P, A, C>(
    conn: &WebSocketConnection,
    state: &ServerState<G, R, P, A, C>,
    player_id: &PlayerId,
    event: ClientEvent,
    seq: &mut u64,
    start: &Instant,
) -> Result<Flow, NoughtsError>
where
    G: GameStore,
    R: RankingStore,
    P: ProfileStore,
    A: Authenticator,
    C: Codec,
{
    let codec = &state.codec;
    let sessions = &state.sessions;

    match event {
        ClientEvent::Handshake { .. } => {
            send_error(conn, codec, 400, "already handshaken", next_seq(seq), start).await?;
        }

        ClientEvent::Heartbeat { client_time } => {
            let ack = ServerEvent::HeartbeatAck {
                client_time,
                server_time: elapsed_ms(start),
            };
            send_event(conn, codec, ack, next_seq(seq), start).await?;
        }

        // Join and move results reach the players through their queues.
        ClientEvent::JoinGame => {
            if let Err(e) = sessions.join_game(player_id).await {
                tracing::debug!(%player_id, error = %e, "join refused");
                reply_error(conn, codec, &e, next_seq(seq), start).await?;
            }
        }

        ClientEvent::MakeMove { game_id, position } => {
            if let Err(e) = sessions.make_move(player_id, &game_id, position).await {
                tracing::debug!(%player_id, %game_id, position, error = %e, "move rejected");
                reply_error(conn, codec, &e, next_seq(seq), start).await?;
            }
        }

        ClientEvent::ListGames { page, per_page } => {
            let per_page = per_page.unwrap_or(state.config.page_size);
            match sessions.list_games(page.unwrap_or(1), per_page).await {
                Ok(page) => {
                    send_event(conn, codec, ServerEvent::GamesPage(page), next_seq(seq), start)
                        .await?;
                }
                Err(e) => reply_error(conn, codec, &e, next_seq(seq), start).await?,
            }
        }

        ClientEvent::Leaderboard { limit } => {
            let cap = state.config.leaderboard_limit;
            let limit = limit.map_or(cap, |n| usize::try_from(n).unwrap_or(cap).min(cap));
            match sessions.leaderboard(player_id, limit).await {
                Ok((top_players, current_player)) => {
                    let board = ServerEvent::Leaderboard {
                        top_players,
                        current_player,
                    };
                    send_event(conn, codec, board, next_seq(seq), start).await?;
                }
                Err(e) => reply_error(conn, codec, &e, next_seq(seq), start).await?,
            }
        }

        ClientEvent::Leave { reason } => {
            tracing::info!(%player_id, %reason, "player leaving");
            return Ok(Flow::Close);
        }
    }

    Ok(Flow::Continue)
}

/// Sends one server event in an envelope.
async fn send_event(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    event: ServerEvent,
    seq: u64,
    start: &Instant,
) -> Result<(), NoughtsError> {
    let envelope = Envelope {
        seq,
        timestamp: elapsed_ms(start),
        event,
    };
    let bytes = codec.encode(&envelope)?;
    conn.send(&bytes).await?;
    Ok(())
}

/// Sends a `ServerEvent::Error` to the client.
async fn send_error(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    code: u16,
    message: &str,
    seq: u64,
    start: &Instant,
) -> Result<(), NoughtsError> {
    let event = ServerEvent::Error {
        code,
        message: message.to_string(),
    };
    send_event(conn, codec, event, seq, start).await
}

async fn reply_error(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    err: &SessionError,
    seq: u64,
    start: &Instant,
) -> Result<(), NoughtsError> {
    send_error(conn, codec, err.status_code(), &err.to_string(), seq, start).await
}

/// Tells the client why its handshake was refused and hands back the
/// error to end the connection with.
async fn refuse<E>(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    code: u16,
    err: E,
    start: &Instant,
) -> NoughtsError
where
    E: std::fmt::Display + Into<NoughtsError>,
{
    if let Err(send_err) = send_error(conn, codec, code, &err.to_string(), 0, start).await {
        tracing::debug!(error = %send_err, "could not report handshake refusal");
    }
    err.into()
}

fn elapsed_ms(start: &Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Returns the current sequence number and advances the counter.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
