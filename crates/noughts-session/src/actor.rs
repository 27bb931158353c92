//! The per-game actor: one task that owns every write to one game.
//!
//! Each live game gets its own task. Callers talk to it through a
//! [`GameHandle`], sending [`GameCommand`]s over an `mpsc` channel and
//! awaiting the answer on a `oneshot`. Because the actor handles one
//! command at a time, a move racing another move or a disconnect on the
//! same game can never interleave their fetch, validate, and persist
//! steps. Different games run on different tasks, so a slow store call
//! for one game never stalls another.
//!
//! The actor keeps no game state of its own. Every command starts from
//! the stored record, so the store stays the single source of truth.
//!
//! ```text
//! SessionManager ──cmd──→ GameActor ──→ GameStore / RankingStore / ProfileStore
//!       ↑                    │
//!       └────── reply ───────┤
//!                            └──→ Gateway (room events)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use noughts_gateway::{Recipient, SharedGateway};
use noughts_protocol::{GameId, GameOverReason, GameResult, GameStatus, PlayerId, ServerEvent};
use noughts_store::{
    BoardError, Completion, Game, GameStore, Outcome, ProfileStore, RankingStore, StoreError,
    WinReason, evaluate,
};
use tokio::sync::{Mutex, mpsc, oneshot};

use crate::{MoveRejection, SessionError};

/// The stores and gateway every actor works against.
pub(crate) struct Services<G, R, P> {
    pub games: Arc<G>,
    pub rankings: Arc<R>,
    pub profiles: Arc<P>,
    pub gateway: SharedGateway,
}

/// Handles for live games, keyed by game. An actor removes its own entry
/// once its game is completed or gone.
pub(crate) type Registry = Arc<Mutex<HashMap<GameId, GameHandle>>>;

/// What a successful move led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The game goes on; the opponent moves next.
    Continue,
    Draw,
    Won { winner: PlayerId },
}

/// What a disconnect did to the player's game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// The player had no waiting or ongoing game.
    NoSession,
    /// The player's waiting game was deleted.
    Abandoned(GameId),
    /// The player forfeited an ongoing game.
    Forfeited { game_id: GameId, winner: PlayerId },
    /// The board had already decided the game, so it was completed by
    /// its board instead of forfeited.
    Settled { game_id: GameId, result: MoveOutcome },
}

pub(crate) enum GameCommand {
    Join {
        player: PlayerId,
        reply: oneshot::Sender<Result<Game, SessionError>>,
    },

    Move {
        player: PlayerId,
        position: u32,
        reply: oneshot::Sender<Result<MoveOutcome, SessionError>>,
    },

    Disconnect {
        player: PlayerId,
        reply: oneshot::Sender<Result<DisconnectOutcome, SessionError>>,
    },
}

/// A cloneable handle for sending commands to one game's actor.
#[derive(Clone)]
pub(crate) struct GameHandle {
    game_id: GameId,
    sender: mpsc::Sender<GameCommand>,
}

impl GameHandle {
    pub async fn join(&self, player: PlayerId) -> Result<Game, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(GameCommand::Join { player, reply }, rx).await
    }

    pub async fn make_move(
        &self,
        player: PlayerId,
        position: u32,
    ) -> Result<MoveOutcome, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            GameCommand::Move {
                player,
                position,
                reply,
            },
            rx,
        )
        .await
    }

    pub async fn disconnect(&self, player: PlayerId) -> Result<DisconnectOutcome, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(GameCommand::Disconnect { player, reply }, rx)
            .await
    }

    async fn request<T>(
        &self,
        cmd: GameCommand,
        rx: oneshot::Receiver<Result<T, SessionError>>,
    ) -> Result<T, SessionError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| SessionError::Unavailable(self.game_id.clone()))?;
        rx.await
            .map_err(|_| SessionError::Unavailable(self.game_id.clone()))?
    }
}

/// Starts an actor for `game_id` and returns its handle. The caller is
/// responsible for putting the handle in the registry.
pub(crate) fn spawn_game<G, R, P>(
    game_id: GameId,
    services: Arc<Services<G, R, P>>,
    registry: Registry,
    channel_capacity: usize,
) -> GameHandle
where
    G: GameStore,
    R: RankingStore,
    P: ProfileStore,
{
    let (tx, rx) = mpsc::channel(channel_capacity);
    let actor = GameActor {
        game_id: game_id.clone(),
        services,
        registry,
        receiver: rx,
    };
    tokio::spawn(actor.run());
    GameHandle {
        game_id,
        sender: tx,
    }
}

struct GameActor<G, R, P> {
    game_id: GameId,
    services: Arc<Services<G, R, P>>,
    registry: Registry,
    receiver: mpsc::Receiver<GameCommand>,
}

impl<G, R, P> GameActor<G, R, P>
where
    G: GameStore,
    R: RankingStore,
    P: ProfileStore,
{
    /// Runs until every handle is dropped.
    async fn run(mut self) {
        tracing::debug!(game_id = %self.game_id, "game actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                GameCommand::Join { player, reply } => {
                    let result = self.handle_join(player).await;
                    let _ = reply.send(result);
                }
                GameCommand::Move {
                    player,
                    position,
                    reply,
                } => {
                    let result = self.handle_move(player, position).await;
                    let _ = reply.send(result);
                }
                GameCommand::Disconnect { player, reply } => {
                    let result = self.handle_disconnect(player).await;
                    let _ = reply.send(result);
                }
            }
        }

        tracing::debug!(game_id = %self.game_id, "game actor stopped");
    }

    // -- Join --

    async fn handle_join(&self, player: PlayerId) -> Result<Game, SessionError> {
        let game = match self.services.games.join(&self.game_id, &player).await {
            Ok(game) => game,
            Err(StoreError::Conflict(_)) => {
                return Err(SessionError::NotJoinable(self.game_id.clone()));
            }
            Err(StoreError::NotFound(_)) => {
                self.retire().await;
                return Err(SessionError::NotJoinable(self.game_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let opponent = game.players.slot1.clone();

        {
            let mut gateway = self.services.gateway.lock().await;
            gateway.join_room(&self.game_id, player.clone());
            gateway.deliver(
                Recipient::Player(player.clone()),
                ServerEvent::JoinedStarted {
                    game_id: self.game_id.clone(),
                    opponent: opponent.clone(),
                },
            );
            gateway.deliver(
                Recipient::RoomExcept(self.game_id.clone(), player.clone()),
                ServerEvent::OpponentJoined {
                    game_id: self.game_id.clone(),
                    opponent: player.clone(),
                },
            );
        }

        tracing::info!(
            game_id = %self.game_id,
            x = %opponent,
            o = %player,
            "match started"
        );
        Ok(game)
    }

    // -- Move --

    async fn handle_move(
        &self,
        player: PlayerId,
        position: u32,
    ) -> Result<MoveOutcome, SessionError> {
        let Some(game) = self.services.games.get(&self.game_id).await? else {
            self.retire().await;
            return Err(SessionError::SessionNotFound(self.game_id.clone()));
        };

        if game.status != GameStatus::Ongoing {
            if game.status == GameStatus::Completed {
                self.retire().await;
            }
            return Err(SessionError::IllegalMove(MoveRejection::NotOngoing));
        }

        // A terminal board on an ongoing record means the completion write
        // failed last time. Finish it now instead of playing on.
        if let Some(completion) = pending_completion(&game) {
            tracing::warn!(
                game_id = %self.game_id,
                "ongoing game has a finished board, completing it"
            );
            self.finish(&game, completion).await?;
            return Err(SessionError::IllegalMove(MoveRejection::NotOngoing));
        }

        let mark = game
            .mark_of(&player)
            .ok_or(SessionError::IllegalMove(MoveRejection::NotAParticipant))?;
        if game.current_turn.as_ref() != Some(&player) {
            return Err(SessionError::IllegalMove(MoveRejection::NotYourTurn));
        }
        let opponent = game
            .opponent_of(&player)
            .cloned()
            .ok_or(SessionError::IllegalMove(MoveRejection::NotOngoing))?;

        let mut board = game.board;
        let cell = usize::try_from(position).unwrap_or(usize::MAX);
        board.place(cell, mark).map_err(|e| {
            SessionError::IllegalMove(match e {
                BoardError::OutOfRange(_) => MoveRejection::OutOfRange(position),
                BoardError::Occupied(_) => MoveRejection::Occupied(position),
            })
        })?;

        self.services
            .games
            .apply_move(&self.game_id, &board, &opponent)
            .await?;

        self.services.gateway.lock().await.deliver(
            Recipient::RoomExcept(self.game_id.clone(), player.clone()),
            ServerEvent::MoveMade {
                game_id: self.game_id.clone(),
                player: player.clone(),
                position,
            },
        );
        tracing::debug!(game_id = %self.game_id, %player, position, "move applied");

        match completion_for(&game, evaluate(&board)) {
            None => Ok(MoveOutcome::Continue),
            Some(completion) => self.finish(&game, completion).await,
        }
    }

    /// Ends the game after a decisive or drawing move.
    async fn finish(
        &self,
        game: &Game,
        completion: Completion,
    ) -> Result<MoveOutcome, SessionError> {
        self.complete(&completion).await?;

        let (event, result) = match &completion {
            Completion::Draw => (
                ServerEvent::GameOver {
                    game_id: self.game_id.clone(),
                    result: GameResult::Draw,
                    winner: None,
                    reason: None,
                },
                MoveOutcome::Draw,
            ),
            Completion::Win { winner, .. } => (
                ServerEvent::GameOver {
                    game_id: self.game_id.clone(),
                    result: GameResult::Win,
                    winner: Some(winner.clone()),
                    reason: None,
                },
                MoveOutcome::Won {
                    winner: winner.clone(),
                },
            ),
        };

        {
            let mut gateway = self.services.gateway.lock().await;
            gateway.deliver(Recipient::Room(self.game_id.clone()), event);
            gateway.close_room(&self.game_id);
        }
        self.record_result(game, &completion).await;
        self.retire().await;
        Ok(result)
    }

    // -- Disconnect --

    async fn handle_disconnect(
        &self,
        player: PlayerId,
    ) -> Result<DisconnectOutcome, SessionError> {
        let Some(game) = self.services.games.get(&self.game_id).await? else {
            self.retire().await;
            return Ok(DisconnectOutcome::NoSession);
        };
        if !game.is_participant(&player) {
            return Ok(DisconnectOutcome::NoSession);
        }

        match game.status {
            GameStatus::Waiting => {
                self.services.games.delete(&self.game_id).await?;
                self.services.gateway.lock().await.close_room(&self.game_id);
                self.retire().await;
                tracing::info!(game_id = %self.game_id, %player, "waiting game abandoned");
                Ok(DisconnectOutcome::Abandoned(self.game_id.clone()))
            }
            GameStatus::Ongoing => {
                // The board outranks the disconnect: a game whose last
                // completion write failed is settled by its line or draw.
                if let Some(completion) = pending_completion(&game) {
                    tracing::warn!(
                        game_id = %self.game_id,
                        %player,
                        "disconnect on a finished board, completing it"
                    );
                    let result = self.finish(&game, completion).await?;
                    return Ok(DisconnectOutcome::Settled {
                        game_id: self.game_id.clone(),
                        result,
                    });
                }

                let winner = game
                    .opponent_of(&player)
                    .cloned()
                    .ok_or(SessionError::IllegalMove(MoveRejection::NotOngoing))?;
                let completion = Completion::Win {
                    winner: winner.clone(),
                    loser: player.clone(),
                    reason: WinReason::Withdrawal,
                };
                self.complete(&completion).await?;

                {
                    let mut gateway = self.services.gateway.lock().await;
                    gateway.deliver(
                        Recipient::RoomExcept(self.game_id.clone(), player.clone()),
                        ServerEvent::GameOver {
                            game_id: self.game_id.clone(),
                            result: GameResult::Win,
                            winner: Some(winner.clone()),
                            reason: Some(GameOverReason::OpponentLeft),
                        },
                    );
                    gateway.close_room(&self.game_id);
                }
                self.record_result(&game, &completion).await;
                self.retire().await;

                tracing::info!(
                    game_id = %self.game_id,
                    %player,
                    %winner,
                    "game forfeited"
                );
                Ok(DisconnectOutcome::Forfeited {
                    game_id: self.game_id.clone(),
                    winner,
                })
            }
            GameStatus::Completed => {
                self.retire().await;
                Ok(DisconnectOutcome::NoSession)
            }
        }
    }

    // -- Shared steps --

    /// Writes the terminal transition. A store failure leaves the game as
    /// it was, still ongoing, and is returned to the caller.
    async fn complete(&self, completion: &Completion) -> Result<(), SessionError> {
        match self
            .services
            .games
            .set_completed(&self.game_id, completion)
            .await
        {
            Ok(_) => {
                tracing::info!(game_id = %self.game_id, ?completion, "game over");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    game_id = %self.game_id,
                    error = %e,
                    "failed to complete game, left in its last state"
                );
                Err(e.into())
            }
        }
    }

    /// Updates the leaderboard and player profiles for a completed game.
    ///
    /// Runs once, after the completion write succeeded. The game record is
    /// already final, so failures here are logged and not retried.
    async fn record_result(&self, game: &Game, completion: &Completion) {
        let services = &self.services;
        match completion {
            Completion::Draw => {
                let seated = std::iter::once(&game.players.slot1).chain(game.players.slot2.as_ref());
                for player in seated {
                    let ranked = services.rankings.record_draw(player).await;
                    self.note_failure("ranking draw", player, ranked);
                    let profiled = services.profiles.record_draw(player).await;
                    self.note_failure("profile draw", player, profiled);
                }
            }
            Completion::Win { winner, loser, .. } => {
                let ranked = services.rankings.record_win(winner).await;
                self.note_failure("ranking win", winner, ranked);
                let profiled = services.profiles.record_win(winner).await;
                self.note_failure("profile win", winner, profiled);
                let profiled = services.profiles.record_loss(loser).await;
                self.note_failure("profile loss", loser, profiled);
            }
        }
    }

    fn note_failure(&self, what: &str, player: &PlayerId, result: Result<(), StoreError>) {
        if let Err(e) = result {
            tracing::warn!(
                game_id = %self.game_id,
                %player,
                error = %e,
                "failed to record {what}"
            );
        }
    }

    /// Removes this game's handle from the registry so no new commands are
    /// routed here. Commands already queued still get answered.
    async fn retire(&self) {
        self.registry.lock().await.remove(&self.game_id);
    }
}

/// The completion an ongoing record's board already calls for. Only set
/// when an earlier completion write failed.
fn pending_completion(game: &Game) -> Option<Completion> {
    let outcome = evaluate(&game.board);
    if !outcome.is_terminal() {
        return None;
    }
    completion_for(game, outcome)
}

/// The terminal transition a board calls for, if any.
fn completion_for(game: &Game, outcome: Outcome) -> Option<Completion> {
    match outcome {
        Outcome::Ongoing => None,
        Outcome::Draw => Some(Completion::Draw),
        Outcome::Win(mark) => Some(Completion::Win {
            winner: game.player_for(mark)?.clone(),
            loser: game.player_for(mark.other())?.clone(),
            reason: WinReason::Line,
        }),
    }
}
