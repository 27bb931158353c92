//! The session manager: matchmaking and routing to game actors.
//!
//! Writes to a game that already exists go through that game's actor
//! (see [`actor`](crate::actor)). The manager's own job is the part no
//! single actor can own: deciding which game a joining player lands in.
//! That decision is serialized by one matchmaking lock, so two players
//! joining at the same instant can neither claim the same waiting game
//! nor both open a new one.

use std::collections::HashMap;
use std::sync::Arc;

use noughts_gateway::{Recipient, SharedGateway};
use noughts_protocol::{
    GameId, GameStatus, GamesPage, PlayerId, PlayerStanding, RankingEntry, ServerEvent,
};
use noughts_store::{Game, GameStore, PageRequest, ProfileStore, RankingStore};
use tokio::sync::Mutex;

use crate::actor::{GameHandle, Registry, Services, spawn_game};
use crate::{DisconnectOutcome, MoveOutcome, SessionConfig, SessionError};

/// How many waiting games one join will try before opening its own.
const MAX_CLAIM_ATTEMPTS: usize = 8;

/// Where a `join_game` request put the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A new game was opened; the player waits for an opponent.
    Waiting(GameId),
    /// The player took the second seat of a waiting game.
    Started { game_id: GameId, opponent: PlayerId },
}

impl JoinOutcome {
    pub fn game_id(&self) -> &GameId {
        match self {
            JoinOutcome::Waiting(id) => id,
            JoinOutcome::Started { game_id, .. } => game_id,
        }
    }
}

/// Drives matchmaking, moves, and disconnects against the stores, and
/// tells the gateway who to notify.
///
/// Cheap to share: wrap it in an `Arc` and hand a clone to each
/// connection handler.
pub struct SessionManager<G, R, P> {
    services: Arc<Services<G, R, P>>,
    registry: Registry,
    matchmaking: Mutex<()>,
    config: SessionConfig,
}

impl<G, R, P> SessionManager<G, R, P>
where
    G: GameStore,
    R: RankingStore,
    P: ProfileStore,
{
    pub fn new(
        games: Arc<G>,
        rankings: Arc<R>,
        profiles: Arc<P>,
        gateway: SharedGateway,
        config: SessionConfig,
    ) -> Self {
        Self {
            services: Arc::new(Services {
                games,
                rankings,
                profiles,
                gateway,
            }),
            registry: Arc::new(Mutex::new(HashMap::new())),
            matchmaking: Mutex::new(()),
            config,
        }
    }

    pub fn games(&self) -> &Arc<G> {
        &self.services.games
    }

    pub fn rankings(&self) -> &Arc<R> {
        &self.services.rankings
    }

    pub fn profiles(&self) -> &Arc<P> {
        &self.services.profiles
    }

    pub fn gateway(&self) -> &SharedGateway {
        &self.services.gateway
    }

    /// The waiting or ongoing game `player` occupies, if any.
    pub async fn active_game(&self, player: &PlayerId) -> Result<Option<Game>, SessionError> {
        Ok(self
            .services
            .games
            .find_by_participant_and_status(player, &GameStatus::LIVE)
            .await?)
    }

    /// Number of games with a running actor.
    pub async fn live_games(&self) -> usize {
        self.registry.lock().await.len()
    }

    // =====================================================================
    // Matchmaking
    // =====================================================================

    /// Seats `player` in the oldest waiting game, or opens a new one.
    ///
    /// # Errors
    /// [`SessionError::AlreadyInSession`] if the player already occupies a
    /// waiting or ongoing game; [`SessionError::Persistence`] if a store
    /// call fails.
    pub async fn join_game(&self, player: &PlayerId) -> Result<JoinOutcome, SessionError> {
        let _turn = self.matchmaking.lock().await;

        if let Some(current) = self.active_game(player).await? {
            return Err(SessionError::AlreadyInSession(player.clone(), current.id));
        }

        for _ in 0..MAX_CLAIM_ATTEMPTS {
            let Some(waiting) = self.services.games.find_oldest_waiting().await? else {
                break;
            };
            let handle = self.handle_for(&waiting.id).await;
            match handle.join(player.clone()).await {
                Ok(game) => {
                    return Ok(JoinOutcome::Started {
                        game_id: game.id,
                        opponent: game.players.slot1,
                    });
                }
                Err(SessionError::NotJoinable(game_id)) => {
                    tracing::debug!(%game_id, %player, "waiting game gone, looking again");
                }
                Err(e) => return Err(e),
            }
        }

        let game_id = self.services.games.create(player).await?;
        {
            let mut gateway = self.services.gateway.lock().await;
            gateway.join_room(&game_id, player.clone());
            gateway.deliver(
                Recipient::Player(player.clone()),
                ServerEvent::JoinedWaiting {
                    game_id: game_id.clone(),
                },
            );
        }
        self.handle_for(&game_id).await;
        tracing::info!(%game_id, %player, "waiting for opponent");
        Ok(JoinOutcome::Waiting(game_id))
    }

    // =====================================================================
    // Moves
    // =====================================================================

    /// Plays `player`'s mark at `position` in `game_id`.
    ///
    /// # Errors
    /// [`SessionError::IllegalMove`] if the game is not ongoing, it is not
    /// the player's turn, or the cell is out of range or taken; the board
    /// and turn are untouched. [`SessionError::SessionNotFound`] for an
    /// unknown game.
    pub async fn make_move(
        &self,
        player: &PlayerId,
        game_id: &GameId,
        position: u32,
    ) -> Result<MoveOutcome, SessionError> {
        let handle = self.handle_for(game_id).await;
        handle.make_move(player.clone(), position).await
    }

    // =====================================================================
    // Disconnects
    // =====================================================================

    /// Settles `player`'s game after their connection is gone: a waiting
    /// game is deleted, an ongoing one is forfeited to the opponent.
    /// A player with no live game is a no-op.
    ///
    /// # Errors
    /// [`SessionError::Persistence`] if the game could not be settled. The
    /// game is left in its last stored state and the failure is logged.
    pub async fn disconnect(&self, player: &PlayerId) -> Result<DisconnectOutcome, SessionError> {
        let Some(game) = self.active_game(player).await? else {
            tracing::debug!(%player, "disconnect with no live game");
            return Ok(DisconnectOutcome::NoSession);
        };

        let handle = self.handle_for(&game.id).await;
        let result = handle.disconnect(player.clone()).await;
        if let Err(e) = &result {
            tracing::error!(
                game_id = %game.id,
                %player,
                error = %e,
                "failed to settle game after disconnect"
            );
        }
        result
    }

    // =====================================================================
    // Read side
    // =====================================================================

    /// One page of the game history.
    pub async fn list_games(&self, page: u64, per_page: u64) -> Result<GamesPage, SessionError> {
        Ok(self
            .services
            .games
            .list_page(PageRequest::new(page, per_page))
            .await?)
    }

    /// The top `limit` players, plus `player`'s own standing if they have
    /// finished a game.
    pub async fn leaderboard(
        &self,
        player: &PlayerId,
        limit: usize,
    ) -> Result<(Vec<RankingEntry>, Option<PlayerStanding>), SessionError> {
        let rankings = &self.services.rankings;
        let top = rankings.top(limit).await?;
        let standing = match (rankings.entry(player).await?, rankings.rank_of(player).await?) {
            (Some(entry), Some(rank)) => Some(PlayerStanding { entry, rank }),
            _ => None,
        };
        Ok((top, standing))
    }

    // =====================================================================
    // Actor registry
    // =====================================================================

    /// The handle for `game_id`'s actor, starting one if none is running.
    ///
    /// Actors read all state from the store, so a fresh actor for a game
    /// this process never saw (or for an unknown id) behaves like any
    /// other. It removes itself once it finds the game completed or
    /// missing.
    async fn handle_for(&self, game_id: &GameId) -> GameHandle {
        let mut registry = self.registry.lock().await;
        if let Some(handle) = registry.get(game_id) {
            return handle.clone();
        }
        let handle = spawn_game(
            game_id.clone(),
            Arc::clone(&self.services),
            Arc::clone(&self.registry),
            self.config.channel_capacity,
        );
        registry.insert(game_id.clone(), handle.clone());
        handle
    }
}
