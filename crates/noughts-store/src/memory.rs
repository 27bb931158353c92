//! In-process stores backed by `tokio::sync::Mutex`.
//!
//! Used by the server binary when no external database is configured,
//! and by the test suites. Nothing survives a restart.

use std::collections::HashMap;

use chrono::Utc;
use noughts_protocol::{GameId, GameStatus, GameSummary, GamesPage, PlayerId, RankingEntry};
use rand::Rng;
use tokio::sync::Mutex;

use crate::store::{DRAW_POINTS, WIN_POINTS};
use crate::{
    Board, Completion, Game, GameStore, PageRequest, PlayerProfile, ProfileStore, RankingStore,
    StoreError,
};

// =========================================================================
// Games
// =========================================================================

/// Games kept in creation order.
#[derive(Default)]
pub struct MemoryGameStore {
    games: Mutex<Vec<Game>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 12 random bytes as 24 lowercase hex characters.
fn generate_game_id() -> GameId {
    let bytes: [u8; 12] = rand::rng().random();
    GameId::new(bytes.iter().map(|b| format!("{b:02x}")).collect::<String>())
}

fn find_mut<'a>(games: &'a mut [Game], id: &GameId) -> Result<&'a mut Game, StoreError> {
    games
        .iter_mut()
        .find(|g| g.id == *id)
        .ok_or_else(|| StoreError::NotFound(id.clone()))
}

impl GameStore for MemoryGameStore {
    async fn create(&self, player: &PlayerId) -> Result<GameId, StoreError> {
        let mut games = self.games.lock().await;
        let id = loop {
            let candidate = generate_game_id();
            if !games.iter().any(|g| g.id == candidate) {
                break candidate;
            }
        };
        games.push(Game::new(id.clone(), player.clone(), Utc::now()));
        tracing::debug!(game_id = %id, %player, "game record created");
        Ok(id)
    }

    async fn join(&self, id: &GameId, player: &PlayerId) -> Result<Game, StoreError> {
        let mut games = self.games.lock().await;
        let game = find_mut(&mut games, id)?;
        if game.status != GameStatus::Waiting || game.players.slot2.is_some() {
            return Err(StoreError::Conflict(format!(
                "game {id} is {} and cannot be joined",
                game.status
            )));
        }
        if game.players.slot1 == *player {
            return Err(StoreError::Conflict(format!(
                "{player} already holds the first seat of game {id}"
            )));
        }
        game.players.slot2 = Some(player.clone());
        game.status = GameStatus::Ongoing;
        game.current_turn = Some(game.players.slot1.clone());
        game.created_at = Utc::now();
        Ok(game.clone())
    }

    async fn get(&self, id: &GameId) -> Result<Option<Game>, StoreError> {
        let games = self.games.lock().await;
        Ok(games.iter().find(|g| g.id == *id).cloned())
    }

    async fn update_board(&self, id: &GameId, board: &Board) -> Result<(), StoreError> {
        let mut games = self.games.lock().await;
        find_mut(&mut games, id)?.board = *board;
        Ok(())
    }

    async fn update_turn(&self, id: &GameId, player: &PlayerId) -> Result<(), StoreError> {
        let mut games = self.games.lock().await;
        let game = find_mut(&mut games, id)?;
        if !game.is_participant(player) {
            return Err(StoreError::InvalidField(format!(
                "{player} is not seated in game {id}"
            )));
        }
        game.current_turn = Some(player.clone());
        Ok(())
    }

    async fn apply_move(
        &self,
        id: &GameId,
        board: &Board,
        next_turn: &PlayerId,
    ) -> Result<(), StoreError> {
        let mut games = self.games.lock().await;
        let game = find_mut(&mut games, id)?;
        if !game.is_participant(next_turn) {
            return Err(StoreError::InvalidField(format!(
                "{next_turn} is not seated in game {id}"
            )));
        }
        game.board = *board;
        game.current_turn = Some(next_turn.clone());
        Ok(())
    }

    async fn set_completed(&self, id: &GameId, completion: &Completion) -> Result<Game, StoreError> {
        let mut games = self.games.lock().await;
        let game = find_mut(&mut games, id)?;
        if game.status == GameStatus::Completed {
            return Err(StoreError::Conflict(format!("game {id} is already completed")));
        }
        match completion {
            Completion::Draw => {
                game.is_draw = true;
            }
            Completion::Win { winner, loser, .. } => {
                if !game.is_participant(winner) || !game.is_participant(loser) || winner == loser {
                    return Err(StoreError::InvalidField(format!(
                        "{winner} and {loser} are not the two players of game {id}"
                    )));
                }
                game.winner = Some(winner.clone());
                game.loser = Some(loser.clone());
            }
        }
        game.status = GameStatus::Completed;
        game.current_turn = None;
        game.notes = completion.note().map(str::to_owned);
        game.ended_at = Some(Utc::now());
        Ok(game.clone())
    }

    async fn delete(&self, id: &GameId) -> Result<bool, StoreError> {
        let mut games = self.games.lock().await;
        let before = games.len();
        games.retain(|g| g.id != *id);
        Ok(games.len() < before)
    }

    async fn find_oldest_waiting(&self) -> Result<Option<Game>, StoreError> {
        let games = self.games.lock().await;
        // min_by_key keeps the first of equal keys, so ties go to the
        // earlier-created record
        Ok(games
            .iter()
            .filter(|g| g.status == GameStatus::Waiting)
            .min_by_key(|g| g.created_at)
            .cloned())
    }

    async fn find_by_participant_and_status(
        &self,
        player: &PlayerId,
        statuses: &[GameStatus],
    ) -> Result<Option<Game>, StoreError> {
        let games = self.games.lock().await;
        Ok(games
            .iter()
            .find(|g| statuses.contains(&g.status) && g.is_participant(player))
            .cloned())
    }

    async fn list_page(&self, request: PageRequest) -> Result<GamesPage, StoreError> {
        let games = self.games.lock().await;
        let total = games.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let page = games
            .iter()
            .skip(offset)
            .take(request.per_page() as usize)
            .map(Game::summary)
            .collect();
        Ok(request.into_page(page, total))
    }

    async fn find_all_by_player(&self, player: &PlayerId) -> Result<Vec<GameSummary>, StoreError> {
        let games = self.games.lock().await;
        Ok(games
            .iter()
            .filter(|g| g.is_participant(player))
            .map(Game::summary)
            .collect())
    }

    async fn purge_unfinished(&self) -> Result<usize, StoreError> {
        let mut games = self.games.lock().await;
        let before = games.len();
        games.retain(|g| !g.status.is_live());
        Ok(before - games.len())
    }
}

// =========================================================================
// Rankings
// =========================================================================

#[derive(Default)]
pub struct MemoryRankingStore {
    entries: Mutex<HashMap<PlayerId, RankingEntry>>,
}

impl MemoryRankingStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn bump(&self, player: &PlayerId, wins: u64, draws: u64, points: u64) {
        let mut entries = self.entries.lock().await;
        let entry = entries.entry(player.clone()).or_insert_with(|| RankingEntry {
            username: player.clone(),
            wins: 0,
            draws: 0,
            score: 0,
        });
        entry.wins += wins;
        entry.draws += draws;
        entry.score += points;
    }
}

impl RankingStore for MemoryRankingStore {
    async fn record_win(&self, player: &PlayerId) -> Result<(), StoreError> {
        self.bump(player, 1, 0, WIN_POINTS).await;
        Ok(())
    }

    async fn record_draw(&self, player: &PlayerId) -> Result<(), StoreError> {
        self.bump(player, 0, 1, DRAW_POINTS).await;
        Ok(())
    }

    async fn top(&self, n: usize) -> Result<Vec<RankingEntry>, StoreError> {
        let entries = self.entries.lock().await;
        let mut ranked: Vec<RankingEntry> = entries.values().cloned().collect();
        ranked.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.username.cmp(&b.username))
        });
        ranked.truncate(n);
        Ok(ranked)
    }

    async fn rank_of(&self, player: &PlayerId) -> Result<Option<u64>, StoreError> {
        let entries = self.entries.lock().await;
        let Some(own) = entries.get(player) else {
            return Ok(None);
        };
        let ahead = entries.values().filter(|e| e.score > own.score).count() as u64;
        Ok(Some(ahead + 1))
    }

    async fn entry(&self, player: &PlayerId) -> Result<Option<RankingEntry>, StoreError> {
        Ok(self.entries.lock().await.get(player).cloned())
    }
}

// =========================================================================
// Profiles
// =========================================================================

#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<PlayerId, PlayerProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update(&self, player: &PlayerId, apply: impl FnOnce(&mut PlayerProfile)) {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .entry(player.clone())
            .or_insert_with(|| PlayerProfile::new(player.clone()));
        apply(profile);
        profile.games_played += 1;
    }
}

impl ProfileStore for MemoryProfileStore {
    async fn record_win(&self, player: &PlayerId) -> Result<(), StoreError> {
        self.update(player, |p| p.wins += 1).await;
        Ok(())
    }

    async fn record_loss(&self, player: &PlayerId) -> Result<(), StoreError> {
        self.update(player, |p| p.losses += 1).await;
        Ok(())
    }

    async fn record_draw(&self, player: &PlayerId) -> Result<(), StoreError> {
        self.update(player, |p| p.draws += 1).await;
        Ok(())
    }

    async fn get(&self, player: &PlayerId) -> Result<Option<PlayerProfile>, StoreError> {
        Ok(self.profiles.lock().await.get(player).cloned())
    }
}
