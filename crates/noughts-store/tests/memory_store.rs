//! Behavior of the in-memory stores through their public traits.

use noughts_protocol::{GameId, GameStatus, PlayerId};
use noughts_store::{
    Board, Completion, GameStore, Mark, MemoryGameStore, MemoryProfileStore, MemoryRankingStore,
    PageRequest, ProfileStore, RankingStore, StoreError, WinReason,
};

fn pid(name: &str) -> PlayerId {
    PlayerId::new(name)
}

// =========================================================================
// GameStore
// =========================================================================

#[tokio::test]
async fn test_create_opens_waiting_game_with_empty_board() {
    let store = MemoryGameStore::new();
    let id = store.create(&pid("alice")).await.unwrap();

    assert_eq!(id.as_str().len(), 24);
    let game = store.get(&id).await.unwrap().expect("game exists");
    assert_eq!(game.status, GameStatus::Waiting);
    assert_eq!(game.players.slot1, pid("alice"));
    assert_eq!(game.players.slot2, None);
    assert_eq!(game.board, Board::new());
    assert_eq!(game.current_turn, None);
}

#[tokio::test]
async fn test_join_starts_game_with_first_seat_to_move() {
    let store = MemoryGameStore::new();
    let id = store.create(&pid("alice")).await.unwrap();
    let created = store.get(&id).await.unwrap().unwrap().created_at;

    let game = store.join(&id, &pid("bob")).await.unwrap();
    assert_eq!(game.status, GameStatus::Ongoing);
    assert_eq!(game.players.slot2, Some(pid("bob")));
    assert_eq!(game.current_turn, Some(pid("alice")));
    assert!(game.created_at >= created);
}

#[tokio::test]
async fn test_join_already_started_game_conflicts() {
    let store = MemoryGameStore::new();
    let id = store.create(&pid("alice")).await.unwrap();
    store.join(&id, &pid("bob")).await.unwrap();

    let result = store.join(&id, &pid("carol")).await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));
    let game = store.get(&id).await.unwrap().unwrap();
    assert_eq!(game.players.slot2, Some(pid("bob")));
}

#[tokio::test]
async fn test_join_own_game_conflicts() {
    let store = MemoryGameStore::new();
    let id = store.create(&pid("alice")).await.unwrap();
    let result = store.join(&id, &pid("alice")).await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));
}

#[tokio::test]
async fn test_join_missing_game_not_found() {
    let store = MemoryGameStore::new();
    let result = store.join(&GameId::new("nope"), &pid("bob")).await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_find_oldest_waiting_prefers_earliest() {
    let store = MemoryGameStore::new();
    let first = store.create(&pid("a")).await.unwrap();
    let _second = store.create(&pid("b")).await.unwrap();

    let oldest = store.find_oldest_waiting().await.unwrap().unwrap();
    assert_eq!(oldest.id, first);

    store.join(&first, &pid("c")).await.unwrap();
    let oldest = store.find_oldest_waiting().await.unwrap().unwrap();
    assert_eq!(oldest.players.slot1, pid("b"));
}

#[tokio::test]
async fn test_find_by_participant_and_status_filters() {
    let store = MemoryGameStore::new();
    let id = store.create(&pid("alice")).await.unwrap();
    store.join(&id, &pid("bob")).await.unwrap();

    let live = store
        .find_by_participant_and_status(&pid("bob"), &GameStatus::LIVE)
        .await
        .unwrap();
    assert_eq!(live.map(|g| g.id), Some(id.clone()));

    let waiting = store
        .find_by_participant_and_status(&pid("bob"), &[GameStatus::Waiting])
        .await
        .unwrap();
    assert!(waiting.is_none());
}

#[tokio::test]
async fn test_apply_move_writes_board_and_turn() {
    let store = MemoryGameStore::new();
    let id = store.create(&pid("alice")).await.unwrap();
    store.join(&id, &pid("bob")).await.unwrap();

    let mut board = Board::new();
    board.place(4, Mark::X).unwrap();
    store.apply_move(&id, &board, &pid("bob")).await.unwrap();

    let game = store.get(&id).await.unwrap().unwrap();
    assert_eq!(game.board.get(4), Some(Mark::X));
    assert_eq!(game.current_turn, Some(pid("bob")));
}

#[tokio::test]
async fn test_apply_move_to_stranger_writes_nothing() {
    let store = MemoryGameStore::new();
    let id = store.create(&pid("alice")).await.unwrap();
    store.join(&id, &pid("bob")).await.unwrap();

    let mut board = Board::new();
    board.place(0, Mark::X).unwrap();
    let result = store.apply_move(&id, &board, &pid("mallory")).await;
    assert!(matches!(result, Err(StoreError::InvalidField(_))));

    let game = store.get(&id).await.unwrap().unwrap();
    assert_eq!(game.board, Board::new());
    assert_eq!(game.current_turn, Some(pid("alice")));
}

#[tokio::test]
async fn test_set_completed_forfeit_records_note() {
    let store = MemoryGameStore::new();
    let id = store.create(&pid("alice")).await.unwrap();
    store.join(&id, &pid("bob")).await.unwrap();

    let game = store
        .set_completed(
            &id,
            &Completion::Win {
                winner: pid("bob"),
                loser: pid("alice"),
                reason: WinReason::Withdrawal,
            },
        )
        .await
        .unwrap();

    assert_eq!(game.status, GameStatus::Completed);
    assert_eq!(game.winner, Some(pid("bob")));
    assert_eq!(game.loser, Some(pid("alice")));
    assert!(!game.is_draw);
    assert_eq!(game.notes.as_deref(), Some("Opponent withdrew"));
    assert!(game.ended_at.is_some());
    assert_eq!(game.current_turn, None);
}

#[tokio::test]
async fn test_set_completed_twice_conflicts() {
    let store = MemoryGameStore::new();
    let id = store.create(&pid("alice")).await.unwrap();
    store.join(&id, &pid("bob")).await.unwrap();
    let first = store.set_completed(&id, &Completion::Draw).await.unwrap();

    let result = store
        .set_completed(
            &id,
            &Completion::Win {
                winner: pid("alice"),
                loser: pid("bob"),
                reason: WinReason::Line,
            },
        )
        .await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));

    let game = store.get(&id).await.unwrap().unwrap();
    assert!(game.is_draw);
    assert_eq!(game.winner, None);
    assert_eq!(game.ended_at, first.ended_at);
}

#[tokio::test]
async fn test_delete_returns_whether_removed() {
    let store = MemoryGameStore::new();
    let id = store.create(&pid("alice")).await.unwrap();
    assert!(store.delete(&id).await.unwrap());
    assert!(!store.delete(&id).await.unwrap());
    assert!(store.get(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_purge_unfinished_keeps_completed() {
    let store = MemoryGameStore::new();
    let done = store.create(&pid("a")).await.unwrap();
    store.join(&done, &pid("b")).await.unwrap();
    store.set_completed(&done, &Completion::Draw).await.unwrap();
    let live = store.create(&pid("c")).await.unwrap();
    store.join(&live, &pid("d")).await.unwrap();
    store.create(&pid("e")).await.unwrap();

    assert_eq!(store.purge_unfinished().await.unwrap(), 2);
    let page = store.list_page(PageRequest::new(1, 10)).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.games[0].game_id, done);
}

#[tokio::test]
async fn test_list_page_walks_in_creation_order() {
    let store = MemoryGameStore::new();
    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(store.create(&pid(&format!("p{i}"))).await.unwrap());
    }

    let page = store.list_page(PageRequest::new(2, 2)).await.unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.page, 2);
    assert!(page.has_next);
    assert!(page.has_prev);
    let listed: Vec<_> = page.games.iter().map(|g| g.game_id.clone()).collect();
    assert_eq!(listed, ids[2..4].to_vec());

    let last = store.list_page(PageRequest::new(3, 2)).await.unwrap();
    assert_eq!(last.games.len(), 1);
    assert!(!last.has_next);

    let beyond = store.list_page(PageRequest::new(9, 2)).await.unwrap();
    assert!(beyond.games.is_empty());
}

#[tokio::test]
async fn test_find_all_by_player_includes_both_seats() {
    let store = MemoryGameStore::new();
    let first = store.create(&pid("alice")).await.unwrap();
    store.join(&first, &pid("bob")).await.unwrap();
    let second = store.create(&pid("bob")).await.unwrap();
    store.create(&pid("carol")).await.unwrap();

    let games = store.find_all_by_player(&pid("bob")).await.unwrap();
    let ids: Vec<_> = games.into_iter().map(|g| g.game_id).collect();
    assert_eq!(ids, vec![first, second]);
}

// =========================================================================
// RankingStore
// =========================================================================

#[tokio::test]
async fn test_record_win_adds_three_points() {
    let store = MemoryRankingStore::new();
    store.record_win(&pid("alice")).await.unwrap();

    let entry = store.entry(&pid("alice")).await.unwrap().unwrap();
    assert_eq!((entry.wins, entry.draws, entry.score), (1, 0, 3));
}

#[tokio::test]
async fn test_record_draw_adds_one_point() {
    let store = MemoryRankingStore::new();
    store.record_draw(&pid("alice")).await.unwrap();
    store.record_draw(&pid("alice")).await.unwrap();

    let entry = store.entry(&pid("alice")).await.unwrap().unwrap();
    assert_eq!((entry.wins, entry.draws, entry.score), (0, 2, 2));
}

#[tokio::test]
async fn test_top_orders_by_score_then_username() {
    let store = MemoryRankingStore::new();
    store.record_win(&pid("carol")).await.unwrap();
    store.record_win(&pid("bob")).await.unwrap();
    store.record_draw(&pid("alice")).await.unwrap();
    store.record_win(&pid("dave")).await.unwrap();
    store.record_win(&pid("dave")).await.unwrap();

    let names: Vec<_> = store
        .top(10)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.username)
        .collect();
    assert_eq!(names, vec![pid("dave"), pid("bob"), pid("carol"), pid("alice")]);

    assert_eq!(store.top(2).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_rank_of_counts_strictly_greater_scores() {
    let store = MemoryRankingStore::new();
    store.record_win(&pid("a")).await.unwrap();
    store.record_win(&pid("b")).await.unwrap();
    store.record_draw(&pid("c")).await.unwrap();

    assert_eq!(store.rank_of(&pid("a")).await.unwrap(), Some(1));
    assert_eq!(store.rank_of(&pid("b")).await.unwrap(), Some(1));
    assert_eq!(store.rank_of(&pid("c")).await.unwrap(), Some(3));
    assert_eq!(store.rank_of(&pid("nobody")).await.unwrap(), None);
}

// =========================================================================
// ProfileStore
// =========================================================================

#[tokio::test]
async fn test_profile_counts_games_played() {
    let store = MemoryProfileStore::new();
    store.record_win(&pid("alice")).await.unwrap();
    store.record_loss(&pid("alice")).await.unwrap();
    store.record_draw(&pid("alice")).await.unwrap();

    let profile = store.get(&pid("alice")).await.unwrap().unwrap();
    assert_eq!(profile.wins, 1);
    assert_eq!(profile.losses, 1);
    assert_eq!(profile.draws, 1);
    assert_eq!(profile.games_played, 3);
    assert!(store.get(&pid("bob")).await.unwrap().is_none());
}
