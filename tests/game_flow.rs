use std::sync::Arc;

use dj_bingo_back::{
    config::AppConfig,
    dao::game_store::memory::MemoryGameStore,
    dto::{
        game::{CreateGameRequest, GameDetail, ReplaceSongsRequest, SongInput},
        participant::{AssignGridRequest, CreateParticipantRequest, GridCellInput},
        status::ChangeStatusRequest,
    },
    error::ServiceError,
    services::{game_service, participant_service, song_service, status_service},
    state::{AppState, SharedState, game::GameSize, status::GameStatus},
};
use uuid::Uuid;

async fn state() -> SharedState {
    AppState::with_store(AppConfig::default(), Arc::new(MemoryGameStore::new())).await
}

fn songs(count: usize) -> ReplaceSongsRequest {
    ReplaceSongsRequest {
        songs: (0..count)
            .map(|i| SongInput {
                title: format!("Track {i}"),
                artist: format!("Artist {i}"),
            })
            .collect(),
    }
}

fn to(status: GameStatus) -> ChangeStatusRequest {
    ChangeStatusRequest {
        status,
        preserve_played_songs: None,
        preserve_participants: None,
    }
}

/// 3x3 game in ENTRY with 12 songs.
async fn game_in_entry(state: &SharedState) -> GameDetail {
    let game = game_service::create_game(
        state,
        CreateGameRequest {
            name: "Friday night".into(),
            size: GameSize::ThreeByThree,
        },
    )
    .await
    .unwrap();
    game_service::replace_songs(state, game.summary.id, songs(12))
        .await
        .unwrap();
    status_service::change_status(state, game.summary.id, to(GameStatus::Entry))
        .await
        .unwrap();
    game_service::get_game(state, game.summary.id).await.unwrap()
}

async fn register(state: &SharedState, game_id: Uuid, name: &str) -> Uuid {
    participant_service::create_participant(
        state,
        game_id,
        CreateParticipantRequest {
            name: name.into(),
            email: None,
        },
    )
    .await
    .unwrap()
    .id
}

/// Assign songs `offset..offset + 9` in order.
async fn assign(state: &SharedState, game: &GameDetail, participant_id: Uuid, offset: usize) {
    let cells = game.songs[offset..offset + 9]
        .iter()
        .enumerate()
        .map(|(position, song)| GridCellInput {
            position,
            song_id: song.id,
        })
        .collect();
    participant_service::assign_grid(state, game.summary.id, participant_id, AssignGridRequest { cells })
        .await
        .unwrap();
}

#[tokio::test]
async fn full_round_announces_the_winner() {
    let state = state().await;
    let mut events = state.events().subscribe();
    let game = game_in_entry(&state).await;
    let game_id = game.summary.id;

    let ada = register(&state, game_id, "Ada").await;
    let grace = register(&state, game_id, "Grace").await;
    assign(&state, &game, ada, 0).await;
    assign(&state, &game, grace, 3).await;

    let started = status_service::change_status(&state, game_id, to(GameStatus::Playing))
        .await
        .unwrap();
    assert!(started.warnings.is_empty());

    // Ada's first row: songs 0, 1 and 2. Grace does not hold them.
    for index in 0..2 {
        let outcome = song_service::mark_song(&state, game_id, game.songs[index].id, true)
            .await
            .unwrap();
        assert!(outcome.new_winners.is_empty());
    }
    let outcome = song_service::mark_song(&state, game_id, game.songs[2].id, true)
        .await
        .unwrap();
    let winners: Vec<Uuid> = outcome.new_winners.iter().map(|p| p.id).collect();
    assert_eq!(winners, vec![ada]);

    let listed = participant_service::list_winners(&state, game_id).await.unwrap();
    assert_eq!(listed.winners.len(), 1);
    assert_eq!(listed.winners[0].name, "Ada");

    let mut names = Vec::new();
    while let Ok(event) = events.try_recv() {
        names.push(event.event.unwrap_or_default());
    }
    assert_eq!(
        names.iter().filter(|name| *name == "participant.won").count(),
        1
    );
    assert_eq!(names.iter().filter(|name| *name == "song.played").count(), 3);
    assert_eq!(
        names.iter().filter(|name| *name == "status.changed").count(),
        2
    );
}

#[tokio::test]
async fn unmarking_revokes_and_remarking_wins_again() {
    let state = state().await;
    let game = game_in_entry(&state).await;
    let game_id = game.summary.id;
    let ada = register(&state, game_id, "Ada").await;
    assign(&state, &game, ada, 0).await;
    status_service::change_status(&state, game_id, to(GameStatus::Playing))
        .await
        .unwrap();

    for index in [0, 4, 8] {
        song_service::mark_song(&state, game_id, game.songs[index].id, true)
            .await
            .unwrap();
    }
    let outcome = song_service::mark_song(&state, game_id, game.songs[4].id, false)
        .await
        .unwrap();
    assert_eq!(outcome.revoked, vec![ada]);
    assert!(
        participant_service::list_winners(&state, game_id)
            .await
            .unwrap()
            .winners
            .is_empty()
    );

    let outcome = song_service::mark_song(&state, game_id, game.songs[4].id, true)
        .await
        .unwrap();
    assert_eq!(outcome.new_winners.len(), 1);
}

#[tokio::test]
async fn replay_requires_an_explicit_choice() {
    let state = state().await;
    let game = game_in_entry(&state).await;
    let game_id = game.summary.id;
    let ada = register(&state, game_id, "Ada").await;
    assign(&state, &game, ada, 0).await;
    status_service::change_status(&state, game_id, to(GameStatus::Playing))
        .await
        .unwrap();
    for index in 0..3 {
        song_service::mark_song(&state, game_id, game.songs[index].id, true)
            .await
            .unwrap();
    }

    let err = status_service::change_status(&state, game_id, to(GameStatus::Entry))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    let unchanged = game_service::get_game(&state, game_id).await.unwrap();
    assert_eq!(unchanged.summary.status, GameStatus::Playing);

    let reset = status_service::change_status(
        &state,
        game_id,
        ChangeStatusRequest {
            preserve_played_songs: Some(false),
            ..to(GameStatus::Entry)
        },
    )
    .await
    .unwrap();
    assert_eq!(reset.previous_status, GameStatus::Playing);

    let after = game_service::get_game(&state, game_id).await.unwrap();
    assert_eq!(after.summary.status, GameStatus::Entry);
    assert!(after.songs.iter().all(|song| !song.played && song.played_at.is_none()));
    assert!(after.participants.iter().all(|p| !p.has_won && p.won_at.is_none()));
    assert_eq!(after.participants[0].grid.len(), 9);
}

#[tokio::test]
async fn starting_with_incomplete_grids_warns() {
    let state = state().await;
    let game = game_in_entry(&state).await;
    let game_id = game.summary.id;
    let late = register(&state, game_id, "Late").await;

    let response = status_service::change_status(&state, game_id, to(GameStatus::Playing))
        .await
        .unwrap();
    assert_eq!(response.game.status, GameStatus::Playing);
    assert_eq!(response.warnings.len(), 1);
    assert_eq!(response.warnings[0].code, "incomplete_grids");
    assert_eq!(response.warnings[0].participant_ids, vec![late]);
}

#[tokio::test]
async fn illegal_operations_leave_the_game_untouched() {
    let state = state().await;
    let game = game_service::create_game(
        &state,
        CreateGameRequest {
            name: "Short".into(),
            size: GameSize::FourByFour,
        },
    )
    .await
    .unwrap();
    let game_id = game.summary.id;

    game_service::replace_songs(&state, game_id, songs(5))
        .await
        .unwrap();
    let err = status_service::change_status(&state, game_id, to(GameStatus::Entry))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("16 required, 5 present"));

    let err = status_service::change_status(&state, game_id, to(GameStatus::Playing))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    let err = participant_service::create_participant(
        &state,
        game_id,
        CreateParticipantRequest {
            name: "Ada".into(),
            email: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    let stored = game_service::get_game(&state, game_id).await.unwrap();
    assert_eq!(stored.summary.status, GameStatus::Editing);
    assert_eq!(stored.summary.song_count, 5);
    assert!(stored.participants.is_empty());
}

#[tokio::test]
async fn concurrent_marks_are_all_persisted() {
    let state = state().await;
    let game = game_in_entry(&state).await;
    let game_id = game.summary.id;
    status_service::change_status(&state, game_id, to(GameStatus::Playing))
        .await
        .unwrap();

    let handles: Vec<_> = game
        .songs
        .iter()
        .map(|song| {
            let state = state.clone();
            let song_id = song.id;
            tokio::spawn(async move { song_service::mark_song(&state, game_id, song_id, true).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = game_service::get_game(&state, game_id).await.unwrap();
    assert!(stored.songs.iter().all(|song| song.played));
}

#[tokio::test]
async fn fill_grid_completes_a_partial_grid() {
    let state = state().await;
    let game = game_in_entry(&state).await;
    let game_id = game.summary.id;
    let ada = register(&state, game_id, "Ada").await;

    participant_service::assign_cell(&state, game_id, ada, 4, Some(game.songs[0].id))
        .await
        .unwrap();
    let filled = participant_service::fill_grid(&state, game_id, ada).await.unwrap();
    assert!(filled.is_grid_complete);
    assert_eq!(filled.grid.len(), 9);
    assert_eq!(filled.grid[4].song_id, game.songs[0].id);
}

#[tokio::test]
async fn deleting_a_game_removes_everything() {
    let state = state().await;
    let game = game_in_entry(&state).await;
    let game_id = game.summary.id;
    let ada = register(&state, game_id, "Ada").await;

    game_service::delete_game(&state, game_id).await.unwrap();

    assert!(matches!(
        game_service::get_game(&state, game_id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        participant_service::get_participant(&state, game_id, ada).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        game_service::delete_game(&state, game_id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(game_service::list_games(&state).await.unwrap().is_empty());
}

#[tokio::test]
async fn without_storage_everything_is_degraded() {
    let state = AppState::new(AppConfig::default());
    assert!(state.is_degraded().await);
    assert!(matches!(
        game_service::list_games(&state).await,
        Err(ServiceError::Degraded)
    ));
    assert!(matches!(
        game_service::get_game(&state, Uuid::new_v4()).await,
        Err(ServiceError::Degraded)
    ));
}
