use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::game::{CreateGameRequest, GameDetail, GameSummary, ReplaceSongsRequest},
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        game::{Game, GameSize, NewSong},
    },
};

/// Create an empty game in EDITING and persist it.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<GameDetail, ServiceError> {
    let name = request.name.trim().to_owned();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("game name must not be empty".into()));
    }

    let store = state.require_game_store().await?;
    let game = Game::new(name, request.size, SystemTime::now());
    store.save_game((&game).into()).await?;

    info!(game_id = %game.id, name = %game.name, size = ?game.size, "game created");
    Ok(GameDetail::from(&game))
}

/// List every stored game, oldest first.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameSummary>, ServiceError> {
    let store = state.require_game_store().await?;
    let games = store.list_games().await?;
    Ok(games.into_iter().map(GameSummary::from).collect())
}

/// Load one game with its songs and participants.
pub async fn get_game(state: &SharedState, game_id: Uuid) -> Result<GameDetail, ServiceError> {
    let game = state.load_game(game_id).await?;
    Ok(GameDetail::from(&game))
}

/// Delete a game together with its songs, participants and grids.
pub async fn delete_game(state: &SharedState, game_id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    let lock = state.game_lock(game_id);
    let deleted = {
        let _guard = lock.lock().await;
        store.delete_game(game_id).await
    };
    drop(lock);
    state.release_game_lock(game_id);

    if !deleted? {
        return Err(ServiceError::game_not_found(game_id));
    }
    info!(game_id = %game_id, "game deleted");
    Ok(())
}

/// Change the grid dimensions of a game that is still being edited.
pub async fn resize_game(
    state: &SharedState,
    game_id: Uuid,
    size: GameSize,
) -> Result<GameDetail, ServiceError> {
    let (outcome, game) = state
        .update_game(game_id, |game| Ok(game.resize(size, SystemTime::now())?))
        .await?;

    info!(game_id = %game_id, size = ?size, "game resized");
    sse_events::broadcast_new_winners(state, &game, &outcome.new_winners());
    Ok(GameDetail::from(&game))
}

/// Replace the whole song pool of a game that is still being edited.
pub async fn replace_songs(
    state: &SharedState,
    game_id: Uuid,
    request: ReplaceSongsRequest,
) -> Result<GameDetail, ServiceError> {
    let songs: Vec<NewSong> = request.songs.into_iter().map(Into::into).collect();
    let count = songs.len();
    let (outcome, game) = state
        .update_game(game_id, move |game| {
            Ok(game.replace_songs(songs, SystemTime::now())?)
        })
        .await?;

    info!(game_id = %game_id, count, "song list replaced");
    sse_events::broadcast_new_winners(state, &game, &outcome.new_winners());
    Ok(GameDetail::from(&game))
}
