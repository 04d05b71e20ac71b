use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        game::{
            CreateGameRequest, GameDetail, GameSummary, MarkSongRequest, MarkSongResponse,
            ReplaceSongsRequest, ResizeGameRequest,
        },
        participant::WinnersResponse,
        status::{ChangeStatusRequest, ChangeStatusResponse},
    },
    error::{AppError, ErrorBody},
    services::{game_service, participant_service, song_service, status_service},
    state::SharedState,
};

/// Routes managing games, their songs and their lifecycle.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", get(list_games).post(create_game))
        .route("/games/{id}", get(get_game).delete(delete_game))
        .route("/games/{id}/size", put(resize_game))
        .route("/games/{id}/songs", put(replace_songs))
        .route("/games/{id}/songs/{song_id}/played", post(mark_song))
        .route("/games/{id}/status", post(change_status))
        .route("/games/{id}/winners", get(list_winners))
}

/// List stored games, oldest first.
#[utoipa::path(
    get,
    path = "/games",
    tag = "games",
    responses(
        (status = 200, description = "Stored games", body = [GameSummary]),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    Ok(Json(game_service::list_games(&state).await?))
}

/// Create an empty game in EDITING.
#[utoipa::path(
    post,
    path = "/games",
    tag = "games",
    request_body = CreateGameRequest,
    responses(
        (status = 201, description = "Game created", body = GameDetail),
        (status = 400, description = "Invalid payload", body = ErrorBody)
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<(StatusCode, Json<GameDetail>), AppError> {
    let game = game_service::create_game(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// Game with its songs and participants.
#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Game detail", body = GameDetail),
        (status = 404, description = "Unknown game", body = ErrorBody)
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameDetail>, AppError> {
    Ok(Json(game_service::get_game(&state, id).await?))
}

/// Delete a game with its songs, participants and grids.
#[utoipa::path(
    delete,
    path = "/games/{id}",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses(
        (status = 204, description = "Game deleted"),
        (status = 404, description = "Unknown game", body = ErrorBody)
    )
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    game_service::delete_game(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change the grid size. EDITING only.
#[utoipa::path(
    put,
    path = "/games/{id}/size",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = ResizeGameRequest,
    responses(
        (status = 200, description = "Game resized", body = GameDetail),
        (status = 409, description = "Game is not in EDITING", body = ErrorBody)
    )
)]
pub async fn resize_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResizeGameRequest>,
) -> Result<Json<GameDetail>, AppError> {
    Ok(Json(game_service::resize_game(&state, id, payload.size).await?))
}

/// Replace the song pool. EDITING only.
#[utoipa::path(
    put,
    path = "/games/{id}/songs",
    tag = "songs",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = ReplaceSongsRequest,
    responses(
        (status = 200, description = "Songs replaced", body = GameDetail),
        (status = 400, description = "Invalid or duplicate songs", body = ErrorBody),
        (status = 409, description = "Game is not in EDITING", body = ErrorBody)
    )
)]
pub async fn replace_songs(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<ReplaceSongsRequest>>,
) -> Result<Json<GameDetail>, AppError> {
    Ok(Json(game_service::replace_songs(&state, id, payload).await?))
}

/// Set or clear a song's played flag and recompute every participant's win. PLAYING only.
#[utoipa::path(
    post,
    path = "/games/{id}/songs/{song_id}/played",
    tag = "songs",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("song_id" = Uuid, Path, description = "Song identifier")
    ),
    request_body = MarkSongRequest,
    responses(
        (status = 200, description = "Flag updated", body = MarkSongResponse),
        (status = 404, description = "Unknown game or song", body = ErrorBody),
        (status = 409, description = "Game is not in PLAYING", body = ErrorBody)
    )
)]
pub async fn mark_song(
    State(state): State<SharedState>,
    Path((id, song_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<MarkSongRequest>,
) -> Result<Json<MarkSongResponse>, AppError> {
    Ok(Json(
        song_service::mark_song(&state, id, song_id, payload.played).await?,
    ))
}

/// Move the game along its lifecycle.
#[utoipa::path(
    post,
    path = "/games/{id}/status",
    tag = "games",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ChangeStatusResponse),
        (status = 400, description = "Missing disposition flag", body = ErrorBody),
        (status = 409, description = "Transition not allowed", body = ErrorBody)
    )
)]
pub async fn change_status(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStatusRequest>,
) -> Result<Json<ChangeStatusResponse>, AppError> {
    Ok(Json(status_service::change_status(&state, id, payload).await?))
}

/// Participants holding a bingo, earliest first.
#[utoipa::path(
    get,
    path = "/games/{id}/winners",
    tag = "participants",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Current winners", body = WinnersResponse))
)]
pub async fn list_winners(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WinnersResponse>, AppError> {
    Ok(Json(participant_service::list_winners(&state, id).await?))
}
