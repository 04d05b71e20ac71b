use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::participant::{
        AssignCellRequest, AssignGridRequest, CreateParticipantRequest, ParticipantSummary,
    },
    error::{AppError, ErrorBody},
    services::participant_service,
    state::SharedState,
};

/// Participant registration and grid editing.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/games/{id}/participants",
            get(list_participants).post(create_participant),
        )
        .route(
            "/games/{id}/participants/{pid}",
            get(get_participant).delete(delete_participant),
        )
        .route("/games/{id}/participants/{pid}/grid", put(assign_grid))
        .route(
            "/games/{id}/participants/{pid}/grid/fill",
            post(fill_grid),
        )
        .route(
            "/games/{id}/participants/{pid}/grid/{position}",
            put(assign_cell),
        )
}

#[utoipa::path(
    get,
    path = "/games/{id}/participants",
    tag = "participants",
    params(("id" = Uuid, Path, description = "Game identifier")),
    responses((status = 200, description = "Participants in registration order", body = [ParticipantSummary]))
)]
pub async fn list_participants(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ParticipantSummary>>, AppError> {
    Ok(Json(participant_service::list_participants(&state, id).await?))
}

/// Register a participant. ENTRY only.
#[utoipa::path(
    post,
    path = "/games/{id}/participants",
    tag = "participants",
    params(("id" = Uuid, Path, description = "Game identifier")),
    request_body = CreateParticipantRequest,
    responses(
        (status = 201, description = "Participant registered", body = ParticipantSummary),
        (status = 400, description = "Blank, duplicate or over the limit", body = ErrorBody),
        (status = 409, description = "Game is not in ENTRY", body = ErrorBody)
    )
)]
pub async fn create_participant(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<CreateParticipantRequest>>,
) -> Result<(StatusCode, Json<ParticipantSummary>), AppError> {
    let participant = participant_service::create_participant(&state, id, payload).await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

#[utoipa::path(
    get,
    path = "/games/{id}/participants/{pid}",
    tag = "participants",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("pid" = Uuid, Path, description = "Participant identifier")
    ),
    responses(
        (status = 200, description = "Participant with grid", body = ParticipantSummary),
        (status = 404, description = "Unknown game or participant", body = ErrorBody)
    )
)]
pub async fn get_participant(
    State(state): State<SharedState>,
    Path((id, pid)): Path<(Uuid, Uuid)>,
) -> Result<Json<ParticipantSummary>, AppError> {
    Ok(Json(participant_service::get_participant(&state, id, pid).await?))
}

#[utoipa::path(
    delete,
    path = "/games/{id}/participants/{pid}",
    tag = "participants",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("pid" = Uuid, Path, description = "Participant identifier")
    ),
    responses(
        (status = 204, description = "Participant deleted"),
        (status = 404, description = "Unknown game or participant", body = ErrorBody)
    )
)]
pub async fn delete_participant(
    State(state): State<SharedState>,
    Path((id, pid)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    participant_service::delete_participant(&state, id, pid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the whole grid. Omitted positions stay empty. ENTRY only.
#[utoipa::path(
    put,
    path = "/games/{id}/participants/{pid}/grid",
    tag = "participants",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("pid" = Uuid, Path, description = "Participant identifier")
    ),
    request_body = AssignGridRequest,
    responses(
        (status = 200, description = "Grid replaced", body = ParticipantSummary),
        (status = 400, description = "Invalid position or duplicate song", body = ErrorBody),
        (status = 409, description = "Game is not in ENTRY", body = ErrorBody)
    )
)]
pub async fn assign_grid(
    State(state): State<SharedState>,
    Path((id, pid)): Path<(Uuid, Uuid)>,
    Valid(Json(payload)): Valid<Json<AssignGridRequest>>,
) -> Result<Json<ParticipantSummary>, AppError> {
    Ok(Json(
        participant_service::assign_grid(&state, id, pid, payload).await?,
    ))
}

/// Set or clear one cell. ENTRY only.
#[utoipa::path(
    put,
    path = "/games/{id}/participants/{pid}/grid/{position}",
    tag = "participants",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("pid" = Uuid, Path, description = "Participant identifier"),
        ("position" = usize, Path, description = "Row-major cell index")
    ),
    request_body = AssignCellRequest,
    responses(
        (status = 200, description = "Cell updated", body = ParticipantSummary),
        (status = 400, description = "Invalid position or duplicate song", body = ErrorBody)
    )
)]
pub async fn assign_cell(
    State(state): State<SharedState>,
    Path((id, pid, position)): Path<(Uuid, Uuid, usize)>,
    Json(payload): Json<AssignCellRequest>,
) -> Result<Json<ParticipantSummary>, AppError> {
    Ok(Json(
        participant_service::assign_cell(&state, id, pid, position, payload.song_id).await?,
    ))
}

/// Fill the empty cells with random unused songs. ENTRY only.
#[utoipa::path(
    post,
    path = "/games/{id}/participants/{pid}/grid/fill",
    tag = "participants",
    params(
        ("id" = Uuid, Path, description = "Game identifier"),
        ("pid" = Uuid, Path, description = "Participant identifier")
    ),
    responses(
        (status = 200, description = "Grid filled", body = ParticipantSummary),
        (status = 409, description = "Not enough songs or wrong status", body = ErrorBody)
    )
)]
pub async fn fill_grid(
    State(state): State<SharedState>,
    Path((id, pid)): Path<(Uuid, Uuid)>,
) -> Result<Json<ParticipantSummary>, AppError> {
    Ok(Json(participant_service::fill_grid(&state, id, pid).await?))
}
