use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::{game::GameError, status::StatusError},
};

/// Failures surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The game store answered with a connectivity error.
    #[error("game storage unavailable")]
    Unavailable(#[source] StorageError),
    /// No game store is installed.
    #[error("game storage unavailable (degraded mode)")]
    Degraded,
    /// The request itself is wrong: bad position, duplicate song, missing flag.
    #[error("{0}")]
    InvalidInput(String),
    /// The game's status forbids the operation.
    #[error("{0}")]
    InvalidState(String),
    /// The game, song or participant does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The game's lock or its stored copy did not become available in time.
    #[error("operation on game timed out")]
    Timeout,
    /// A stored game could not be read back.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub(crate) fn game_not_found(game_id: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("game `{game_id}` not found"))
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        if err.is_connectivity() {
            ServiceError::Unavailable(err)
        } else {
            ServiceError::Internal(err.to_string())
        }
    }
}

impl From<StatusError> for ServiceError {
    fn from(err: StatusError) -> Self {
        match err {
            StatusError::MissingDisposition { .. } => ServiceError::InvalidInput(err.to_string()),
            StatusError::InvalidTransition { .. }
            | StatusError::InsufficientSongs { .. }
            | StatusError::IllegalPhaseOperation { .. }
            | StatusError::StatusMismatch { .. } => ServiceError::InvalidState(err.to_string()),
        }
    }
}

impl From<GameError> for ServiceError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::Status(status) => status.into(),
            GameError::ParticipantNotFound(_) | GameError::SongNotFound(_) => {
                ServiceError::NotFound(err.to_string())
            }
            GameError::NotEnoughSongs { .. } => ServiceError::InvalidState(err.to_string()),
            GameError::PositionOutOfRange { .. }
            | GameError::DuplicateSong(_)
            | GameError::DuplicatePosition(_)
            | GameError::InvalidInput(_) => ServiceError::InvalidInput(err.to_string()),
        }
    }
}

/// Error returned by HTTP handlers. The variant picks the status code and the
/// message travels unchanged in the JSON body.
#[derive(Debug, Error)]
pub enum AppError {
    /// 400, malformed or invalid input.
    #[error("{0}")]
    BadRequest(String),
    /// 404, unknown resource.
    #[error("{0}")]
    NotFound(String),
    /// 409, the game's status forbids the request.
    #[error("{0}")]
    Conflict(String),
    /// 503, storage missing, unreachable or too slow.
    #[error("{0}")]
    ServiceUnavailable(String),
    /// 500, anything else.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Unavailable(_) | ServiceError::Degraded | ServiceError::Timeout => {
                AppError::ServiceUnavailable(message)
            }
            ServiceError::InvalidInput(_) => AppError::BadRequest(message),
            ServiceError::InvalidState(_) => AppError::Conflict(message),
            ServiceError::NotFound(_) => AppError::NotFound(message),
            ServiceError::Internal(_) => AppError::Internal(message),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {err}"))
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Human readable description.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }
        (
            status,
            Json(ErrorBody {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
