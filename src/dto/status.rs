use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::game::GameSummary,
    state::status::{GameStatus, StatusChangeRequest, TransitionWarning},
};

/// Status change requested by an administrator.
///
/// `preserve_played_songs` is required on PLAYING -> ENTRY and `preserve_participants` on
/// ENTRY -> EDITING; both are ignored elsewhere.
#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ChangeStatusRequest {
    pub status: GameStatus,
    #[serde(default)]
    pub preserve_played_songs: Option<bool>,
    #[serde(default)]
    pub preserve_participants: Option<bool>,
}

impl From<ChangeStatusRequest> for StatusChangeRequest {
    fn from(value: ChangeStatusRequest) -> Self {
        Self {
            target: value.status,
            preserve_played_songs: value.preserve_played_songs,
            preserve_participants: value.preserve_participants,
        }
    }
}

/// Non-blocking notice attached to an accepted status change.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusWarning {
    /// Machine readable code, e.g. `incomplete_grids`.
    pub code: String,
    pub message: String,
    pub participant_ids: Vec<Uuid>,
}

impl From<TransitionWarning> for StatusWarning {
    fn from(value: TransitionWarning) -> Self {
        match value {
            TransitionWarning::IncompleteGrids { participant_ids } => Self {
                code: "incomplete_grids".into(),
                message: format!(
                    "{} participant(s) have an incomplete grid and cannot win",
                    participant_ids.len()
                ),
                participant_ids,
            },
        }
    }
}

/// Result of an accepted status change.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChangeStatusResponse {
    pub previous_status: GameStatus,
    pub game: GameSummary,
    pub warnings: Vec<StatusWarning>,
}
