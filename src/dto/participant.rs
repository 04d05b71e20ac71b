use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        format_system_time,
        validation::{validate_not_blank, validate_position},
    },
    state::game::{Participant, Song},
};

/// Payload registering a participant.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateParticipantRequest {
    #[validate(length(min = 1, max = 80), custom(function = "validate_not_blank"))]
    pub name: String,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
}

/// One cell of a grid assignment.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema, Validate)]
pub struct GridCellInput {
    #[validate(custom(function = "validate_position"))]
    pub position: usize,
    pub song_id: Uuid,
}

/// Full replacement of a participant's grid. Cells left out stay empty.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AssignGridRequest {
    #[validate(length(max = 25), nested)]
    pub cells: Vec<GridCellInput>,
}

/// Sets a single cell, or clears it when `song_id` is null or absent.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignCellRequest {
    #[serde(default)]
    pub song_id: Option<Uuid>,
}

/// Filled grid cell as exposed to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GridCellSummary {
    pub position: usize,
    pub song_id: Uuid,
    /// False when the song is unplayed or no longer in the pool.
    pub played: bool,
}

/// Participant as exposed to clients.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantSummary {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    /// Filled cells, ordered by position.
    pub grid: Vec<GridCellSummary>,
    pub is_grid_complete: bool,
    pub has_won: bool,
    pub won_at: Option<String>,
    pub created_at: String,
}

impl ParticipantSummary {
    /// Build the view, resolving played flags against the game's songs.
    pub fn new(participant: &Participant, songs: &IndexMap<Uuid, Song>) -> Self {
        Self {
            id: participant.id,
            name: participant.name.clone(),
            email: participant.email.clone(),
            grid: participant
                .grid
                .iter()
                .map(|(position, song_id)| GridCellSummary {
                    position: *position,
                    song_id: *song_id,
                    played: songs.get(song_id).is_some_and(|song| song.played),
                })
                .collect(),
            is_grid_complete: participant.is_grid_complete,
            has_won: participant.has_won,
            won_at: participant.won_at.map(format_system_time),
            created_at: format_system_time(participant.created_at),
        }
    }
}

/// Participants currently holding a bingo, earliest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct WinnersResponse {
    pub winners: Vec<ParticipantSummary>,
}
