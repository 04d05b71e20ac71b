use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::GameListItemEntity,
    dto::{format_system_time, participant::ParticipantSummary, validation::validate_not_blank},
    state::{
        game::{Game, GameSize, NewSong, Song},
        status::{GameStatus, allowed_targets},
    },
};

/// Payload used to create a brand-new game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    #[validate(length(min = 1, max = 120), custom(function = "validate_not_blank"))]
    pub name: String,
    pub size: GameSize,
}

/// Payload changing the grid dimensions of a game.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResizeGameRequest {
    pub size: GameSize,
}

/// Full replacement of a game's song pool.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ReplaceSongsRequest {
    #[validate(length(max = 500), nested)]
    pub songs: Vec<SongInput>,
}

/// Incoming song definition.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct SongInput {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub artist: String,
}

impl From<SongInput> for NewSong {
    fn from(value: SongInput) -> Self {
        Self {
            title: value.title,
            artist: value.artist,
        }
    }
}

/// Song as exposed to clients.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SongSummary {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub played: bool,
    /// RFC 3339 timestamp, absent while unplayed.
    pub played_at: Option<String>,
}

impl From<&Song> for SongSummary {
    fn from(song: &Song) -> Self {
        Self {
            id: song.id,
            title: song.title.clone(),
            artist: song.artist.clone(),
            played: song.played,
            played_at: song.played_at.map(format_system_time),
        }
    }
}

/// Game header shared by the list and detail views.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: Uuid,
    pub name: String,
    pub size: GameSize,
    /// Side length of the grid (3, 4 or 5).
    pub grid_size: usize,
    pub status: GameStatus,
    /// Songs needed before entry can open.
    pub required_song_count: usize,
    pub song_count: usize,
    pub participant_count: usize,
    /// Statuses reachable from the current one.
    pub allowed_transitions: Vec<GameStatus>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Game> for GameSummary {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id,
            name: game.name.clone(),
            size: game.size,
            grid_size: game.grid_size(),
            status: game.status,
            required_song_count: game.size.required_song_count(),
            song_count: game.songs.len(),
            participant_count: game.participants.len(),
            allowed_transitions: allowed_targets(game.status).to_vec(),
            created_at: format_system_time(game.created_at),
            updated_at: format_system_time(game.updated_at),
        }
    }
}

impl From<GameListItemEntity> for GameSummary {
    fn from(item: GameListItemEntity) -> Self {
        Self {
            id: item.id,
            name: item.name,
            size: item.size,
            grid_size: item.size.grid_size(),
            status: item.status,
            required_song_count: item.size.required_song_count(),
            song_count: item.song_count,
            participant_count: item.participant_count,
            allowed_transitions: allowed_targets(item.status).to_vec(),
            created_at: format_system_time(item.created_at),
            updated_at: format_system_time(item.updated_at),
        }
    }
}

/// Full game view with songs and participants.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameDetail {
    #[serde(flatten)]
    pub summary: GameSummary,
    pub songs: Vec<SongSummary>,
    pub participants: Vec<ParticipantSummary>,
}

impl From<&Game> for GameDetail {
    fn from(game: &Game) -> Self {
        Self {
            summary: game.into(),
            songs: game.songs.values().map(SongSummary::from).collect(),
            participants: game
                .participants
                .values()
                .map(|participant| ParticipantSummary::new(participant, &game.songs))
                .collect(),
        }
    }
}

/// Payload setting or clearing a song's played flag.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkSongRequest {
    /// Defaults to `true`.
    #[serde(default = "default_played")]
    pub played: bool,
}

fn default_played() -> bool {
    true
}

/// Outcome of a played-flag change.
#[derive(Debug, Serialize, ToSchema)]
pub struct MarkSongResponse {
    pub song: SongSummary,
    /// Participants that won because of this change.
    pub new_winners: Vec<ParticipantSummary>,
    /// Participants whose win was withdrawn by this change.
    pub revoked: Vec<Uuid>,
}
