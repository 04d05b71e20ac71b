use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::{
    game::{Game, GameSize, Participant, Song},
    status::GameStatus,
};

/// Persisted game aggregate. Songs and participants are embedded so a save is a single write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Stable identifier for the game.
    pub id: Uuid,
    /// Display name of the event.
    pub name: String,
    /// Grid dimensions.
    pub size: GameSize,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Song pool in insertion order.
    pub songs: Vec<SongEntity>,
    /// Participants in registration order.
    pub participants: Vec<ParticipantEntity>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last update timestamp.
    pub updated_at: SystemTime,
}

/// Song stored inside a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SongEntity {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub played: bool,
    pub played_at: Option<SystemTime>,
}

/// Participant stored inside a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    /// Filled cells only, ordered by position.
    pub grid: Vec<GridCellEntity>,
    pub is_grid_complete: bool,
    pub has_won: bool,
    pub won_at: Option<SystemTime>,
    pub created_at: SystemTime,
}

/// One filled grid cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridCellEntity {
    /// Row-major index into the grid.
    pub position: u32,
    /// Song assigned to the cell.
    pub song_id: Uuid,
}

/// Lightweight projection used when listing games.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameListItemEntity {
    pub id: Uuid,
    pub name: String,
    pub size: GameSize,
    pub status: GameStatus,
    pub song_count: usize,
    pub participant_count: usize,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl From<&GameEntity> for GameListItemEntity {
    fn from(value: &GameEntity) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            size: value.size,
            status: value.status,
            song_count: value.songs.len(),
            participant_count: value.participants.len(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<&Song> for SongEntity {
    fn from(value: &Song) -> Self {
        Self {
            id: value.id,
            title: value.title.clone(),
            artist: value.artist.clone(),
            played: value.played,
            played_at: value.played_at,
        }
    }
}

impl From<SongEntity> for Song {
    fn from(value: SongEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            artist: value.artist,
            played: value.played,
            played_at: value.played_at,
        }
    }
}

impl From<&Participant> for ParticipantEntity {
    fn from(value: &Participant) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            email: value.email.clone(),
            grid: value
                .grid
                .iter()
                .map(|(position, song_id)| GridCellEntity {
                    position: *position as u32,
                    song_id: *song_id,
                })
                .collect(),
            is_grid_complete: value.is_grid_complete,
            has_won: value.has_won,
            won_at: value.won_at,
            created_at: value.created_at,
        }
    }
}

impl From<ParticipantEntity> for Participant {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            grid: value
                .grid
                .into_iter()
                .map(|cell| (cell.position as usize, cell.song_id))
                .collect(),
            is_grid_complete: value.is_grid_complete,
            has_won: value.has_won,
            won_at: value.won_at,
            created_at: value.created_at,
        }
    }
}

impl From<&Game> for GameEntity {
    fn from(value: &Game) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            size: value.size,
            status: value.status,
            songs: value.songs.values().map(SongEntity::from).collect(),
            participants: value
                .participants
                .values()
                .map(ParticipantEntity::from)
                .collect(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<GameEntity> for Game {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            size: value.size,
            status: value.status,
            songs: value
                .songs
                .into_iter()
                .map(|song| (song.id, Song::from(song)))
                .collect(),
            participants: value
                .participants
                .into_iter()
                .map(|participant| (participant.id, Participant::from(participant)))
                .collect(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
