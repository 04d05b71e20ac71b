use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::{
    dao::models::{GameEntity, GameListItemEntity, GridCellEntity, ParticipantEntity, SongEntity},
    state::{game::GameSize, status::GameStatus},
};

/// Game aggregate as stored in the `games` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: Binary,
    name: String,
    size: GameSize,
    status: GameStatus,
    #[serde(default)]
    songs: Vec<MongoSongDocument>,
    #[serde(default)]
    participants: Vec<MongoParticipantDocument>,
    created_at: DateTime,
    updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoSongDocument {
    id: Uuid,
    title: String,
    artist: String,
    #[serde(default)]
    played: bool,
    played_at: Option<DateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoParticipantDocument {
    id: Uuid,
    name: String,
    email: Option<String>,
    #[serde(default)]
    grid: Vec<GridCellEntity>,
    #[serde(default)]
    is_grid_complete: bool,
    #[serde(default)]
    has_won: bool,
    won_at: Option<DateTime>,
    created_at: DateTime,
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: uuid_as_binary(value.id),
            name: value.name,
            size: value.size,
            status: value.status,
            songs: value.songs.into_iter().map(Into::into).collect(),
            participants: value.participants.into_iter().map(Into::into).collect(),
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoGameDocument> for GameEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGameDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: binary_as_uuid(&value.id)?,
            name: value.name,
            size: value.size,
            status: value.status,
            songs: value.songs.into_iter().map(Into::into).collect(),
            participants: value.participants.into_iter().map(Into::into).collect(),
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

impl TryFrom<MongoGameDocument> for GameListItemEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoGameDocument) -> Result<Self, Self::Error> {
        let entity = GameEntity::try_from(value)?;
        Ok(GameListItemEntity::from(&entity))
    }
}

impl From<SongEntity> for MongoSongDocument {
    fn from(value: SongEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            artist: value.artist,
            played: value.played,
            played_at: value.played_at.map(DateTime::from_system_time),
        }
    }
}

impl From<MongoSongDocument> for SongEntity {
    fn from(value: MongoSongDocument) -> Self {
        Self {
            id: value.id,
            title: value.title,
            artist: value.artist,
            played: value.played,
            played_at: value.played_at.map(DateTime::to_system_time),
        }
    }
}

impl From<ParticipantEntity> for MongoParticipantDocument {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            grid: value.grid,
            is_grid_complete: value.is_grid_complete,
            has_won: value.has_won,
            won_at: value.won_at.map(DateTime::from_system_time),
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoParticipantDocument> for ParticipantEntity {
    fn from(value: MongoParticipantDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            grid: value.grid,
            is_grid_complete: value.is_grid_complete,
            has_won: value.has_won,
            won_at: value.won_at.map(DateTime::to_system_time),
            created_at: value.created_at.to_system_time(),
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

fn binary_as_uuid(binary: &Binary) -> Result<Uuid, MongoDaoError> {
    Uuid::from_slice(&binary.bytes).map_err(|_| MongoDaoError::InvalidDocumentId)
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
