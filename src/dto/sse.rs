use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{game::SongSummary, participant::ParticipantSummary},
    state::status::GameStatus,
};

/// One named event on the admin stream, with its JSON payload already rendered.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    /// SSE `event:` field. `None` sends an unnamed message.
    pub event: Option<String>,
    /// SSE `data:` field.
    pub data: String,
}

impl ServerEvent {
    /// Render `payload` as JSON under the event name `name`.
    pub fn named<T: Serialize>(name: &str, payload: &T) -> serde_json::Result<Self> {
        let data = serde_json::to_string(payload)?;
        Ok(Self {
            event: Some(name.to_owned()),
            data,
        })
    }
}

/// First event a new admin subscriber receives.
#[derive(Debug, Serialize, ToSchema)]
pub struct Handshake {
    pub stream: String,
    pub message: String,
    /// True while no game store is reachable.
    pub degraded: bool,
}

/// Degraded mode flipped.
#[derive(Debug, Serialize, ToSchema)]
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after a status change has been persisted.
pub struct StatusChangedEvent {
    pub game_id: Uuid,
    pub from: GameStatus,
    pub to: GameStatus,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a song's played flag changes.
pub struct SongPlayedEvent {
    pub game_id: Uuid,
    pub song: SongSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once per participant that just got a bingo.
pub struct ParticipantWonEvent {
    pub game_id: Uuid,
    pub participant: ParticipantSummary,
}
