use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        game::SongSummary,
        participant::ParticipantSummary,
        sse::{ParticipantWonEvent, ServerEvent, SongPlayedEvent, StatusChangedEvent, SystemStatus},
    },
    state::{
        SharedState,
        game::{Game, Song},
        status::GameStatus,
    },
};

const EVENT_STATUS_CHANGED: &str = "status.changed";
const EVENT_SONG_PLAYED: &str = "song.played";
const EVENT_PARTICIPANT_WON: &str = "participant.won";
const EVENT_SYSTEM_STATUS: &str = "system_status";

/// Announce a persisted status change.
pub fn broadcast_status_changed(
    state: &SharedState,
    game_id: Uuid,
    from: GameStatus,
    to: GameStatus,
) {
    let payload = StatusChangedEvent { game_id, from, to };
    send_admin_event(state, EVENT_STATUS_CHANGED, &payload);
}

/// Announce that a song was marked or unmarked.
pub fn broadcast_song_played(state: &SharedState, game_id: Uuid, song: &Song) {
    let payload = SongPlayedEvent {
        game_id,
        song: SongSummary::from(song),
    };
    send_admin_event(state, EVENT_SONG_PLAYED, &payload);
}

/// Emit one `participant.won` event per id, in the given order.
///
/// Ids that are no longer part of `game` are skipped.
pub fn broadcast_new_winners(state: &SharedState, game: &Game, winners: &[Uuid]) {
    for participant_id in winners {
        let Some(participant) = game.participants.get(participant_id) else {
            continue;
        };
        let payload = ParticipantWonEvent {
            game_id: game.id,
            participant: ParticipantSummary::new(participant, &game.songs),
        };
        send_admin_event(state, EVENT_PARTICIPANT_WON, &payload);
    }
}

/// Announce entering or leaving degraded mode.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_admin_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_admin_event<T: Serialize>(state: &SharedState, event: &str, payload: &T) {
    match ServerEvent::named(event, payload) {
        Ok(message) => state.events().broadcast(message),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}
