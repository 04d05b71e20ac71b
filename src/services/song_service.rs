use std::time::SystemTime;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::{
        game::{MarkSongResponse, SongSummary},
        participant::ParticipantSummary,
    },
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        reconcile::{WinSnapshot, detect_new_winners},
    },
};

struct MarkOutcome {
    changed: bool,
    new_winners: Vec<Uuid>,
    revoked: Vec<Uuid>,
}

/// Set or clear a song's played flag, then reconcile every participant of the game.
///
/// The flag, the win states and the timestamps are persisted together.
pub async fn mark_song(
    state: &SharedState,
    game_id: Uuid,
    song_id: Uuid,
    played: bool,
) -> Result<MarkSongResponse, ServiceError> {
    let (outcome, game) = state
        .update_game(game_id, move |game| {
            let previous: Vec<WinSnapshot> =
                game.participants.values().map(WinSnapshot::from).collect();
            let was_played = game.songs.get(&song_id).map(|song| song.played);

            let reconciliation = game.mark_song(song_id, played, SystemTime::now())?;

            let current: Vec<WinSnapshot> =
                game.participants.values().map(WinSnapshot::from).collect();
            Ok(MarkOutcome {
                changed: was_played != Some(played),
                new_winners: detect_new_winners(&previous, &current),
                revoked: reconciliation.revoked(),
            })
        })
        .await?;

    let song = game
        .songs
        .get(&song_id)
        .ok_or_else(|| ServiceError::NotFound(format!("song `{song_id}` not found")))?;

    if outcome.changed {
        info!(game_id = %game_id, song_id = %song_id, played, "song played flag updated");
        sse_events::broadcast_song_played(state, game_id, song);
    } else {
        debug!(game_id = %game_id, song_id = %song_id, played, "song flag unchanged");
    }
    if !outcome.new_winners.is_empty() {
        info!(game_id = %game_id, count = outcome.new_winners.len(), "new bingo winners");
    }
    for participant_id in &outcome.revoked {
        info!(game_id = %game_id, participant_id = %participant_id, "bingo revoked");
    }
    sse_events::broadcast_new_winners(state, &game, &outcome.new_winners);

    let new_winners = outcome
        .new_winners
        .iter()
        .filter_map(|id| game.participants.get(id))
        .map(|participant| ParticipantSummary::new(participant, &game.songs))
        .collect();

    Ok(MarkSongResponse {
        song: SongSummary::from(song),
        new_winners,
        revoked: outcome.revoked,
    })
}
