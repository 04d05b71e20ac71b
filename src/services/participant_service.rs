use std::time::SystemTime;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::participant::{
        AssignGridRequest, CreateParticipantRequest, ParticipantSummary, WinnersResponse,
    },
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        game::{Game, GameError},
        reconcile::Reconciliation,
    },
};

/// Register a participant while entry is open.
pub async fn create_participant(
    state: &SharedState,
    game_id: Uuid,
    request: CreateParticipantRequest,
) -> Result<ParticipantSummary, ServiceError> {
    let max_participants = state.config().max_participants_per_game();
    let CreateParticipantRequest { name, email } = request;
    let email = email
        .map(|email| email.trim().to_owned())
        .filter(|email| !email.is_empty());

    let (participant_id, game) = state
        .update_game(game_id, move |game| {
            let participant =
                game.add_participant(name, email, max_participants, SystemTime::now())?;
            Ok(participant.id)
        })
        .await?;

    let summary = summarize(&game, participant_id)?;
    info!(game_id = %game_id, participant_id = %participant_id, name = %summary.name, "participant registered");
    Ok(summary)
}

/// Every participant of a game in registration order.
pub async fn list_participants(
    state: &SharedState,
    game_id: Uuid,
) -> Result<Vec<ParticipantSummary>, ServiceError> {
    let game = state.load_game(game_id).await?;
    Ok(game
        .participants
        .values()
        .map(|participant| ParticipantSummary::new(participant, &game.songs))
        .collect())
}

/// One participant with their grid.
pub async fn get_participant(
    state: &SharedState,
    game_id: Uuid,
    participant_id: Uuid,
) -> Result<ParticipantSummary, ServiceError> {
    let game = state.load_game(game_id).await?;
    summarize(&game, participant_id)
}

/// Remove a participant and their grid.
pub async fn delete_participant(
    state: &SharedState,
    game_id: Uuid,
    participant_id: Uuid,
) -> Result<(), ServiceError> {
    state
        .update_game(game_id, move |game| {
            if game.remove_participant(participant_id, SystemTime::now()) {
                Ok(())
            } else {
                Err(GameError::ParticipantNotFound(participant_id).into())
            }
        })
        .await?;

    info!(game_id = %game_id, participant_id = %participant_id, "participant deleted");
    Ok(())
}

/// Replace a participant's whole grid.
pub async fn assign_grid(
    state: &SharedState,
    game_id: Uuid,
    participant_id: Uuid,
    request: AssignGridRequest,
) -> Result<ParticipantSummary, ServiceError> {
    let cells: Vec<(usize, Uuid)> = request
        .cells
        .into_iter()
        .map(|cell| (cell.position, cell.song_id))
        .collect();

    let (outcome, game) = state
        .update_game(game_id, move |game| {
            Ok(game.assign_grid(participant_id, cells, SystemTime::now())?)
        })
        .await?;

    finish_grid_write(state, &game, participant_id, &outcome, "grid replaced")
}

/// Set or clear one grid cell.
pub async fn assign_cell(
    state: &SharedState,
    game_id: Uuid,
    participant_id: Uuid,
    position: usize,
    song_id: Option<Uuid>,
) -> Result<ParticipantSummary, ServiceError> {
    let (outcome, game) = state
        .update_game(game_id, move |game| {
            Ok(game.assign_cell(participant_id, position, song_id, SystemTime::now())?)
        })
        .await?;

    finish_grid_write(state, &game, participant_id, &outcome, "grid cell updated")
}

/// Fill every empty cell with distinct random songs from the pool.
pub async fn fill_grid(
    state: &SharedState,
    game_id: Uuid,
    participant_id: Uuid,
) -> Result<ParticipantSummary, ServiceError> {
    let (outcome, game) = state
        .update_game(game_id, move |game| {
            let mut rng = rand::rng();
            Ok(game.fill_grid(participant_id, &mut rng, SystemTime::now())?)
        })
        .await?;

    finish_grid_write(state, &game, participant_id, &outcome, "grid filled")
}

/// Participants currently holding a bingo, earliest winner first.
pub async fn list_winners(
    state: &SharedState,
    game_id: Uuid,
) -> Result<WinnersResponse, ServiceError> {
    let game = state.load_game(game_id).await?;
    let winners = game
        .winners()
        .into_iter()
        .map(|participant| ParticipantSummary::new(participant, &game.songs))
        .collect();
    Ok(WinnersResponse { winners })
}

fn finish_grid_write(
    state: &SharedState,
    game: &Game,
    participant_id: Uuid,
    outcome: &Reconciliation,
    action: &'static str,
) -> Result<ParticipantSummary, ServiceError> {
    let summary = summarize(game, participant_id)?;
    debug!(
        game_id = %game.id,
        participant_id = %participant_id,
        complete = summary.is_grid_complete,
        "{action}"
    );
    sse_events::broadcast_new_winners(state, game, &outcome.new_winners());
    Ok(summary)
}

fn summarize(game: &Game, participant_id: Uuid) -> Result<ParticipantSummary, ServiceError> {
    game.participants
        .get(&participant_id)
        .map(|participant| ParticipantSummary::new(participant, &game.songs))
        .ok_or_else(|| GameError::ParticipantNotFound(participant_id).into())
}
