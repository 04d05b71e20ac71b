use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::status::{ChangeStatusRequest, ChangeStatusResponse, StatusWarning},
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        status::{StatusChangeRequest, TransitionWarning},
    },
};

/// Validate and apply a status change, including its reset effects, as one write.
pub async fn change_status(
    state: &SharedState,
    game_id: Uuid,
    request: ChangeStatusRequest,
) -> Result<ChangeStatusResponse, ServiceError> {
    let request = StatusChangeRequest::from(request);
    let (plan, game) = state
        .update_game(game_id, move |game| {
            let plan = game.plan_status_change(request)?;
            game.apply_transition(&plan, SystemTime::now())?;
            Ok(plan)
        })
        .await?;

    info!(
        game_id = %game_id,
        from = %plan.from,
        to = %plan.to,
        effects = ?plan.effects,
        "game status changed"
    );
    for warning in &plan.warnings {
        match warning {
            TransitionWarning::IncompleteGrids { participant_ids } => warn!(
                game_id = %game_id,
                count = participant_ids.len(),
                "play started with incomplete grids"
            ),
        }
    }

    sse_events::broadcast_status_changed(state, game_id, plan.from, plan.to);

    Ok(ChangeStatusResponse {
        previous_status: plan.from,
        game: (&game).into(),
        warnings: plan.warnings.into_iter().map(StatusWarning::from).collect(),
    })
}
