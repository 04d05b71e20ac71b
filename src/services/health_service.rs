use tracing::{debug, warn};

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the installed store and report whether the backend can serve games.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let Some(store) = state.game_store().await else {
        debug!("healthcheck without storage backend (degraded mode)");
        return HealthResponse::new(true);
    };

    match store.health_check().await {
        Ok(()) => HealthResponse::new(state.is_degraded().await),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            HealthResponse::new(true)
        }
    }
}
