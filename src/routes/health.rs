use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{config::ClientConfigResponse, health::HealthResponse},
    services::health_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "health",
    responses((status = 200, description = "Service health", body = HealthResponse))
)]
/// Return the current health status of the backend and ping the storage.
pub async fn healthcheck(State(state): State<SharedState>) -> Json<HealthResponse> {
    let status = health_service::health_status(&state).await;
    Json(status)
}

#[utoipa::path(
    get,
    path = "/config",
    tag = "health",
    responses((status = 200, description = "Client hints", body = ClientConfigResponse))
)]
/// Expose the settings front-ends need, such as the polling interval.
pub async fn client_config(State(state): State<SharedState>) -> Json<ClientConfigResponse> {
    Json(ClientConfigResponse::from(state.config().as_ref()))
}

/// Configure the health and configuration routes.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/healthcheck", get(healthcheck))
        .route("/config", get(client_config))
}
