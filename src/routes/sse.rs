use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/admin",
    tag = "sse",
    responses((status = 200, description = "Admin SSE stream (status.changed, song.played, participant.won)", content_type = "text/event-stream", body = String))
)]
/// Stream game events to the DJ console.
pub async fn admin_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_admin(&state);
    info!("New admin SSE connection");
    let handshake = sse_service::handshake(&state).await;
    sse_service::to_sse_stream(receiver, handshake)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/admin", get(admin_stream))
}
