use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the DJ bingo backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::health::client_config,
        crate::routes::sse::admin_stream,
        crate::routes::games::list_games,
        crate::routes::games::create_game,
        crate::routes::games::get_game,
        crate::routes::games::delete_game,
        crate::routes::games::resize_game,
        crate::routes::games::replace_songs,
        crate::routes::games::mark_song,
        crate::routes::games::change_status,
        crate::routes::games::list_winners,
        crate::routes::participants::list_participants,
        crate::routes::participants::create_participant,
        crate::routes::participants::get_participant,
        crate::routes::participants::delete_participant,
        crate::routes::participants::assign_grid,
        crate::routes::participants::assign_cell,
        crate::routes::participants::fill_grid,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::config::ClientConfigResponse,
            crate::dto::game::CreateGameRequest,
            crate::dto::game::ResizeGameRequest,
            crate::dto::game::ReplaceSongsRequest,
            crate::dto::game::SongInput,
            crate::dto::game::SongSummary,
            crate::dto::game::GameSummary,
            crate::dto::game::GameDetail,
            crate::dto::game::MarkSongRequest,
            crate::dto::game::MarkSongResponse,
            crate::dto::participant::CreateParticipantRequest,
            crate::dto::participant::GridCellInput,
            crate::dto::participant::AssignGridRequest,
            crate::dto::participant::AssignCellRequest,
            crate::dto::participant::GridCellSummary,
            crate::dto::participant::ParticipantSummary,
            crate::dto::participant::WinnersResponse,
            crate::dto::status::ChangeStatusRequest,
            crate::dto::status::ChangeStatusResponse,
            crate::dto::status::StatusWarning,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::StatusChangedEvent,
            crate::dto::sse::SongPlayedEvent,
            crate::dto::sse::ParticipantWonEvent,
            crate::state::game::GameSize,
            crate::state::status::GameStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check and client configuration"),
        (name = "games", description = "Game lifecycle management"),
        (name = "songs", description = "Song pool and played flags"),
        (name = "participants", description = "Participants, grids and winners"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/games",
            "/games/{id}",
            "/games/{id}/status",
            "/games/{id}/songs/{song_id}/played",
            "/games/{id}/participants/{pid}/grid/{position}",
            "/games/{id}/participants/{pid}/grid/fill",
            "/sse/admin",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
