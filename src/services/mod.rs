/// OpenAPI documentation generation.
pub mod documentation;
/// Game creation, listing, deletion and editing.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Participant registration, grids and winners.
pub mod participant_service;
/// Played flags and win reconciliation.
pub mod song_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Lifecycle transitions.
pub mod status_service;
/// Storage connection supervisor with backoff.
pub mod storage_supervisor;
