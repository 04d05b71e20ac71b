use serde::Serialize;
use utoipa::ToSchema;

use crate::{config::AppConfig, state::game::GameSize};

/// Client hints served by `/config`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClientConfigResponse {
    /// Suggested refresh interval for screens that poll instead of streaming.
    pub poll_interval_ms: u64,
    pub max_participants_per_game: usize,
    /// Grid sizes a game can be created with.
    pub sizes: Vec<GameSize>,
}

impl From<&AppConfig> for ClientConfigResponse {
    fn from(config: &AppConfig) -> Self {
        Self {
            poll_interval_ms: config.poll_interval_ms(),
            max_participants_per_game: config.max_participants_per_game(),
            sizes: vec![
                GameSize::ThreeByThree,
                GameSize::FourByFour,
                GameSize::FiveByFive,
            ],
        }
    }
}
