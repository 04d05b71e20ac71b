use serde::Serialize;
use utoipa::ToSchema;

/// Overall verdict of `/healthcheck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// A game store is installed and answering.
    Ok,
    /// Requests touching games fail until storage comes back.
    Degraded,
}

/// Body of `/healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// True when no game store answers.
    pub degraded: bool,
}

impl HealthResponse {
    /// Response matching the current degraded flag.
    pub fn new(degraded: bool) -> Self {
        let status = if degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        };
        Self { status, degraded }
    }
}
