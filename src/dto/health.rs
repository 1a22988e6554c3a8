use serde::Serialize;
use utoipa::ToSchema;

/// Storage status reported by `/healthcheck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Playlist storage answers.
    Ok,
    /// No playlist store, or it failed its health check.
    Degraded,
}

/// Body of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Storage status.
    pub status: HealthStatus,
    /// Whether a bridge currently holds the gateway link.
    pub bridge_connected: bool,
    /// Running group sessions.
    pub sessions: usize,
}

impl HealthResponse {
    /// Whether storage is degraded.
    pub fn is_degraded(&self) -> bool {
        self.status == HealthStatus::Degraded
    }
}
