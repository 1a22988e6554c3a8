use tracing::warn;

use crate::{
    dto::health::{HealthResponse, HealthStatus},
    state::SharedState,
};

async fn storage_status(state: &SharedState) -> HealthStatus {
    let Ok(store) = state.store().require().await else {
        warn!("playlist storage unavailable (degraded mode)");
        return HealthStatus::Degraded;
    };
    if let Err(err) = store.health_check().await {
        warn!(error = %err, "playlist storage health check failed");
        return HealthStatus::Degraded;
    }
    if state.is_degraded() {
        HealthStatus::Degraded
    } else {
        HealthStatus::Ok
    }
}

/// Report whether playlist storage is usable, pinging it when installed,
/// alongside the bridge link and session count.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse {
        status: storage_status(state).await,
        bridge_connected: state.gateway().is_connected().await,
        sessions: state.session_count(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::playlist_store::memory::InMemoryPlaylistStore,
        state::{
            AppState,
            ids::{ChannelId, GroupId},
        },
        transport::testing::FakeTrackSource,
    };

    #[tokio::test]
    async fn degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default(), FakeTrackSource::new());
        let health = health_status(&state).await;
        assert!(health.is_degraded());
        assert!(!health.bridge_connected);

        state
            .store()
            .install(Arc::new(InMemoryPlaylistStore::default()))
            .await;
        state.ensure_session(GroupId(1), ChannelId(10));
        let health = health_status(&state).await;
        assert_eq!(health.status, HealthStatus::Ok);
        assert_eq!(health.sessions, 1);
    }
}
