//! Jukebox Back binary entrypoint wiring the bridge gateway, Lavalink and playlist storage.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jukebox_back::{
    config::AppConfig,
    dao::playlist_store::memory::InMemoryPlaylistStore,
    routes,
    state::{AppState, SharedState},
    transport::lavalink::LavalinkClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let tracks = LavalinkClient::new(config.lavalink()).context("building Lavalink client")?;
    info!(node = %config.lavalink().base_url(), "using Lavalink node");

    let app_state = AppState::new(config, Arc::new(tracks));
    start_storage(&app_state).await;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Supervise MongoDB when `MONGO_URI` is set, otherwise keep playlists in memory.
async fn start_storage(state: &SharedState) {
    #[cfg(feature = "mongo-store")]
    if env::var("MONGO_URI").is_ok() {
        use jukebox_back::{
            dao::{
                playlist_store::{
                    PlaylistStore,
                    mongodb::{MongoConfig, MongoPlaylistStore},
                },
                storage::StorageError,
            },
            services::storage_supervisor,
        };

        info!("using MongoDB playlist storage");
        tokio::spawn(storage_supervisor::run(state.store().clone(), || async {
            let config = MongoConfig::from_env().await.map_err(StorageError::from)?;
            let store = MongoPlaylistStore::connect(config)
                .await
                .map_err(StorageError::from)?;
            Ok(Arc::new(store) as Arc<dyn PlaylistStore>)
        }));
        return;
    }

    warn!("MONGO_URI not set; playlists are kept in memory and lost on restart");
    state
        .store()
        .install(Arc::new(InMemoryPlaylistStore::default()))
        .await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
