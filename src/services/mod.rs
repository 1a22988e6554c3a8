/// Per-group conversation engine.
pub mod control;
/// OpenAPI documentation generation.
pub mod documentation;
/// Bridge WebSocket connection and frame routing.
pub mod gateway_service;
/// Health check service.
pub mod health_service;
/// Per-group session task.
pub mod music_server;
/// Playlist rules over the active store.
pub mod playlist_service;
/// Playlist storage connection supervisor.
pub mod storage_supervisor;
