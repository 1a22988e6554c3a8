/// Database model definitions.
pub mod models;
/// Playlist persistence backends.
pub mod playlist_store;
/// Storage abstraction layer for database operations.
pub mod storage;
