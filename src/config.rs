//! Application-level configuration loading: engine tunables, playlist limits,
//! the audio node and the bridge credentials.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "JUKEBOX_BACK_CONFIG_PATH";

const DEFAULT_SELECTION_WAIT_SECS: u64 = 30;
const DEFAULT_MAX_PLAYLISTS: usize = 10;
const DEFAULT_MAX_PLAYLIST_NAME_LEN: usize = 30;
const DEFAULT_CHANNEL_NAME: &str = "music-bot";
const DEFAULT_SELECTION_PLACEHOLDER: &str = "> Select a command above.";

/// Connection settings of the Lavalink node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LavalinkConfig {
    /// Node host name.
    pub host: String,
    /// Node REST port.
    pub port: u16,
    /// Node password, sent as the `Authorization` header.
    pub password: String,
    /// Whether to use HTTPS.
    pub secure: bool,
}

impl Default for LavalinkConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 2333,
            password: "youshallnotpass".into(),
            secure: false,
        }
    }
}

impl LavalinkConfig {
    /// Base URL of the node REST API.
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    selection_wait_time: Duration,
    max_playlists: usize,
    max_playlist_name_len: usize,
    channel_name: String,
    selection_placeholder: String,
    lavalink: LavalinkConfig,
    gateway_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            selection_wait_time: Duration::from_secs(DEFAULT_SELECTION_WAIT_SECS),
            max_playlists: DEFAULT_MAX_PLAYLISTS,
            max_playlist_name_len: DEFAULT_MAX_PLAYLIST_NAME_LEN,
            channel_name: DEFAULT_CHANNEL_NAME.into(),
            selection_placeholder: DEFAULT_SELECTION_PLACEHOLDER.into(),
            lavalink: LavalinkConfig::default(),
            gateway_token: None,
        }
    }
}

impl AppConfig {
    /// Load the configuration file, falling back to defaults, then apply
    /// environment overrides.
    pub fn load() -> Self {
        let mut config = Self::from_file();
        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    fn from_file() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration file");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("LAVALINK_HOST") {
            self.lavalink.host = host;
        }
        if let Some(port) = lookup("LAVALINK_PORT") {
            match port.parse() {
                Ok(port) => self.lavalink.port = port,
                Err(err) => warn!(value = %port, error = %err, "ignoring invalid LAVALINK_PORT"),
            }
        }
        if let Some(password) = lookup("LAVALINK_PASSWORD") {
            self.lavalink.password = password;
        }
        if let Some(secure) = lookup("LAVALINK_SECURE") {
            self.lavalink.secure = matches!(secure.as_str(), "1" | "true" | "yes");
        }
        if let Some(token) = lookup("GATEWAY_TOKEN") {
            self.gateway_token = Some(token).filter(|token| !token.is_empty());
        }
    }

    /// How long a selection owner keeps exclusive use of the selector.
    pub fn selection_wait_time(&self) -> Duration {
        self.selection_wait_time
    }

    /// Most playlists one author may own.
    pub fn max_playlists(&self) -> usize {
        self.max_playlists
    }

    /// Longest accepted playlist name, in characters.
    pub fn max_playlist_name_len(&self) -> usize {
        self.max_playlist_name_len
    }

    /// Name of the dedicated text channel the bridge creates per group.
    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    /// Selector body shown while no selection is open.
    pub fn selection_placeholder(&self) -> &str {
        &self.selection_placeholder
    }

    /// Lavalink node settings.
    pub fn lavalink(&self) -> &LavalinkConfig {
        &self.lavalink
    }

    /// Bearer token the bridge must present, if any.
    pub fn gateway_token(&self) -> Option<&str> {
        self.gateway_token.as_deref()
    }
}

fn resolve_config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    selection_wait_time_secs: Option<u64>,
    max_playlists: Option<usize>,
    max_playlist_name_len: Option<usize>,
    channel_name: Option<String>,
    selection_placeholder: Option<String>,
    lavalink: Option<RawLavalink>,
    gateway_token: Option<String>,
}

#[derive(Debug, Deserialize)]
/// JSON representation of the `lavalink` block.
struct RawLavalink {
    host: String,
    port: u16,
    password: String,
    #[serde(default)]
    secure: bool,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            selection_wait_time: value
                .selection_wait_time_secs
                .map_or(defaults.selection_wait_time, Duration::from_secs),
            max_playlists: value.max_playlists.unwrap_or(defaults.max_playlists),
            max_playlist_name_len: value
                .max_playlist_name_len
                .unwrap_or(defaults.max_playlist_name_len),
            channel_name: value.channel_name.unwrap_or(defaults.channel_name),
            selection_placeholder: value
                .selection_placeholder
                .unwrap_or(defaults.selection_placeholder),
            lavalink: value.lavalink.map_or(defaults.lavalink, |raw| LavalinkConfig {
                host: raw.host,
                port: raw.port,
                password: raw.password,
                secure: raw.secure,
            }),
            gateway_token: value.gateway_token.or(defaults.gateway_token),
        }
    }
}
