//! Configuration management for the artist tool service.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. It provides a centralized way to manage the
//! service address, the optional API key, Spotify OAuth2 credentials and the
//! helper process settings.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the working directory
//! 3. `.env` file in the local data directory
//! 4. Application defaults (where applicable)

use std::{env, path::PathBuf, str::FromStr, time::Duration};

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:0";
pub const DEFAULT_SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_HELPER_DIR: &str = "apis";
pub const DEFAULT_HELPER_INTERPRETER: &str = "python3";
pub const DEFAULT_HELPER_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HELPER_MAX_CONCURRENCY: usize = 4;

/// Scopes requested from Spotify when an agent authorizes the service.
pub const SPOTIFY_SCOPES: &[&str] = &[
    "user-read-private",
    "user-read-email",
    "playlist-read-private",
    "user-library-read",
    "user-top-read",
    "user-modify-playback-state",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Loads environment variables from `.env` files.
///
/// A `.env` in the working directory is read first; afterwards the file in the
/// platform-specific local data directory (`spotools/.env`) fills in whatever
/// is still unset. Neither file is required. The data directory is created if
/// it doesn't exist so users have a place to put their configuration.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/spotools/.env`
/// - macOS: `~/Library/Application Support/spotools/.env`
/// - Windows: `%LOCALAPPDATA%/spotools/.env`
///
/// # Errors
///
/// Returns an error string if the data directory cannot be created or one of
/// the existing `.env` files cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    match dotenv::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e.to_string()),
    }

    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotools/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    match dotenv::from_path(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}

/// Runtime settings of the service.
///
/// Built once at startup with [`Settings::from_env`] and handed to the
/// application state. Tests construct it directly, usually starting from
/// `Settings::default()`.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Address the HTTP listener binds to. Port `0` lets the OS pick one.
    pub server_address: String,
    /// When set, every tool call must present it in the `x-api-key` header.
    pub api_key: Option<String>,
    /// Public base URL of the service, used to build the OAuth2 redirect URI.
    pub base_url: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub spotify_auth_url: String,
    pub spotify_token_url: String,
    /// Directory holding the helper scripts.
    pub helper_dir: PathBuf,
    /// Program used to run a helper script, e.g. `python3`.
    pub helper_interpreter: String,
    pub helper_timeout: Duration,
    pub helper_max_concurrency: usize,
    /// Pass the caller's Spotify access token to helpers.
    pub forward_user_tokens: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            api_key: None,
            base_url: None,
            spotify_client_id: None,
            spotify_client_secret: None,
            spotify_auth_url: DEFAULT_SPOTIFY_AUTH_URL.to_string(),
            spotify_token_url: DEFAULT_SPOTIFY_TOKEN_URL.to_string(),
            helper_dir: PathBuf::from(DEFAULT_HELPER_DIR),
            helper_interpreter: DEFAULT_HELPER_INTERPRETER.to_string(),
            helper_timeout: Duration::from_secs(DEFAULT_HELPER_TIMEOUT_SECS),
            helper_max_concurrency: DEFAULT_HELPER_MAX_CONCURRENCY,
            forward_user_tokens: false,
        }
    }
}

impl Settings {
    /// Reads the settings from the process environment.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SERVER_ADDRESS` | `127.0.0.1:0` |
    /// | `SERVICE_API_KEY` | unset |
    /// | `TUNNEL_URL` | unset |
    /// | `SPOTIFY_CLIENT_ID` / `SPOTIFY_CLIENT_SECRET` | unset |
    /// | `SPOTIFY_API_AUTH_URL` | `https://accounts.spotify.com/authorize` |
    /// | `SPOTIFY_API_TOKEN_URL` | `https://accounts.spotify.com/api/token` |
    /// | `HELPER_SCRIPTS_DIR` | `apis` |
    /// | `HELPER_INTERPRETER` | `python3` |
    /// | `HELPER_TIMEOUT_SECS` | `30` |
    /// | `HELPER_MAX_CONCURRENCY` | `4` |
    /// | `FORWARD_USER_TOKENS` | `false` |
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a numeric or boolean variable
    /// cannot be parsed, or when [`Settings::validate`] rejects the result.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let settings = Self {
            server_address: var("SERVER_ADDRESS").unwrap_or(defaults.server_address),
            api_key: var("SERVICE_API_KEY"),
            base_url: var("TUNNEL_URL").map(|url| url.trim_end_matches('/').to_string()),
            spotify_client_id: var("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: var("SPOTIFY_CLIENT_SECRET"),
            spotify_auth_url: var("SPOTIFY_API_AUTH_URL").unwrap_or(defaults.spotify_auth_url),
            spotify_token_url: var("SPOTIFY_API_TOKEN_URL").unwrap_or(defaults.spotify_token_url),
            helper_dir: var("HELPER_SCRIPTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.helper_dir),
            helper_interpreter: var("HELPER_INTERPRETER").unwrap_or(defaults.helper_interpreter),
            helper_timeout: parse_var("HELPER_TIMEOUT_SECS", "a number of seconds")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.helper_timeout),
            helper_max_concurrency: parse_var("HELPER_MAX_CONCURRENCY", "a positive integer")?
                .unwrap_or(defaults.helper_max_concurrency),
            forward_user_tokens: parse_bool_var("FORWARD_USER_TOKENS")?
                .unwrap_or(defaults.forward_user_tokens),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects values that would make every helper call fail: a zero
    /// timeout or a zero concurrency limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.helper_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "HELPER_TIMEOUT_SECS",
                expected: "a positive number of seconds",
                value: "0".to_string(),
            });
        }
        if self.helper_max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                name: "HELPER_MAX_CONCURRENCY",
                expected: "a positive integer",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Redirect URI registered with Spotify for the callback endpoint.
    pub fn spotify_redirect_uri(&self) -> Option<String> {
        self.base_url
            .as_ref()
            .map(|base| format!("{base}/oauth2/callback/spotify"))
    }

    pub fn spotify_scope(&self) -> String {
        SPOTIFY_SCOPES.join(" ")
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: FromStr>(
    name: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    match var(name) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}

fn parse_bool_var(name: &'static str) -> Result<Option<bool>, ConfigError> {
    match var(name) {
        None => Ok(None),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::Invalid {
                name,
                expected: "a boolean",
                value,
            }),
        },
    }
}
