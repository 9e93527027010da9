//! Configuration management for the Spotify Listening Analyzer.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. It provides a centralized way to manage application
//! configuration including Spotify API credentials, the generative model endpoint,
//! server settings, and playlist sizing.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf};

use thiserror::Error;

/// Number of resolved tracks a recommended playlist is capped at.
pub const DEFAULT_PLAYLIST_TARGET_SIZE: usize = 10;

/// Number of songs requested from the model; larger than the target because
/// some suggestions will not be found in the catalog.
pub const DEFAULT_PLAYLIST_REQUEST_SIZE: usize = 15;

pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the necessary directory structure if it doesn't exist and loads
/// environment variables from a `.env` file located in the platform-specific
/// local data directory under `sporlyze/.env`. A missing file is not an error;
/// the process environment is used as-is in that case.
///
/// # Directory Structure
///
/// The function looks for the `.env` file in:
/// - Linux: `~/.local/share/sporlyze/.env`
/// - macOS: `~/Library/Application Support/sporlyze/.env`
/// - Windows: `%LOCALAPPDATA%/sporlyze/.env`
///
/// # Errors
///
/// This function will return an error if:
/// - The parent directory cannot be created
/// - The `.env` file exists but cannot be read or parsed
pub async fn load_env() -> Result<(), String> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("sporlyze/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn optional_usize(key: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or(ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

/// Returns the server address for the local OAuth callback server.
///
/// Retrieves the `SERVER_ADDRESS` environment variable, e.g. `127.0.0.1:8888`.
pub fn server_addr() -> Result<String, ConfigError> {
    required("SERVER_ADDRESS")
}

/// Returns the Spotify API client ID for authentication.
///
/// Retrieves the `SPOTIFY_API_AUTH_CLIENT_ID` environment variable which
/// contains the client ID obtained when registering the application with
/// Spotify's developer platform.
pub fn spotify_client_id() -> Result<String, ConfigError> {
    required("SPOTIFY_API_AUTH_CLIENT_ID")
}

/// Returns the Spotify OAuth redirect URI.
///
/// This must match the redirect URI registered in the Spotify application settings.
pub fn spotify_redirect_uri() -> Result<String, ConfigError> {
    required("SPOTIFY_API_REDIRECT_URI")
}

/// Returns the Spotify API scope permissions.
///
/// The analyzer needs at least
/// `user-top-read user-read-recently-played user-library-read playlist-read-private playlist-modify-public`.
pub fn spotify_scope() -> Result<String, ConfigError> {
    required("SPOTIFY_API_AUTH_SCOPE")
}

/// Returns the Spotify OAuth authorization URL, e.g. `https://accounts.spotify.com/authorize`.
pub fn spotify_apiauth_url() -> Result<String, ConfigError> {
    required("SPOTIFY_API_AUTH_URL")
}

/// Returns the Spotify Web API base URL, e.g. `https://api.spotify.com/v1`.
pub fn spotify_apiurl() -> Result<String, ConfigError> {
    required("SPOTIFY_API_URL")
}

/// Returns the Spotify OAuth token exchange URL, e.g. `https://accounts.spotify.com/api/token`.
pub fn spotify_apitoken_url() -> Result<String, ConfigError> {
    required("SPOTIFY_API_TOKEN_URL")
}

/// Returns the Gemini API key.
///
/// # Security Note
///
/// The key should be kept confidential and never exposed in logs
/// or version control.
pub fn gemini_api_key() -> Result<String, ConfigError> {
    required("GEMINI_API_KEY")
}

pub fn gemini_api_url() -> String {
    env::var("GEMINI_API_URL").unwrap_or_else(|_| DEFAULT_GEMINI_API_URL.to_string())
}

pub fn gemini_model() -> String {
    env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string())
}

/// Returns the maximum number of tracks a recommended playlist will hold.
pub fn playlist_target_size() -> Result<usize, ConfigError> {
    optional_usize("PLAYLIST_TARGET_SIZE", DEFAULT_PLAYLIST_TARGET_SIZE)
}

/// Returns how many songs are requested from the model per recommendation.
pub fn playlist_request_size() -> Result<usize, ConfigError> {
    optional_usize("PLAYLIST_REQUEST_SIZE", DEFAULT_PLAYLIST_REQUEST_SIZE)
}
