//! Configuration management for the Spotify Playlist Downloader.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. It provides a centralized way to manage application
//! configuration including Spotify API credentials, endpoint URLs and the
//! conversion service location.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. `.env` file in the working directory
//! 4. Application defaults (where applicable)

use std::{env, path::PathBuf};

use crate::{Res, spotify::auth::AuthError, types::Credentials};

pub const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SPOTIFY_API_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search";
pub const DEFAULT_CONVERTER_URL: &str = "https://ytmp3s.nu/R6qp/";
pub const DEFAULT_FETCH_MAX_RETRIES: u32 = 3;

/// Loads environment variables from `.env` files.
///
/// Creates the local data directory if it doesn't exist and loads the `.env`
/// file located under `sporldl/.env` in it, followed by a `.env` file in the
/// working directory. Variables already present in the environment are never
/// overwritten, and a missing file is not an error.
///
/// # Directory Structure
///
/// The function looks for the `.env` file in:
/// - Linux: `~/.local/share/sporldl/.env`
/// - macOS: `~/Library/Application Support/sporldl/.env`
/// - Windows: `%LOCALAPPDATA%/sporldl/.env`
///
/// # Errors
///
/// This function will return an error if:
/// - The parent directory cannot be created
/// - An existing `.env` file cannot be read or parsed
pub async fn load_env() -> Res<()> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path)?;
    }

    if let Err(e) = dotenv::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    Ok(())
}

fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("sporldl/.env");
    path
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn required(key: &str) -> Result<String, AuthError> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AuthError::MissingCredential(format!("{} must be set", key)))
}

/// Returns the Spotify client credentials.
///
/// Reads `SPOTIFY_API_AUTH_CLIENT_ID` and `SPOTIFY_API_AUTH_CLIENT_SECRET`.
/// Both values are obtained when registering the application with Spotify's
/// developer platform.
///
/// # Security Note
///
/// The client secret should be kept confidential and never exposed in logs
/// or version control.
pub fn spotify_credentials() -> Result<Credentials, AuthError> {
    Ok(Credentials::new(
        required("SPOTIFY_API_AUTH_CLIENT_ID")?,
        required("SPOTIFY_API_AUTH_CLIENT_SECRET")?,
    ))
}

/// Returns the Spotify Web API base URL (`SPOTIFY_API_URL`).
///
/// ```
/// let api_url = spotify_apiurl(); // e.g., "https://api.spotify.com/v1"
/// ```
pub fn spotify_apiurl() -> String {
    var_or("SPOTIFY_API_URL", DEFAULT_SPOTIFY_API_URL)
}

/// Returns the Spotify token exchange URL (`SPOTIFY_API_TOKEN_URL`).
pub fn spotify_apitoken_url() -> String {
    var_or("SPOTIFY_API_TOKEN_URL", DEFAULT_SPOTIFY_API_TOKEN_URL)
}

/// Returns the search engine URL used to look up media links (`SEARCH_URL`).
pub fn search_url() -> String {
    var_or("SEARCH_URL", DEFAULT_SEARCH_URL)
}

/// Returns the entry page of the conversion service (`CONVERTER_URL`).
pub fn converter_url() -> String {
    var_or("CONVERTER_URL", DEFAULT_CONVERTER_URL)
}

/// Returns the directory converted tracks are saved to.
///
/// Reads `DOWNLOAD_DIR`, falling back to `sporldl` inside the user's
/// download directory, or `./downloads` when the platform has none.
pub fn download_dir() -> PathBuf {
    match env::var("DOWNLOAD_DIR") {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
        _ => dirs::download_dir()
            .map(|dir| dir.join("sporldl"))
            .unwrap_or_else(|| PathBuf::from("downloads")),
    }
}

/// Returns the retry budget for server faults while fetching a playlist.
///
/// Reads `FETCH_MAX_RETRIES`; unparsable values fall back to the default.
pub fn fetch_max_retries() -> u32 {
    env::var("FETCH_MAX_RETRIES")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_FETCH_MAX_RETRIES)
}
