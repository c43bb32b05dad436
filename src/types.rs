use std::fmt;

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Spotify client credentials, loaded once at startup.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Opaque bearer token. The server signals expiry with a 401, so no
/// lifetime is tracked.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTracksPage {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    #[serde(default)]
    pub total: u64,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub track: Option<TrackObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackObject {
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistObject {
    pub name: Option<String>,
}

/// Normalized playlist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub artists: Vec<String>,
}

impl Track {
    pub fn new(title: impl Into<String>, artists: Vec<String>) -> Self {
        Self {
            title: title.into(),
            artists,
        }
    }

    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

/// A track paired with the media link found for it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub track: Track,
    pub media_url: Option<String>,
}

impl DownloadJob {
    pub fn new(track: Track, media_url: Option<String>) -> Self {
        Self { track, media_url }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub String);

impl WindowHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Tabled)]
pub struct ReportTableRow {
    pub outcome: String,
    pub count: usize,
}
