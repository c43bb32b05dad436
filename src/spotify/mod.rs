//! # Spotify Integration Module
//!
//! This module provides the interface to the Spotify Web API needed by
//! Sporldl: minting client-credential tokens and walking the tracks
//! collection of a playlist to completion.
//!
//! ## Architecture
//!
//! ```text
//! Application Layer (CLI)
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (Client Credentials)
//!     └── Playlist Tracks (Paginated Fetch)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Core Modules
//!
//! ### Authentication Module
//!
//! [`auth`] - Implements the client credentials grant:
//! - **Stateless**: Every call performs a single token exchange
//! - **Basic Auth**: Credentials are sent as `base64(id:secret)`
//! - **No Internal Retry**: Retry policy belongs to the caller
//!
//! ### Playlist Module
//!
//! [`playlist`] - Retrieves all items of a playlist:
//! - **Cursor Pagination**: First page by offset, then the server's `next` cursor
//! - **Rate Limiting**: Fixed pause between page requests
//! - **Exponential Backoff**: Bounded retries for 500/502/503/504
//! - **Reactive Token Refresh**: A 401 mints a new token without spending the retry budget
//! - **Best Effort**: Any other failure keeps the tracks fetched so far
//!
//! ## API Coverage
//!
//! - `POST /api/token` - Client credentials token exchange
//! - `GET /playlists/{id}/tracks` - Playlist items with pagination
//!
//! ## Error Types
//!
//! - [`auth::AuthError`] - Token exchange failures, always surfaced to the caller
//! - [`playlist::FetchError`] - Classification of a single failed page request

pub mod auth;
pub mod playlist;
