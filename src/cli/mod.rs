//! # CLI Module
//!
//! This module provides the command-line interface layer for Sporldl. It
//! sequences the three phases of a playlist download and owns no resilience
//! logic itself:
//!
//! - [`fetch`] - Retrieves the playlist tracks from Spotify and writes the track list
//! - [`resolve`] - Looks up a media link per track and adds it to the track list
//! - [`download`] - Drives the conversion service for every track with a link
//! - [`run`] - All three phases in order
//!
//! ## Data Flow
//!
//! ```text
//! fetch    → playlist.csv (Track Name, Artists)
//! resolve  → playlist.csv (Track Name, Artists, YouTube Link)
//! download → audio files + playlist.failed.csv
//! ```
//!
//! Because every phase persists its result, a run can be resumed at
//! `resolve` or `download` without fetching the playlist again.
//!
//! ## Error Handling
//!
//! - **Fatal**: missing credentials, a failed token exchange and a browser
//!   that cannot be launched terminate the program
//! - **Per item**: a missing link or a failed conversion is logged with the
//!   track's title and artists, and the run continues

mod download;
mod fetch;
mod resolve;
mod run;

pub use download::download;
pub use fetch::fetch;
pub use resolve::resolve;
pub use run::run;
