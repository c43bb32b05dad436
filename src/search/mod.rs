//! Media link lookup for playlist tracks.
//!
//! A track is resolved by running a web search for
//! `"<title> <artist> official audio"` and picking the first result that
//! points to a known media host. The lookup is best effort: every network or
//! parse failure is logged and reported as "not found".

use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use url::Url;

use crate::{
    info,
    types::{DownloadJob, Track},
    utils, warning,
};

/// Maps a track to an external media URL.
#[async_trait]
pub trait LinkResolver: Send + Sync {
    /// Returns `None` when nothing was found or the lookup failed.
    async fn resolve(&self, title: &str, artist: &str) -> Option<String>;
}

pub struct SearchLinkResolver {
    client: Client,
    search_url: String,
    pause: Duration,
}

impl SearchLinkResolver {
    pub fn new(search_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            search_url: search_url.into(),
            pause: Duration::ZERO,
        }
    }

    /// Pause inserted before every search request.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn search_query(title: &str, artist: &str) -> String {
        format!("{} {} official audio", title, artist)
    }

    async fn search(&self, title: &str, artist: &str) -> Result<Option<String>, String> {
        let url = Url::parse_with_params(
            &self.search_url,
            &[("q", Self::search_query(title, artist))],
        )
        .map_err(|e| e.to_string())?;

        let html = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| e.to_string())?
            .text()
            .await
            .map_err(|e| e.to_string())?;

        Ok(utils::extract_media_link(&html))
    }
}

#[async_trait]
impl LinkResolver for SearchLinkResolver {
    async fn resolve(&self, title: &str, artist: &str) -> Option<String> {
        if !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }

        match self.search(title, artist).await {
            Ok(link) => link,
            Err(e) => {
                warning!(
                    "Error fetching YouTube link for '{}' by '{}': {}",
                    title,
                    artist,
                    e
                );
                None
            }
        }
    }
}

/// Looks up a media link for every track, in order.
///
/// A miss is recorded as a job without a link; it never stops the run.
pub async fn resolve_tracks<R: LinkResolver + ?Sized>(
    resolver: &R,
    tracks: Vec<Track>,
) -> Vec<DownloadJob> {
    let pb = ProgressBar::new(tracks.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{msg} [{bar:40.blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.set_message("Fetching YouTube links");

    let mut jobs = Vec::with_capacity(tracks.len());
    for track in tracks {
        let artists = track.artist_line();
        let link = resolver.resolve(&track.title, &artists).await;

        pb.suspend(|| {
            info!(
                "Processed '{}' by '{}'. YouTube link: {}",
                track.title,
                artists,
                link.as_deref().unwrap_or("Not found")
            )
        });
        pb.inc(1);

        jobs.push(DownloadJob::new(track, link));
    }

    pb.finish_and_clear();
    jobs
}
