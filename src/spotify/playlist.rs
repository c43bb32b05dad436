use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::time::sleep;

use crate::{
    info,
    spotify::auth::{AuthError, TokenProvider},
    types::{AccessToken, PlaylistItem, PlaylistTracksPage},
    utils, warning,
};

pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Classification of a failed page request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("server error {0}")]
    TransientServer(StatusCode),
    #[error("access token expired")]
    TokenExpired,
    #[error("request failed with status {0}")]
    Fatal(StatusCode),
    #[error("request failed: {0}")]
    Transport(reqwest::Error),
    #[error("page could not be decoded: {0}")]
    Decode(reqwest::Error),
}

impl FetchError {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => FetchError::TokenExpired,
            StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => FetchError::TransientServer(status),
            other => FetchError::Fatal(other),
        }
    }
}

/// Pacing and retry settings for [`PaginatedFetcher`].
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Retry budget for server faults across one whole fetch.
    pub max_retries: u32,
    /// Retry `n` waits `backoff_unit * 2^n`.
    pub backoff_unit: Duration,
    /// Pause before every cursor request.
    pub page_delay: Duration,
    pub page_limit: u32,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_unit: Duration::from_secs(1),
            page_delay: Duration::from_secs(2),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl FetchPolicy {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Everything a fetch produced, including when it stopped early.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub items: Vec<PlaylistItem>,
    /// Total reported by the first page.
    pub total: u64,
    /// Retries performed after server faults.
    pub retries: u32,
    pub token_refreshes: u32,
    pub backoff_waited: Duration,
    /// False when the loop was aborted and `items` is partial.
    pub complete: bool,
}

#[derive(Debug, Clone)]
enum PageRequest {
    First,
    Cursor(String),
}

/// Walks the tracks collection of a playlist to its last page.
pub struct PaginatedFetcher<'a> {
    client: Client,
    api_url: String,
    tokens: &'a TokenProvider,
    policy: FetchPolicy,
}

impl<'a> PaginatedFetcher<'a> {
    pub fn new(api_url: impl Into<String>, tokens: &'a TokenProvider, policy: FetchPolicy) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
            tokens,
            policy,
        }
    }

    /// Retrieves every item of the playlist in API order.
    ///
    /// The first page is requested by offset; every following page uses the
    /// `next` cursor supplied by the server, after a fixed pause to respect
    /// rate limits. Failures are handled per request:
    ///
    /// - 500, 502, 503, 504: wait `backoff_unit * 2^retries` and repeat the
    ///   same request, until `max_retries` is spent
    /// - 401: mint a new token and repeat the same request; this does not
    ///   count as a retry. A 401 answering the very first request made with
    ///   a fresh token stops the fetch
    /// - anything else: stop
    ///
    /// Stopping early is not an error. The items gathered so far are
    /// returned with `complete == false`.
    ///
    /// # Errors
    ///
    /// Only a failed token refresh is returned as an error.
    pub async fn fetch_all(
        &self,
        playlist_id: &str,
        token: AccessToken,
    ) -> Result<FetchOutcome, AuthError> {
        let mut token = token;
        let mut outcome = FetchOutcome::default();
        let mut request = PageRequest::First;
        let mut refreshed_for_request = false;
        let mut pb: Option<ProgressBar> = None;

        loop {
            match self.request_page(playlist_id, &request, &token).await {
                Ok(page) => {
                    refreshed_for_request = false;

                    if pb.is_none() {
                        outcome.total = page.total;
                        info!("Total tracks in playlist: {}", page.total);
                        pb = Some(progress_bar(page.total));
                    }
                    if let Some(pb) = &pb {
                        pb.inc(page.items.len() as u64);
                    }

                    outcome.items.extend(page.items);

                    match page.next {
                        Some(next) => {
                            sleep(self.policy.page_delay).await;
                            request = PageRequest::Cursor(next);
                        }
                        None => {
                            outcome.complete = true;
                            break;
                        }
                    }
                }
                Err(FetchError::TransientServer(status)) => {
                    refreshed_for_request = false;

                    if outcome.retries >= self.policy.max_retries {
                        warning!(
                            "Max retries reached after server error {}. Keeping {} fetched tracks.",
                            status,
                            outcome.items.len()
                        );
                        break;
                    }

                    outcome.retries += 1;
                    let wait = utils::backoff_delay(self.policy.backoff_unit, outcome.retries);
                    warning!(
                        "Server error {}. Retrying in {:?}... (Attempt {}/{})",
                        status,
                        wait,
                        outcome.retries,
                        self.policy.max_retries
                    );
                    sleep(wait).await;
                    outcome.backoff_waited += wait;
                }
                Err(FetchError::TokenExpired) => {
                    if refreshed_for_request {
                        warning!("Fresh access token was rejected. Stopping playlist fetch.");
                        break;
                    }

                    info!("Access token expired. Refreshing token...");
                    token = match self.tokens.acquire_token().await {
                        Ok(t) => t,
                        Err(e) => {
                            if let Some(pb) = &pb {
                                pb.finish_and_clear();
                            }
                            return Err(e);
                        }
                    };
                    outcome.token_refreshes += 1;
                    refreshed_for_request = true;
                }
                Err(e) => {
                    warning!(
                        "Stopping playlist fetch: {}. Keeping {} fetched tracks.",
                        e,
                        outcome.items.len()
                    );
                    break;
                }
            }
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        Ok(outcome)
    }

    async fn request_page(
        &self,
        playlist_id: &str,
        request: &PageRequest,
        token: &AccessToken,
    ) -> Result<PlaylistTracksPage, FetchError> {
        let builder = match request {
            PageRequest::First => self
                .client
                .get(self.tracks_url(playlist_id))
                .query(&[("limit", self.policy.page_limit), ("offset", 0)]),
            PageRequest::Cursor(next) => self.client.get(next),
        };

        let res = builder
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status));
        }

        res.json::<PlaylistTracksPage>()
            .await
            .map_err(FetchError::Decode)
    }

    fn tracks_url(&self, playlist_id: &str) -> String {
        format!(
            "{uri}/playlists/{id}/tracks",
            uri = self.api_url.trim_end_matches('/'),
            id = playlist_id
        )
    }
}

fn progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::with_template("{msg} [{bar:40.blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    pb.set_style(style);
    pb.set_message("Fetching tracks");
    pb
}
