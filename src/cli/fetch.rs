use std::path::Path;

use crate::{
    config, error, info,
    management::TrackListManager,
    spotify::{
        auth::TokenProvider,
        playlist::{FetchPolicy, PaginatedFetcher},
    },
    success, utils, warning,
};

pub async fn fetch(playlist_id: &str, output: &Path) {
    let credentials = match config::spotify_credentials() {
        Ok(c) => c,
        Err(e) => {
            error!("Cannot load Spotify credentials. Err: {}", e);
        }
    };

    let tokens = TokenProvider::new(credentials, config::spotify_apitoken_url());
    let token = match tokens.acquire_token().await {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to acquire access token. Err: {}", e);
        }
    };

    let policy = FetchPolicy::default().with_max_retries(config::fetch_max_retries());
    let fetcher = PaginatedFetcher::new(config::spotify_apiurl(), &tokens, policy);

    info!("Fetching tracks of playlist {}", playlist_id);
    let outcome = match fetcher.fetch_all(playlist_id, token).await {
        Ok(o) => o,
        Err(e) => {
            error!("Failed to refresh access token. Err: {}", e);
        }
    };

    if !outcome.complete {
        warning!(
            "Playlist fetch incomplete: {} of {} items retrieved.",
            outcome.items.len(),
            outcome.total
        );
    }

    let tracks = utils::normalize_tracks(&outcome.items);
    let dropped = outcome.items.len() - tracks.len();
    if dropped > 0 {
        info!("Skipped {} entries without usable title or artist", dropped);
    }

    let manager = TrackListManager::new(output);
    if let Err(e) = manager.save_tracks(&tracks).await {
        error!("Failed to write {}. Err: {}", output.display(), e);
    }

    success!("Saved {} tracks to {}", tracks.len(), output.display());
}
