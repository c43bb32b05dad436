use std::{path::Path, time::Duration};

use crate::{
    config, error,
    management::TrackListManager,
    search::{self, SearchLinkResolver},
    success,
};

pub async fn resolve(input: &Path) {
    let manager = TrackListManager::new(input);
    let tracks = match manager.load_tracks().await {
        Ok(tracks) => tracks,
        Err(e) => {
            error!("Failed to read {}. Err: {}", input.display(), e);
        }
    };

    let resolver = SearchLinkResolver::new(config::search_url()).with_pause(Duration::from_secs(1));
    let jobs = search::resolve_tracks(&resolver, tracks).await;
    let found = jobs.iter().filter(|j| j.media_url.is_some()).count();

    if let Err(e) = manager.save_jobs(&jobs).await {
        error!("Failed to write {}. Err: {}", input.display(), e);
    }

    success!(
        "Found links for {} of {} tracks in {}",
        found,
        jobs.len(),
        input.display()
    );
}
