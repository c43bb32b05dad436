use std::{sync::LazyLock, time::Duration};

use regex::Regex;
use url::Url;

use crate::types::{PlaylistItem, Track};

const MEDIA_HOST_PATTERNS: [&str; 2] = ["youtube.com/watch", "youtu.be/"];
const REDIRECT_PARAMS: [&str; 2] = ["q", "url"];
const RELATIVE_HREF_BASE: &str = "https://www.google.com/";

pub fn has_alphabets(s: &str) -> bool {
    s.chars().any(char::is_alphabetic)
}

/// Turns raw playlist items into tracks, keeping API order.
///
/// Items without a track object or a string name are dropped, as are tracks
/// whose title or joined artist line holds no alphabetic character (local
/// files without metadata, placeholder entries).
pub fn normalize_tracks(items: &[PlaylistItem]) -> Vec<Track> {
    items
        .iter()
        .filter_map(|item| item.track.as_ref())
        .filter_map(|track| {
            let title = track.name.as_deref()?;
            let artists: Vec<String> = track
                .artists
                .iter()
                .filter_map(|a| a.name.clone())
                .collect();

            let track = Track::new(title, artists);
            if !has_alphabets(&track.title) || !has_alphabets(&track.artist_line()) {
                return None;
            }
            Some(track)
        })
        .collect()
}

/// Delay before retry number `retry` (1-based): `unit * 2^retry`.
pub fn backoff_delay(unit: Duration, retry: u32) -> Duration {
    unit.saturating_mul(2u32.saturating_pow(retry))
}

static ANCHOR_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']+)["']"#;
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
});

/// Scans search result HTML for the first link to a known media host.
///
/// Search engines wrap result links in a redirect (`/url?q=<target>&sa=...`),
/// so the `q` or `url` query parameter is preferred over the raw href.
pub fn extract_media_link(html: &str) -> Option<String> {
    ANCHOR_HREF_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().replace("&amp;", "&"))
        .find(|href| MEDIA_HOST_PATTERNS.iter().any(|p| href.contains(p)))
        .map(|href| unwrap_redirect(&href).unwrap_or(href))
}

fn unwrap_redirect(href: &str) -> Option<String> {
    let parsed = Url::parse(href)
        .or_else(|_| Url::parse(RELATIVE_HREF_BASE).and_then(|base| base.join(href)))
        .ok()?;

    REDIRECT_PARAMS.iter().find_map(|param| {
        parsed
            .query_pairs()
            .find(|(key, _)| key == param)
            .map(|(_, value)| value.into_owned())
    })
}
