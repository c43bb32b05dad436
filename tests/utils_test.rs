use std::time::Duration;

use sporldl::types::{ArtistObject, PlaylistItem, Track, TrackObject};
use sporldl::utils::*;

// Helper function to create a playlist item with the given title and artists
fn create_test_item(title: &str, artists: &[&str]) -> PlaylistItem {
    PlaylistItem {
        track: Some(TrackObject {
            name: Some(title.to_string()),
            artists: artists
                .iter()
                .map(|a| ArtistObject {
                    name: Some(a.to_string()),
                })
                .collect(),
        }),
    }
}

#[test]
fn test_has_alphabets() {
    assert!(has_alphabets("Loser"));
    assert!(has_alphabets("99 Luftballons"));
    assert!(has_alphabets("Déjà vu"));
    assert!(has_alphabets("東京"));

    assert!(!has_alphabets(""));
    assert!(!has_alphabets("12345"));
    assert!(!has_alphabets("---"));
    assert!(!has_alphabets("!? 42 ."));
}

#[test]
fn test_normalize_tracks_keeps_named_tracks() {
    let items = vec![create_test_item("Loser", &["Beck"])];
    let tracks = normalize_tracks(&items);

    assert_eq!(tracks, vec![Track::new("Loser", vec!["Beck".to_string()])]);
}

#[test]
fn test_normalize_tracks_drops_symbolic_entries() {
    let items = vec![
        create_test_item("12345", &["---"]),
        create_test_item("Loser", &["---"]),
        create_test_item("12345", &["Beck"]),
        create_test_item("", &["Beck"]),
    ];

    assert!(normalize_tracks(&items).is_empty());
}

#[test]
fn test_normalize_tracks_skips_missing_data() {
    let items = vec![
        PlaylistItem { track: None },
        PlaylistItem {
            track: Some(TrackObject {
                name: None,
                artists: vec![ArtistObject {
                    name: Some("Beck".to_string()),
                }],
            }),
        },
        PlaylistItem {
            track: Some(TrackObject {
                name: Some("Where It's At".to_string()),
                artists: vec![
                    ArtistObject { name: None },
                    ArtistObject {
                        name: Some("Beck".to_string()),
                    },
                ],
            }),
        },
    ];

    let tracks = normalize_tracks(&items);

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].title, "Where It's At");
    assert_eq!(tracks[0].artists, vec!["Beck".to_string()]);
}

#[test]
fn test_normalize_tracks_preserves_order() {
    let items = vec![
        create_test_item("First", &["A Artist"]),
        create_test_item("0000", &["B Artist"]),
        create_test_item("Second", &["C Artist", "D Artist"]),
        create_test_item("Third", &["E Artist"]),
    ];

    let tracks = normalize_tracks(&items);
    let titles: Vec<&str> = tracks.iter().map(|t| t.title.as_str()).collect();

    assert_eq!(titles, vec!["First", "Second", "Third"]);
    assert_eq!(tracks[1].artist_line(), "C Artist, D Artist");
}

#[test]
fn test_backoff_delay_doubles() {
    let unit = Duration::from_secs(1);

    assert_eq!(backoff_delay(unit, 1), Duration::from_secs(2));
    assert_eq!(backoff_delay(unit, 2), Duration::from_secs(4));
    assert_eq!(backoff_delay(unit, 3), Duration::from_secs(8));
    assert_eq!(
        backoff_delay(Duration::from_millis(10), 2),
        Duration::from_millis(40)
    );
}

#[test]
fn test_extract_media_link_unwraps_redirect() {
    let html = r#"
        <html><body>
          <a href="/search?q=loser">More results</a>
          <a href="/url?q=https://www.youtube.com/watch%3Fv%3DYgSPaXgAdzE&amp;sa=U&amp;ved=2ah">Beck - Loser</a>
          <a href="https://www.youtube.com/watch?v=other">Second</a>
        </body></html>
    "#;

    assert_eq!(
        extract_media_link(html).as_deref(),
        Some("https://www.youtube.com/watch?v=YgSPaXgAdzE")
    );
}

#[test]
fn test_extract_media_link_url_parameter() {
    let html = r#"<a class="r" href="https://redirect.example/out?url=https://youtu.be/YgSPaXgAdzE&amp;src=web">x</a>"#;

    assert_eq!(
        extract_media_link(html).as_deref(),
        Some("https://youtu.be/YgSPaXgAdzE")
    );
}

#[test]
fn test_extract_media_link_plain_href() {
    let html = r#"<p>result</p><a href='https://youtu.be/YgSPaXgAdzE'>Loser</a>"#;

    assert_eq!(
        extract_media_link(html).as_deref(),
        Some("https://youtu.be/YgSPaXgAdzE")
    );
}

#[test]
fn test_extract_media_link_none() {
    let html = r#"<a href="https://example.com/watch?v=1">a</a><a>no href</a>"#;

    assert_eq!(extract_media_link(html), None);
    assert_eq!(extract_media_link(""), None);
}
