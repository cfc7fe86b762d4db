use serde_json::json;

use crate::normalize::normalize;
use crate::types::{NormalizedEvent, RawAlbum, RawArtist, RawEvent, RawImage, RawTrack, Store};

/// Builds a raw event with every field the source sends, volatile ones included.
///
/// Derived values are keyed by `id`: the track is named `Track {id}` and has one artist with id
/// `artist-{id}` named `Artist {id}`.
pub fn raw_event(id: &str, played_at: &str) -> RawEvent {
    RawEvent {
        track: Some(RawTrack {
            album: Some(RawAlbum {
                album_type: Some("album".to_string()),
                artists: vec![raw_artist(
                    &format!("album-artist-{id}"),
                    &format!("Album Artist {id}"),
                )],
                available_markets: Some(vec!["SE".to_string(), "US".to_string()]),
                external_urls: Some(json!({
                    "spotify": format!("https://open.spotify.com/album/{id}")
                })),
                href: Some(format!("https://api.spotify.com/v1/albums/album-{id}")),
                id: Some(format!("album-{id}")),
                images: vec![
                    raw_image(&format!("https://i.scdn.co/image/{id}-300"), Some(300)),
                    raw_image(&format!("https://i.scdn.co/image/{id}-640"), Some(640)),
                    raw_image(&format!("https://i.scdn.co/image/{id}-64"), Some(64)),
                ],
                name: Some(format!("Album {id}")),
                release_date: Some("2020-01-01".to_string()),
                release_date_precision: Some("day".to_string()),
                total_tracks: Some(12),
                type_tag: Some("album".to_string()),
                uri: Some(format!("spotify:album:album-{id}")),
            }),
            artists: Some(vec![raw_artist(
                &format!("artist-{id}"),
                &format!("Artist {id}"),
            )]),
            available_markets: Some(vec!["SE".to_string(), "US".to_string()]),
            disc_number: Some(1),
            duration_ms: Some(215_000),
            explicit: Some(false),
            external_ids: Some(json!({"isrc": format!("ISRC{id}")})),
            external_urls: Some(json!({
                "spotify": format!("https://open.spotify.com/track/{id}")
            })),
            href: Some(format!("https://api.spotify.com/v1/tracks/{id}")),
            id: Some(id.to_string()),
            is_local: Some(false),
            name: Some(format!("Track {id}")),
            popularity: Some(42),
            preview_url: Some(format!("https://p.scdn.co/mp3-preview/{id}")),
            track_number: Some(4),
            type_tag: Some("track".to_string()),
            uri: Some(format!("spotify:track:{id}")),
        }),
        played_at: Some(played_at.to_string()),
        context: None,
    }
}

pub fn raw_artist(id: &str, name: &str) -> RawArtist {
    RawArtist {
        external_urls: Some(json!({
            "spotify": format!("https://open.spotify.com/artist/{id}")
        })),
        href: Some(format!("https://api.spotify.com/v1/artists/{id}")),
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        type_tag: Some("artist".to_string()),
        uri: Some(format!("spotify:artist:{id}")),
    }
}

pub fn raw_image(url: &str, height: Option<u32>) -> RawImage {
    RawImage {
        height,
        url: url.to_string(),
        width: height,
    }
}

/// Builds the normalized form of [`raw_event`].
pub fn normalized_event(id: &str, played_at: &str) -> NormalizedEvent {
    normalize(&[raw_event(id, played_at)])
        .expect("test event must normalize")
        .remove(0)
}

/// Builds a store holding `events` in the given order.
pub fn store_from_events(events: &[NormalizedEvent]) -> Store {
    let mut store = Store::default();
    for event in events {
        store.push_record(&event.to_record().expect("test event must encode"));
    }

    store
}

/// Returns the `id` column of every row, in store order.
pub fn store_ids(store: &Store) -> Vec<String> {
    (0..store.len())
        .map(|row| store.value(row, "id").unwrap_or_default().to_string())
        .collect()
}
