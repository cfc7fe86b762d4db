//! Projection of raw source events onto the flat store schema.
//!
//! The projection is an allow-list: only the fields named here are copied, so volatile source
//! fields (markets, links, URIs, preview URLs, type tags) never reach the store.

use crate::bail;
use crate::error::{ErrorKind, PlaylogResult};
use crate::types::{
    Album, ArtistRef, NormalizedEvent, PlayedAt, RawAlbum, RawArtist, RawEvent, RawImage,
};

/// Normalizes a batch of raw events, preserving order.
///
/// Fails for the whole batch when any event lacks its `played_at` or its track identity.
pub fn normalize(raw_events: &[RawEvent]) -> PlaylogResult<Vec<NormalizedEvent>> {
    raw_events
        .iter()
        .enumerate()
        .map(|(position, raw)| normalize_event(position, raw))
        .collect()
}

fn normalize_event(position: usize, raw: &RawEvent) -> PlaylogResult<NormalizedEvent> {
    let Some(raw_played_at) = raw.played_at.as_deref() else {
        bail!(
            ErrorKind::MissingField,
            "Raw event has no played_at",
            format!("event {position}")
        );
    };

    let played_at = match PlayedAt::parse(raw_played_at) {
        Ok(played_at) => played_at,
        Err(err) => bail!(
            ErrorKind::InvalidTimestamp,
            "Raw event has an invalid played_at",
            format!("event {position}: `{raw_played_at}`: {err}")
        ),
    };

    let Some(track) = raw.track.as_ref() else {
        bail!(
            ErrorKind::MissingField,
            "Raw event has no track",
            format!("event {position} played at {played_at}")
        );
    };

    let Some(id) = track.id.clone() else {
        bail!(
            ErrorKind::MissingField,
            "Raw event track has no id",
            format!("event {position} played at {played_at}")
        );
    };

    Ok(NormalizedEvent {
        album: track.album.as_ref().map(project_album),
        artists: track.artists.as_deref().map(project_artists),
        disc_number: track.disc_number,
        duration_ms: track.duration_ms,
        explicit: track.explicit,
        id,
        name: track.name.clone(),
        popularity: track.popularity,
        track_number: track.track_number,
        played_at,
    })
}

fn project_album(album: &RawAlbum) -> Album {
    Album {
        album_type: album.album_type.clone(),
        artists: project_artists(&album.artists),
        id: album.id.clone(),
        image: select_image(&album.images).map(|image| image.url.clone()),
        name: album.name.clone(),
        release_date: album.release_date.clone(),
        release_date_precision: album.release_date_precision.clone(),
        total_tracks: album.total_tracks,
    }
}

fn project_artists(artists: &[RawArtist]) -> Vec<ArtistRef> {
    artists
        .iter()
        .map(|artist| ArtistRef {
            id: artist.id.clone(),
            name: artist.name.clone(),
        })
        .collect()
}

/// Picks the tallest image. The first one wins ties and a missing height counts as zero.
fn select_image(images: &[RawImage]) -> Option<&RawImage> {
    images.iter().fold(None, |best: Option<&RawImage>, image| match best {
        Some(current) if current.height.unwrap_or(0) >= image.height.unwrap_or(0) => Some(current),
        _ => Some(image),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::event::{raw_event, raw_image};

    #[test]
    fn keeps_batch_order() {
        let raw = vec![
            raw_event("t2", "2024-01-02T00:00:00Z"),
            raw_event("t1", "2024-01-01T00:00:00Z"),
            raw_event("t3", "2024-01-03T00:00:00Z"),
        ];

        let ids: Vec<_> = normalize(&raw)
            .unwrap()
            .into_iter()
            .map(|event| event.id)
            .collect();

        assert_eq!(ids, vec!["t2", "t1", "t3"]);
    }

    #[test]
    fn selects_tallest_image() {
        let mut raw = raw_event("t1", "2024-01-01T00:00:00Z");
        let album = raw.track.as_mut().unwrap().album.as_mut().unwrap();
        album.images = vec![
            raw_image("small", Some(64)),
            raw_image("large", Some(640)),
            raw_image("medium", Some(300)),
        ];

        let event = &normalize(&[raw]).unwrap()[0];

        assert_eq!(event.album.as_ref().unwrap().image.as_deref(), Some("large"));
    }

    #[test]
    fn first_image_wins_height_ties() {
        let images = vec![
            raw_image("first", Some(300)),
            raw_image("second", Some(300)),
            raw_image("unknown", None),
        ];

        assert_eq!(select_image(&images).unwrap().url, "first");
    }

    #[test]
    fn image_without_height_is_still_chosen_when_alone() {
        let images = vec![raw_image("only", None)];

        assert_eq!(select_image(&images).unwrap().url, "only");
    }

    #[test]
    fn no_images_gives_null_image() {
        let mut raw = raw_event("t1", "2024-01-01T00:00:00Z");
        raw.track.as_mut().unwrap().album.as_mut().unwrap().images.clear();

        let event = &normalize(&[raw]).unwrap()[0];

        assert_eq!(event.album.as_ref().unwrap().image, None);
    }

    #[test]
    fn artists_are_reduced_to_id_and_name() {
        let raw = raw_event("t1", "2024-01-01T00:00:00Z");

        let event = &normalize(&[raw]).unwrap()[0];
        let record = event.to_record().unwrap();

        let artists = record.get("artists").unwrap();
        assert_eq!(artists, r#"[{"id":"artist-t1","name":"Artist t1"}]"#);
        let album = record.get("album").unwrap();
        assert!(!album.contains("external_urls"));
        assert!(!album.contains("available_markets"));
        assert!(!album.contains("uri"));
    }

    #[test]
    fn volatile_fields_never_become_columns() {
        let raw = raw_event("t1", "2024-01-01T00:00:00Z");

        let record = normalize(&[raw]).unwrap()[0].to_record().unwrap();
        let columns: Vec<_> = record.columns().collect();

        for volatile in [
            "available_markets",
            "is_local",
            "type",
            "uri",
            "href",
            "external_urls",
            "external_ids",
            "preview_url",
        ] {
            assert!(!columns.contains(&volatile), "{volatile} leaked into the record");
        }
    }

    #[test]
    fn missing_played_at_fails_whole_batch() {
        let mut broken = raw_event("t2", "2024-01-02T00:00:00Z");
        broken.played_at = None;
        let raw = vec![raw_event("t1", "2024-01-01T00:00:00Z"), broken];

        let err = normalize(&raw).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert_eq!(err.detail(), Some("event 1"));
    }

    #[test]
    fn missing_track_id_is_a_schema_error() {
        let mut raw = raw_event("t1", "2024-01-01T00:00:00Z");
        raw.track.as_mut().unwrap().id = None;

        let err = normalize(&[raw]).unwrap_err();

        assert_eq!(err.class(), crate::error::ErrorClass::Schema);
    }

    #[test]
    fn missing_track_is_a_schema_error() {
        let mut raw = raw_event("t1", "2024-01-01T00:00:00Z");
        raw.track = None;

        assert_eq!(normalize(&[raw]).unwrap_err().kind(), ErrorKind::MissingField);
    }

    #[test]
    fn unparseable_played_at_is_a_schema_error() {
        let raw = raw_event("t1", "not a timestamp");

        let err = normalize(&[raw]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidTimestamp);
        assert_eq!(err.class(), crate::error::ErrorClass::Schema);
    }

    #[test]
    fn absent_optional_fields_are_omitted() {
        let mut raw = raw_event("t1", "2024-01-01T00:00:00Z");
        let track = raw.track.as_mut().unwrap();
        track.popularity = None;
        track.album = None;

        let event = &normalize(&[raw]).unwrap()[0];
        let record = event.to_record().unwrap();

        assert!(record.get("popularity").is_none());
        assert!(!record.columns().any(|column| column == "album"));
    }
}
