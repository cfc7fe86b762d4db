use serde::Serialize;

use crate::error::PlaylogResult;
use crate::types::played_at::PlayedAt;
use crate::types::store::Record;

/// Column holding the play timestamp.
pub const PLAYED_AT_COLUMN: &str = "played_at";

/// Artist reference kept in normalized events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Reduced album object with a single cover image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Album {
    pub album_type: Option<String>,
    pub artists: Vec<ArtistRef>,
    pub id: Option<String>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub release_date_precision: Option<String>,
    pub total_tracks: Option<u32>,
}

/// Flat projection of a raw event.
///
/// Fields that were absent on the raw event stay `None` and produce no column, so a source that
/// starts sending a field later grows the store schema instead of rewriting old rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub album: Option<Album>,
    pub artists: Option<Vec<ArtistRef>>,
    pub disc_number: Option<u32>,
    pub duration_ms: Option<u64>,
    pub explicit: Option<bool>,
    pub id: String,
    pub name: Option<String>,
    pub popularity: Option<u32>,
    pub track_number: Option<u32>,
    pub played_at: PlayedAt,
}

impl NormalizedEvent {
    /// Renders the event as an ordered record of string cells.
    ///
    /// Nested values are encoded as JSON and booleans as `True`/`False`.
    pub fn to_record(&self) -> PlaylogResult<Record> {
        let mut record = Record::default();

        if let Some(album) = &self.album {
            record.push("album", Some(serde_json::to_string(album)?));
        }
        if let Some(artists) = &self.artists {
            record.push("artists", Some(serde_json::to_string(artists)?));
        }
        push_display(&mut record, "disc_number", self.disc_number);
        push_display(&mut record, "duration_ms", self.duration_ms);
        if let Some(explicit) = self.explicit {
            record.push("explicit", Some(format_bool(explicit)));
        }
        record.push("id", Some(self.id.clone()));
        if let Some(name) = &self.name {
            record.push("name", Some(name.clone()));
        }
        push_display(&mut record, "popularity", self.popularity);
        push_display(&mut record, "track_number", self.track_number);
        record.push(PLAYED_AT_COLUMN, Some(self.played_at.as_str().to_string()));

        Ok(record)
    }

    /// Returns the track name or the track id when the name is unknown.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

fn push_display<T: ToString>(record: &mut Record, column: &str, value: Option<T>) {
    if let Some(value) = value {
        record.push(column, Some(value.to_string()));
    }
}

fn format_bool(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}
