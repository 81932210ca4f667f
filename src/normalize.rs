//!
//! src/normalize.rs
//!
//! Maps one raw playlist entry into a canonical TrackRecord.
//! Pure transforms only, no catalog calls.
//!

use crate::errors::ExportError;
use crate::types::{Enrichment, PlaylistItem, SOURCE_TAG, TrackRecord};

/// Convert milliseconds to M:SS, rounding to the nearest second.
/// Minutes are unbounded and unpadded, seconds always two digits.
pub fn format_duration(ms: u64) -> String {
    let total = (ms as f64 / 1000.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Build the partially-populated record for one entry. Returns
/// Ok(None) when the track payload is null (removed track, policy
/// skip); missing required sub-fields are fatal.
pub fn normalize(item: &PlaylistItem) -> Result<Option<TrackRecord>, ExportError> {
    let Some(track) = &item.track else {
        return Ok(None);
    };

    let artist = track.artists.first().map(|a| a.name.clone()).ok_or_else(|| {
        ExportError::Parse(format!(
            "track {} has no artists",
            track.id.as_deref().unwrap_or("<local>")
        ))
    })?;

    Ok(Some(TrackRecord {
        performer: artist.clone(),
        artist,
        title: track.name.clone(),
        album: track.album.name.clone(),
        duration: format_duration(track.duration_ms),
        duration_ms: track.duration_ms,
        fullpath: SOURCE_TAG.to_string(),
        spot_id: track.id.clone(),
        added_at: item.added_at.clone().unwrap_or_default(),
        track_number: None,
        album_id: track.album.id.clone(),
        enrichment: Enrichment::NotAttempted,
    }))
}
