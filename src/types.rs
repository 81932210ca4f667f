//!
//! src/types.rs
//!
//! Wire shapes returned by the catalog plus the canonical
//! track record every serializer consumes
//!

use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};

/// Provenance tag stamped on every exported record
pub const SOURCE_TAG: &str = "spotify";

/// One page of a cursor-paged collection. `next` is an opaque
/// cursor (a full URL for this catalog), null on the last page.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default)]
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

/// GET /playlists/{id} response, only the track collection matters here
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistResponse {
    pub tracks: Page<PlaylistItem>,
}

/// One playlist entry. `track` is null when the underlying
/// catalog item was removed.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    pub added_at: Option<String>,
    pub track: Option<RawTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTrack {
    pub id: Option<String>,
    pub name: String,
    pub duration_ms: u64,
    pub artists: Vec<RawArtist>,
    pub album: RawAlbum,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAlbum {
    pub id: Option<String>,
    pub name: String,
}

/// GET /albums/{id} payload for the secondary lookup
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumDetail {
    pub label: Option<String>,
    pub release_date: Option<String>,
    pub release_date_precision: Option<String>,
}

/// GET /users/{user}/playlists item, for the listing subcommand
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistSummary {
    pub uri: String,
    pub name: String,
}

/// Album metadata attached by a successful secondary lookup.
/// `released` is derived from `release_date`, never supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelInfo {
    pub label: Option<String>,
    pub release_date: Option<String>,
    pub release_date_precision: Option<String>,
    pub released: Option<String>,
}

impl LabelInfo {
    pub fn from_album(album: AlbumDetail) -> Self {
        let released = album.release_date
            .as_deref()
            .map(|d| d.chars().take(4).collect());
        Self {
            label: album.label,
            release_date: album.release_date,
            release_date_precision: album.release_date_precision,
            released,
        }
    }
}

/// Outcome of the secondary lookup for one track
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Enrichment {
    #[default]
    NotAttempted,
    Failed,
    Resolved(LabelInfo),
}

/// Canonical record for one playlist entry, in catalog order.
/// Every output encoding projects from this one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    pub artist: String,
    pub performer: String,
    pub title: String,
    pub album: String,
    pub duration: String,
    pub duration_ms: u64,
    pub fullpath: String,
    pub spot_id: Option<String>,
    pub added_at: String,
    pub track_number: Option<u32>,
    pub album_id: Option<String>,
    pub enrichment: Enrichment,
}

impl TrackRecord {
    pub fn label_info(&self) -> Option<&LabelInfo> {
        match &self.enrichment {
            Enrichment::Resolved(info) => Some(info),
            _ => None,
        }
    }
}

// Hand-rolled so the hierarchical dumps keep a stable field order
// and only carry label fields when enrichment resolved.
impl Serialize for TrackRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("artist", &self.artist)?;
        map.serialize_entry("performer", &self.performer)?;
        map.serialize_entry("title", &self.title)?;
        map.serialize_entry("album", &self.album)?;
        map.serialize_entry("duration", &self.duration)?;
        map.serialize_entry("fullpath", &self.fullpath)?;
        if let Some(id) = &self.spot_id {
            map.serialize_entry("spot_id", id)?;
        }
        map.serialize_entry("added_at", &self.added_at)?;
        if let Some(n) = self.track_number {
            map.serialize_entry("track_number", &n)?;
        }
        if let Some(info) = self.label_info() {
            map.serialize_entry("label", &info.label)?;
            map.serialize_entry("released", &info.released)?;
            map.serialize_entry("release_date", &info.release_date)?;
            map.serialize_entry("release_date_precision", &info.release_date_precision)?;
        }
        map.end()
    }
}
