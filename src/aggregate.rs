//!
//! src/aggregate.rs
//!
//! Single-pass pipeline driver: paginate, normalize, enrich, in
//! catalog order. The returned list is never mutated afterwards.
//!

use tracing::{debug, info};

use crate::enrich;
use crate::errors::ExportError;
use crate::fetch::Catalog;
use crate::normalize::normalize;
use crate::paginate::PageIter;
use crate::types::TrackRecord;

/// Whether track numbers count every raw entry or only the ones
/// that survived normalization. Source tooling disagrees, so it
/// stays an explicit choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackNumbering {
    #[default]
    Normalized,
    Raw,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub with_labels: bool,
    pub numbering: TrackNumbering,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { with_labels: true, numbering: TrackNumbering::Normalized }
    }
}

/// Build the ordered tracklist for one playlist. The initial fetch
/// failing is fatal; so is any page fetch mid-stream.
pub fn build_tracklist(
    catalog: &dyn Catalog,
    playlist_id: &str,
    opts: &ExportOptions,
) -> Result<Vec<TrackRecord>, ExportError> {
    let first = catalog.playlist(playlist_id)?;
    info!(playlist = playlist_id, "aggregate.start");

    let mut records: Vec<TrackRecord> = Vec::new();
    let mut raw_seen: u32 = 0;
    for item in PageIter::new(first, |cursor| catalog.next_page(cursor)) {
        let item = item?;
        raw_seen += 1;

        let Some(mut record) = normalize(&item)? else {
            debug!(position = raw_seen, "aggregate.skip.null");
            continue;
        };
        record.track_number = Some(match opts.numbering {
            TrackNumbering::Normalized => records.len() as u32 + 1,
            TrackNumbering::Raw => raw_seen,
        });
        if opts.with_labels {
            record.enrichment = enrich::resolve(catalog, record.album_id.as_deref());
        }
        records.push(record);
    }

    info!(playlist = playlist_id, tracks = records.len(), "aggregate.done");
    Ok(records)
}
