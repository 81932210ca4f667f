//!
//! src/enrich.rs
//!
//! Best-effort secondary lookup for album-level metadata. One
//! attempt per track, every failure absorbed here.
//!

use tracing::warn;

use crate::fetch::Catalog;
use crate::types::{Enrichment, LabelInfo};

pub fn resolve(catalog: &dyn Catalog, album_id: Option<&str>) -> Enrichment {
    let Some(id) = album_id else {
        return Enrichment::NotAttempted;
    };
    match catalog.album(id) {
        Ok(album) => Enrichment::Resolved(LabelInfo::from_album(album)),
        Err(e) => {
            warn!(album = id, error = %e, "enrich.miss");
            Enrichment::Failed
        }
    }
}
