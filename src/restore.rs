//!
//! src/restore.rs
//!
//! Rebuilds a remote playlist from a previously exported CSV.
//! Only id-bearing schemas can round-trip.
//!

use std::path::Path;

use tracing::info;

use crate::errors::ExportError;
use crate::fetch::SpotifyClient;

/// The catalog rejects more than 100 uris per add call
const ADD_CHUNK: usize = 100;

/// Collect the non-empty spot_id column. A missing header is fatal:
/// the file came from a schema that cannot round-trip.
pub fn track_ids_from_csv(path: &Path) -> Result<Vec<String>, ExportError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let column = headers
        .iter()
        .position(|h| h == "spot_id")
        .ok_or_else(|| ExportError::Parse(
            "csv file does not have a spot_id field".to_string()
        ))?;

    let mut ids = Vec::new();
    for row in reader.records() {
        let row = row?;
        // break rows and locally synthesized tracks have no id
        if let Some(id) = row.get(column)
            && !id.is_empty()
        {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

/// Create the playlist for the session's user and fill it in
/// catalog-sized chunks.
pub fn create_playlist(
    client: &SpotifyClient,
    name: &str,
    description: &str,
    track_ids: &[String],
) -> Result<String, ExportError> {
    let user = client.me()?;
    let playlist_id = client.create_playlist(&user, name, description)?;
    for chunk in track_ids.chunks(ADD_CHUNK) {
        client.add_items(&playlist_id, chunk)?;
    }
    info!(playlist = %playlist_id, tracks = track_ids.len(), "restore.done");
    Ok(playlist_id)
}
