//!
//! src/main.rs
//!
//! CLI boundary: argument parsing, the destination gate, and
//! dispatch into the export pipeline
//!

mod config;
mod errors;
mod logging;

mod aggregate;
mod enrich;
mod fetch;
mod normalize;
mod paginate;
mod restore;
mod sink;
mod types;

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::aggregate::{ExportOptions, TrackNumbering};
use crate::config::AppConfig;
use crate::errors::ExportError;
use crate::fetch::{Catalog, SpotifyClient};
use crate::paginate::PageIter;
use crate::sink::{CsvOptions, Schema};
use crate::types::TrackRecord;

#[derive(Parser)]
#[command(name = "pl-export", version, about = "Export a Spotify playlist as CSV, YAML, or JSON")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Snapshot a playlist into one or more artifacts
    Export(ExportArgs),
    /// List a user's playlists
    Playlists {
        /// Spotify id of the user
        user: String,
    },
    /// Create a playlist from a previously exported CSV
    Create(CreateArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Spotify id of the playlist
    playlist_id: String,
    /// name of CSV file to write
    #[arg(long)]
    csv: Option<PathBuf>,
    /// column schema for the CSV output
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4), default_value_t = 4)]
    format: u8,
    /// field delimiter for the CSV output
    #[arg(long, default_value_t = ',')]
    delimiter: char,
    /// do not add record labels
    #[arg(long)]
    nolabel: bool,
    /// do not write the header line
    #[arg(long)]
    noheader: bool,
    /// file listing row numbers to break after
    #[arg(long)]
    breaks: Option<PathBuf>,
    /// number tracks by raw playlist position, counting removed entries
    #[arg(long)]
    raw_numbering: bool,
    /// name of YAML file to write
    #[arg(long)]
    yaml: Option<PathBuf>,
    /// name of JSON file to write
    #[arg(long)]
    json: Option<PathBuf>,
    /// overwrite existing files
    #[arg(short, long)]
    overwrite: bool,
}

#[derive(Args)]
struct CreateArgs {
    /// name of the playlist to create
    #[arg(short, long)]
    playlist: String,
    /// description of the playlist
    #[arg(short, long, default_value = "")]
    description: String,
    /// name of CSV file to read
    #[arg(long)]
    csv: PathBuf,
}

fn main() -> Result<(), ExportError> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    let _guard = logging::init_logging(&cfg.logging)?;

    info!(version = %env!("CARGO_PKG_VERSION"), "pl-export.start");

    match cli.command {
        Command::Export(args) => run_export(&args, &cfg),
        Command::Playlists { user } => run_playlists(&user, &cfg),
        Command::Create(args) => run_create(&args, &cfg),
    }
}

/// Gate first, connect second: no destination may be clobbered and
/// no catalog traffic (the token exchange included) happens while
/// an un-overwritable file is in the way.
fn export_tracklist<C, F>(
    connect: F,
    destinations: &[PathBuf],
    overwrite: bool,
    playlist_id: &str,
    opts: &ExportOptions,
) -> Result<Vec<TrackRecord>, ExportError>
where
    C: Catalog,
    F: FnOnce() -> Result<C, ExportError>,
{
    sink::check_destinations(destinations, overwrite)?;
    let catalog = connect()?;
    aggregate::build_tracklist(&catalog, playlist_id, opts)
}

fn run_export(args: &ExportArgs, cfg: &AppConfig) -> Result<(), ExportError> {
    let destinations: Vec<PathBuf> = [&args.csv, &args.yaml, &args.json]
        .into_iter()
        .flatten()
        .cloned()
        .collect();
    if destinations.is_empty() {
        return Err(ExportError::Config(
            "must provide a csv, yaml, or json file name".to_string(),
        ));
    }
    if !args.delimiter.is_ascii() {
        return Err(ExportError::Config(format!(
            "delimiter must be a single ascii character, got {:?}", args.delimiter
        )));
    }

    let breaks = match (&args.csv, &args.breaks) {
        (Some(_), Some(path)) => sink::read_breaks(path)?,
        _ => BTreeSet::new(),
    };

    let opts = ExportOptions {
        with_labels: !args.nolabel,
        numbering: if args.raw_numbering {
            TrackNumbering::Raw
        } else {
            TrackNumbering::Normalized
        },
    };
    let records = export_tracklist(
        || SpotifyClient::connect(&cfg.http, &cfg.spotify),
        &destinations,
        args.overwrite,
        &args.playlist_id,
        &opts,
    )?;

    if let Some(path) = &args.csv {
        let csv_opts = CsvOptions {
            schema: Schema::from_number(args.format)?,
            delimiter: args.delimiter as u8,
            header: !args.noheader,
            nolabel: args.nolabel,
            breaks,
        };
        sink::write_csv(path, &records, &csv_opts)?;
    }
    if let Some(path) = &args.yaml {
        sink::write_yaml(path, &records)?;
    }
    if let Some(path) = &args.json {
        sink::write_json(path, &records)?;
    }
    Ok(())
}

fn run_playlists(user: &str, cfg: &AppConfig) -> Result<(), ExportError> {
    let client = SpotifyClient::connect(&cfg.http, &cfg.spotify)?;
    let first = client.user_playlists(user)?;
    for (idx, summary) in PageIter::new(first, |cursor| client.page(cursor)).enumerate() {
        let summary = summary?;
        println!("{:4} {} {}", idx + 1, summary.uri, summary.name);
    }
    Ok(())
}

fn run_create(args: &CreateArgs, cfg: &AppConfig) -> Result<(), ExportError> {
    let track_ids = restore::track_ids_from_csv(&args.csv)?;
    if track_ids.is_empty() {
        return Err(ExportError::Config(format!(
            "{} holds no track ids", args.csv.display()
        )));
    }
    let client = SpotifyClient::with_user_token(&cfg.http, &cfg.spotify)?;
    let playlist_id =
        restore::create_playlist(&client, &args.playlist, &args.description, &track_ids)?;
    println!("created playlist {playlist_id} with {} tracks", track_ids.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::StubCatalog;
    use crate::normalize::tests::raw_item;
    use std::fs;

    #[test]
    fn cli_parses_export_flags() {
        let cli = Cli::try_parse_from([
            "pl-export", "export", "37i9dQ", "--csv", "out.csv", "--format", "2",
            "--nolabel", "--noheader", "--breaks", "brk.txt", "-o",
        ])
        .unwrap();
        let Command::Export(args) = cli.command else {
            panic!("expected export subcommand");
        };
        assert_eq!(args.playlist_id, "37i9dQ");
        assert_eq!(args.format, 2);
        assert!(args.nolabel && args.noheader && args.overwrite);
        assert_eq!(args.delimiter, ',');
    }

    #[test]
    fn cli_rejects_unknown_format_numbers() {
        assert!(Cli::try_parse_from([
            "pl-export", "export", "37i9dQ", "--csv", "out.csv", "--format", "5",
        ])
        .is_err());
    }

    #[test]
    fn gate_fires_before_any_catalog_traffic() {
        let dir = tempfile::tempdir().unwrap();
        let taken = dir.path().join("out.csv");
        fs::write(&taken, "x").unwrap();

        let result = export_tracklist(
            || -> Result<StubCatalog, ExportError> {
                panic!("connect must not run when the gate fails")
            },
            &[taken.clone()],
            false,
            "pl1",
            &ExportOptions::default(),
        );
        assert!(matches!(result, Err(ExportError::DestinationExists(p)) if p == taken));
    }

    #[test]
    fn gate_passes_with_overwrite_and_export_runs() {
        let dir = tempfile::tempdir().unwrap();
        let taken = dir.path().join("out.csv");
        fs::write(&taken, "x").unwrap();

        let records = export_tracklist(
            || Ok(StubCatalog::new(vec![raw_item("id1", "Track 1", "Tame Impala")])),
            &[taken],
            true,
            "pl1",
            &ExportOptions::default(),
        )
        .unwrap();
        assert_eq!(records.len(), 1);
    }
}
