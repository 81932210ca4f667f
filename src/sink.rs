//!
//! src/sink.rs
//!
//! Output encoders. Every sink consumes the same finished
//! tracklist; none of them drop or reorder records.
//!

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::errors::ExportError;
use crate::types::TrackRecord;

/// Marker dropped into the duration column of a break row
const BREAK_MARK: &str = "!";

/// The four legacy column layouts downstream tooling expects. A
/// schema is a projection: fields the record lacks render empty,
/// record fields outside it are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// format 1: noburn pass-1 input
    Classic,
    /// format 2: what noburn pass 1 would emit
    Extended,
    /// format 3: format 1 plus the catalog track id
    ClassicId,
    /// format 4: format 2 plus catalog id and added_at
    ExtendedId,
}

impl Schema {
    pub fn from_number(n: u8) -> Result<Self, ExportError> {
        match n {
            1 => Ok(Schema::Classic),
            2 => Ok(Schema::Extended),
            3 => Ok(Schema::ClassicId),
            4 => Ok(Schema::ExtendedId),
            other => Err(ExportError::Config(format!("unknown format {other}"))),
        }
    }

    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Schema::Classic => &["performer", "title", "album", "duration"],
            Schema::Extended => &[
                "title", "duration", "performer", "album", "released",
                "label", "composer", "notes",
            ],
            Schema::ClassicId => &["title", "duration", "performer", "album", "spot_id"],
            Schema::ExtendedId => &[
                "title", "duration", "performer", "album", "released",
                "label", "composer", "notes", "spot_id", "added_at",
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub schema: Schema,
    pub delimiter: u8,
    pub header: bool,
    pub nolabel: bool,
    /// 1-based row indices to insert a break row after; indices
    /// past the end are a no-op
    pub breaks: BTreeSet<usize>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            schema: Schema::ExtendedId,
            delimiter: b',',
            header: true,
            nolabel: false,
            breaks: BTreeSet::new(),
        }
    }
}

fn cell(record: &TrackRecord, field: &str, nolabel: bool) -> String {
    match field {
        "artist" => record.artist.clone(),
        "performer" => record.performer.clone(),
        "title" => record.title.clone(),
        "album" => record.album.clone(),
        "duration" => record.duration.clone(),
        "spot_id" => record.spot_id.clone().unwrap_or_default(),
        "added_at" => record.added_at.clone(),
        "released" => record
            .label_info()
            .and_then(|info| info.released.clone())
            .unwrap_or_default(),
        "label" if nolabel => String::new(),
        "label" => record
            .label_info()
            .and_then(|info| info.label.clone())
            .unwrap_or_default(),
        // composer, notes, anything a future schema adds
        _ => String::new(),
    }
}

/// Delimited artifact: python csv "unix dialect" compatible, every
/// field quoted, newline terminated.
pub fn write_csv(
    path: &Path,
    records: &[TrackRecord],
    opts: &CsvOptions,
) -> Result<(), ExportError> {
    let fields = opts.schema.fields();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(opts.delimiter)
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(BufWriter::new(File::create(path)?));

    if opts.header {
        writer.write_record(fields)?;
    }

    for (idx, record) in records.iter().enumerate() {
        writer.write_record(fields.iter().map(|f| cell(record, f, opts.nolabel)))?;
        if opts.breaks.contains(&(idx + 1)) {
            writer.write_record(
                fields.iter().map(|f| if *f == "duration" { BREAK_MARK } else { "" }),
            )?;
        }
    }
    writer.flush()?;
    info!(path = %path.display(), rows = records.len(), "sink.csv.done");
    Ok(())
}

/// Hierarchical text dump: explicit document marker, then the full
/// sequence. Non-ASCII passes through verbatim.
pub fn write_yaml(path: &Path, records: &[TrackRecord]) -> Result<(), ExportError> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(b"---\n")?;
    serde_yaml::to_writer(&mut file, &records)?;
    file.flush()?;
    info!(path = %path.display(), rows = records.len(), "sink.yaml.done");
    Ok(())
}

/// Machine dump: one JSON array, 1-space indent, non-ASCII left
/// unescaped.
pub fn write_json(path: &Path, records: &[TrackRecord]) -> Result<(), ExportError> {
    let mut file = BufWriter::new(File::create(path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut file, formatter);
    records.serialize(&mut serializer)?;
    file.flush()?;
    info!(path = %path.display(), rows = records.len(), "sink.json.done");
    Ok(())
}

/// Cost-avoidance gate: every requested destination is checked
/// before the first catalog call. An existing directory blocks
/// even with overwrite on.
pub fn check_destinations(paths: &[PathBuf], overwrite: bool) -> Result<(), ExportError> {
    for path in paths {
        if path.exists() && !(overwrite && path.is_file()) {
            return Err(ExportError::DestinationExists(path.clone()));
        }
    }
    Ok(())
}

/// One integer per line; anything that does not parse is ignored.
pub fn read_breaks(path: &Path) -> Result<BTreeSet<usize>, ExportError> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .filter_map(|line| line.trim().parse::<usize>().ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::{resolved, sample_record};

    fn labeled_records(n: usize) -> Vec<TrackRecord> {
        (1..=n)
            .map(|i| {
                let mut record = sample_record(&format!("Track {i}"));
                record.spot_id = Some(format!("id{i}"));
                record.enrichment = resolved("Modular", "2020-02-14");
                record
            })
            .collect()
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn classic_schema_writes_quote_all_unix_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pl.csv");
        let opts = CsvOptions { schema: Schema::Classic, ..Default::default() };
        write_csv(&path, &labeled_records(1), &opts).unwrap();
        assert_eq!(
            read(&path),
            "\"performer\",\"title\",\"album\",\"duration\"\n\
             \"Tame Impala\",\"Track 1\",\"The Slow Rush\",\"4:33\"\n"
        );
    }

    #[test]
    fn extended_schema_projects_missing_fields_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pl.csv");
        let opts = CsvOptions {
            schema: Schema::ExtendedId,
            header: false,
            ..Default::default()
        };
        write_csv(&path, &labeled_records(1), &opts).unwrap();
        // composer and notes have no record counterpart
        assert_eq!(
            read(&path),
            "\"Track 1\",\"4:33\",\"Tame Impala\",\"The Slow Rush\",\"2020\",\
             \"Modular\",\"\",\"\",\"id1\",\"2024-03-01T00:00:00Z\"\n"
        );
    }

    #[test]
    fn break_rows_land_after_their_indices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pl.csv");
        let opts = CsvOptions {
            schema: Schema::Classic,
            breaks: BTreeSet::from([2, 5]),
            ..Default::default()
        };
        write_csv(&path, &labeled_records(6), &opts).unwrap();

        let text = read(&path);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9); // header + 6 rows + 2 breaks
        assert_eq!(lines[3], "\"\",\"\",\"\",\"!\"");
        assert_eq!(lines[7], "\"\",\"\",\"\",\"!\"");
        assert!(lines[4].contains("Track 3"));
        assert!(lines[8].contains("Track 6"));
    }

    #[test]
    fn out_of_range_break_index_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pl.csv");
        let opts = CsvOptions {
            schema: Schema::Classic,
            header: false,
            breaks: BTreeSet::from([40]),
            ..Default::default()
        };
        write_csv(&path, &labeled_records(2), &opts).unwrap();
        assert_eq!(read(&path).lines().count(), 2);
    }

    #[test]
    fn nolabel_blanks_the_label_column_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pl.csv");
        let opts = CsvOptions {
            schema: Schema::Extended,
            header: false,
            nolabel: true,
            ..Default::default()
        };
        write_csv(&path, &labeled_records(1), &opts).unwrap();
        let text = read(&path);
        assert!(!text.contains("Modular"));
        // released survives nolabel
        assert!(text.contains("\"2020\""));
    }

    #[test]
    fn delimiter_is_configurable_and_embedded_quotes_escape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pl.tsv");
        let mut record = sample_record("Say \"Hi\"");
        record.spot_id = None;
        let opts = CsvOptions {
            schema: Schema::ClassicId,
            header: false,
            delimiter: b'\t',
            ..Default::default()
        };
        write_csv(&path, &[record], &opts).unwrap();
        assert_eq!(
            read(&path),
            "\"Say \"\"Hi\"\"\"\t\"4:33\"\t\"Tame Impala\"\t\"The Slow Rush\"\t\"\"\n"
        );
    }

    #[test]
    fn csv_output_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.csv");
        let second = dir.path().join("b.csv");
        let records = labeled_records(5);
        let opts = CsvOptions::default();
        write_csv(&first, &records, &opts).unwrap();
        write_csv(&second, &records, &opts).unwrap();
        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }

    #[test]
    fn yaml_dump_has_document_marker_and_verbatim_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pl.yaml");
        let mut records = labeled_records(2);
        records[0].title = "Björk — Jóga".to_string();
        write_yaml(&path, &records).unwrap();
        let text = read(&path);
        assert!(text.starts_with("---\n"));
        assert!(text.contains("Björk"));
        assert!(text.contains("label: Modular"));
    }

    #[test]
    fn json_dump_uses_one_space_indent_without_escapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pl.json");
        let mut records = labeled_records(1);
        records[0].artist = "Sigur Rós".to_string();
        write_json(&path, &records).unwrap();
        let text = read(&path);
        assert!(text.starts_with("[\n {\n  \"artist\": \"Sigur Rós\""));
        assert!(!text.contains("\\u"));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
    }

    #[test]
    fn destination_gate_blocks_existing_files_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join("new.csv");
        let taken = dir.path().join("old.csv");
        fs::write(&taken, "x").unwrap();

        assert!(check_destinations(&[fresh.clone()], false).is_ok());
        assert!(matches!(
            check_destinations(&[fresh.clone(), taken.clone()], false),
            Err(ExportError::DestinationExists(p)) if p == taken
        ));
        assert!(check_destinations(&[fresh, taken], true).is_ok());

        // a directory in the way is never overwritable
        let blocked = dir.path().to_path_buf();
        assert!(check_destinations(&[blocked], true).is_err());
    }

    #[test]
    fn break_file_ignores_non_numeric_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("breaks.txt");
        fs::write(&path, "2\nnot a number\n\n 5 \n7x\n9\n").unwrap();
        assert_eq!(read_breaks(&path).unwrap(), BTreeSet::from([2, 5, 9]));
    }
}
