//!
//! src/errors.rs
//!
//! Defines enums and methods of error conversion
//! for errors the exporter uses
//!
//!

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("config error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{} already exists", .0.display())]
    DestinationExists(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error)
}

impl From<reqwest::Error> for ExportError {
    fn from(e: reqwest::Error) -> Self { ExportError::Http(e.to_string()) }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self { ExportError::Parse(e.to_string()) }
}

impl From<serde_yaml::Error> for ExportError {
    fn from(e: serde_yaml::Error) -> Self { ExportError::Parse(e.to_string()) }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self { ExportError::Parse(e.to_string()) }
}
