//!
//! src/logging.rs
//!
//! Initializes the tracing subscriber so the exporter gives
//! informative output while running
//!

use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tracing_error::ErrorLayer;
use tracing_appender::non_blocking;

use crate::config::{LogFormat, LoggingConfig};

pub struct LoggingGuard(tracing_appender::non_blocking::WorkerGuard);

// stderr keeps structured logs out of the playlist listing on stdout
pub fn init_logging(cfg: &LoggingConfig) ->
    Result<LoggingGuard, crate::errors::ExportError> {

    let (writer, guard) = non_blocking(std::io::stderr());
    let filter = std::env::var("RUST_LOG")
        .ok()
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(cfg.filter_directives.clone()));

    let time = tracing_subscriber::fmt::time::UtcTime::rfc_3339();
    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_timer(time)
        .with_target(cfg.include_target)
        .with_file(cfg.include_file_line)
        .with_line_number(cfg.include_file_line);

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default());

    match cfg.format {
        LogFormat::Json => registry
            .with(fmt_layer
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(true))
            .init(),
        LogFormat::Pretty => registry.with(fmt_layer).init(),
    }
    Ok( LoggingGuard(guard) )
}
