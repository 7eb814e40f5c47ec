//! Storage module for persisting extracted records
//!
//! This module handles the durable record sinks, including:
//! - Append-only CSV output (`url, title, releaseYear, runningTime`)
//! - SQLite output with a `films` table and idempotent schema creation
//! - Reading stored URLs back so a new run knows what was already processed

mod csv_sink;
mod schema;
mod sqlite;
mod traits;

pub use csv_sink::CsvSink;
pub use sqlite::SqliteSink;
pub use traits::{RecordSink, StorageError, StorageResult};

use crate::config::{OutputConfig, SinkKind};
use crate::url::NormalizedUrl;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Opens the record sink selected by the output configuration
///
/// # Arguments
///
/// * `config` - Output configuration naming the sink kind and path
///
/// # Returns
///
/// * `Ok(Box<dyn RecordSink>)` - Sink ready for reading and appending
/// * `Err(StorageError)` - The sink could not be opened or created
pub fn open_sink(config: &OutputConfig) -> StorageResult<Box<dyn RecordSink>> {
    let path = Path::new(&config.sink_path);
    match config.sink {
        SinkKind::Csv => Ok(Box::new(CsvSink::new(path)?)),
        SinkKind::Sqlite => Ok(Box::new(SqliteSink::new(path)?)),
    }
}

/// Creates the parent directory of a sink file if it does not exist yet
pub(crate) fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// A record extracted from one page, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub url: NormalizedUrl,
    pub title: String,
    pub release_year: String,
    pub running_time: String,
    pub fetched_at: DateTime<Utc>,
}

/// A record as read back from a sink
///
/// The CSV layout has no timestamp column, so `created_at` is only known
/// for the SQLite sink.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub url: String,
    pub title: String,
    pub release_year: String,
    pub running_time: String,
    pub created_at: Option<DateTime<Utc>>,
}
