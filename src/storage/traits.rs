//! Storage traits and error types
//!
//! This module defines the trait interface for record sinks and
//! associated error types.

use crate::storage::{PageRecord, StoredRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record already stored for {0}")]
    DuplicateUrl(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for durable record sinks
///
/// A sink is append-only: records are written once and never updated or
/// deleted. Whatever it holds is the durable record of which pages have
/// already been processed, so reading it back must fail loudly rather than
/// skip entries it cannot understand.
pub trait RecordSink {
    /// Reads the URL of every stored record, in insertion order
    ///
    /// A missing or empty store yields an empty list.
    fn load_urls(&self) -> StorageResult<Vec<String>>;

    /// Appends a record and makes it durable before returning
    fn insert(&mut self, record: &PageRecord) -> StorageResult<()>;

    /// Counts stored records
    fn count(&self) -> StorageResult<u64>;

    /// Returns the most recently stored record, if any
    fn latest(&self) -> StorageResult<Option<StoredRecord>>;
}

impl<T: RecordSink + ?Sized> RecordSink for Box<T> {
    fn load_urls(&self) -> StorageResult<Vec<String>> {
        (**self).load_urls()
    }

    fn insert(&mut self, record: &PageRecord) -> StorageResult<()> {
        (**self).insert(record)
    }

    fn count(&self) -> StorageResult<u64> {
        (**self).count()
    }

    fn latest(&self) -> StorageResult<Option<StoredRecord>> {
        (**self).latest()
    }
}
