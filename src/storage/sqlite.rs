//! SQLite record sink
//!
//! This module provides a SQLite-based implementation of the RecordSink trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordSink, StorageError, StorageResult};
use crate::storage::{ensure_parent_dir, PageRecord, StoredRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;

/// SQLite sink backend
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Creates a new SqliteSink instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        ensure_parent_dir(path)?;
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl RecordSink for SqliteSink {
    fn load_urls(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM films ORDER BY id")?;
        let urls = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }

    fn insert(&mut self, record: &PageRecord) -> StorageResult<()> {
        let result = self.conn.execute(
            "INSERT INTO films (film_name, year_released, url, running_time, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.title,
                record.release_year,
                record.url.as_str(),
                record.running_time,
                record.fetched_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::DuplicateUrl(record.url.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM films", [], |row| row.get(0))?;
        u64::try_from(count).map_err(|e| StorageError::Database(e.to_string()))
    }

    fn latest(&self) -> StorageResult<Option<StoredRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT url, film_name, year_released, running_time, created_at
                 FROM films ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    let created_at: String = row.get(4)?;
                    Ok(StoredRecord {
                        url: row.get(0)?,
                        title: row.get(1)?,
                        release_year: row.get(2)?,
                        running_time: row.get(3)?,
                        created_at: parse_timestamp(&created_at),
                    })
                },
            )
            .optional()?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::normalize_url;
    use tempfile::TempDir;
    use url::Url;

    fn record(path: &str, title: &str) -> PageRecord {
        let site = Url::parse("http://www.imdb.com").unwrap();
        PageRecord {
            url: normalize_url(path, &site).unwrap(),
            title: title.to_string(),
            release_year: "(2008)".to_string(),
            running_time: "2h 32min".to_string(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_in_memory() {
        let sink = SqliteSink::new_in_memory();
        assert!(sink.is_ok());
    }

    #[test]
    fn test_insert_and_count() {
        let mut sink = SqliteSink::new_in_memory().unwrap();
        sink.insert(&record("/title/tt1/", "First")).unwrap();
        sink.insert(&record("/title/tt2/", "Second")).unwrap();

        assert_eq!(sink.count().unwrap(), 2);
        assert_eq!(
            sink.load_urls().unwrap(),
            vec![
                "http://www.imdb.com/title/tt1/".to_string(),
                "http://www.imdb.com/title/tt2/".to_string(),
            ]
        );
    }

    #[test]
    fn test_duplicate_url_rejected() {
        let mut sink = SqliteSink::new_in_memory().unwrap();
        sink.insert(&record("/title/tt1/", "First")).unwrap();

        let err = sink.insert(&record("/title/tt1/?ref_=x", "Again")).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateUrl(url) if url == "http://www.imdb.com/title/tt1/"));
        assert_eq!(sink.count().unwrap(), 1);
    }

    #[test]
    fn test_latest_record() {
        let mut sink = SqliteSink::new_in_memory().unwrap();
        assert!(sink.latest().unwrap().is_none());

        let second = record("/title/tt2/", "Second");
        sink.insert(&record("/title/tt1/", "First")).unwrap();
        sink.insert(&second).unwrap();

        let latest = sink.latest().unwrap().unwrap();
        assert_eq!(latest.title, "Second");
        assert_eq!(latest.url, "http://www.imdb.com/title/tt2/");
        assert_eq!(
            latest.created_at.map(|t| t.timestamp()),
            Some(second.fetched_at.timestamp())
        );
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("films.db");

        {
            let mut sink = SqliteSink::new(&path).unwrap();
            sink.insert(&record("/title/tt1/", "First")).unwrap();
        }

        let sink = SqliteSink::new(&path).unwrap();
        assert_eq!(sink.count().unwrap(), 1);
    }
}
