//! Append-only CSV record sink
//!
//! Rows are `url, title, releaseYear, runningTime` with no header line, so
//! files written by earlier runs can be appended to and read back as-is.

use crate::storage::traits::{RecordSink, StorageResult};
use crate::storage::{ensure_parent_dir, PageRecord, StoredRecord};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// CSV file sink
pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvSink {
    /// Opens the CSV file for appending, creating it if needed
    ///
    /// A file whose last row lacks its line terminator (hand edits, a write
    /// cut short) is terminated first, so the next record starts a new row.
    pub fn new(path: &Path) -> StorageResult<Self> {
        ensure_parent_dir(path)?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        terminate_last_row(&mut file)?;

        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    /// Reads every row; unequal row lengths surface as a CSV error
    fn read_rows(&self) -> StorageResult<Vec<csv::StringRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(false)
            .from_path(&self.path)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            rows.push(result?);
        }
        Ok(rows)
    }
}

fn terminate_last_row(file: &mut File) -> StorageResult<()> {
    if file.metadata()?.len() == 0 {
        return Ok(());
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
    }
    Ok(())
}

impl RecordSink for CsvSink {
    fn load_urls(&self) -> StorageResult<Vec<String>> {
        Ok(self
            .read_rows()?
            .iter()
            .filter_map(|row| row.get(0))
            .map(str::to_string)
            .collect())
    }

    fn insert(&mut self, record: &PageRecord) -> StorageResult<()> {
        self.writer.write_record([
            record.url.as_str(),
            record.title.as_str(),
            record.release_year.as_str(),
            record.running_time.as_str(),
        ])?;
        self.writer.flush()?;
        Ok(())
    }

    fn count(&self) -> StorageResult<u64> {
        Ok(self.read_rows()?.len() as u64)
    }

    fn latest(&self) -> StorageResult<Option<StoredRecord>> {
        let rows = self.read_rows()?;
        Ok(rows.last().map(|row| {
            let field = |i: usize| row.get(i).unwrap_or_default().to_string();
            StoredRecord {
                url: field(0),
                title: field(1),
                release_year: field(2),
                running_time: field(3),
                created_at: None,
            }
        }))
    }
}
