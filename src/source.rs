//! # Record Source
//!
//! Sequential producers of [`RawUserRecord`]s. The pipeline pulls one record at
//! a time through a single cursor; sources never look ahead.

use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::{BTreeMap, VecDeque};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::columns;
use crate::error::{MigrationError, Result};
use crate::models::RawUserRecord;

/// Sequential stream of source records
#[async_trait]
pub trait RecordSource: Send {
    /// Next record, `Some(Err)` for an unreadable row, `None` once exhausted
    async fn next_record(&mut self) -> Option<Result<RawUserRecord>>;
}

/// Reject anything that is not a `.csv` file before any processing starts
pub fn validate_csv_path(path: &Path) -> Result<()> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        Ok(())
    } else {
        Err(MigrationError::invalid_input(format!(
            "Invalid input file '{}'. Please provide a CSV file",
            path.display()
        )))
    }
}

/// CSV-backed record source; the first row names the columns
pub struct CsvRecordSource<R: Read + Send = File> {
    reader: csv::Reader<R>,
    headers: StringRecord,
    path: Option<PathBuf>,
    rows_read: usize,
    exhausted: bool,
}

impl CsvRecordSource<File> {
    /// Open and validate a CSV export
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        validate_csv_path(path)?;

        let reader = Self::builder().from_path(path)?;
        let mut source = Self::from_csv_reader(reader)?;
        source.path = Some(path.to_path_buf());

        debug!(
            path = %path.display(),
            columns = source.headers.len(),
            "Opened CSV record source"
        );
        Ok(source)
    }
}

impl<R: Read + Send> CsvRecordSource<R> {
    /// Read CSV data from any reader, e.g. an in-memory buffer
    pub fn from_reader(reader: R) -> Result<Self> {
        Self::from_csv_reader(Self::builder().from_reader(reader))
    }

    fn builder() -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder.has_headers(true).trim(Trim::All).flexible(false);
        builder
    }

    fn from_csv_reader(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers = reader.headers()?.clone();

        for required in columns::REQUIRED {
            if !headers.iter().any(|header| header == *required) {
                return Err(MigrationError::invalid_input(format!(
                    "CSV header is missing required column '{required}'"
                )));
            }
        }

        Ok(Self {
            reader,
            headers,
            path: None,
            rows_read: 0,
            exhausted: false,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Data rows read so far, including unreadable ones
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    fn to_record(&self, row: &StringRecord) -> Result<RawUserRecord> {
        let columns: BTreeMap<String, String> = self
            .headers
            .iter()
            .zip(row.iter())
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect();

        RawUserRecord::from_columns(columns).map_err(|e| {
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            MigrationError::invalid_input(format!("line {line}: {e}"))
        })
    }
}

#[async_trait]
impl<R: Read + Send> RecordSource for CsvRecordSource<R> {
    async fn next_record(&mut self) -> Option<Result<RawUserRecord>> {
        if self.exhausted {
            return None;
        }

        let mut row = StringRecord::new();
        match self.reader.read_record(&mut row) {
            Ok(true) => {
                self.rows_read += 1;
                Some(self.to_record(&row))
            }
            Ok(false) => {
                self.exhausted = true;
                None
            }
            Err(e) => {
                self.rows_read += 1;
                // The underlying stream cannot be resumed after an IO failure
                if e.is_io_error() {
                    self.exhausted = true;
                }
                Some(Err(e.into()))
            }
        }
    }
}

/// In-memory record source
#[derive(Debug, Default)]
pub struct VecRecordSource {
    records: VecDeque<RawUserRecord>,
}

impl VecRecordSource {
    pub fn new(records: Vec<RawUserRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }
}

impl From<Vec<RawUserRecord>> for VecRecordSource {
    fn from(records: Vec<RawUserRecord>) -> Self {
        Self::new(records)
    }
}

#[async_trait]
impl RecordSource for VecRecordSource {
    async fn next_record(&mut self) -> Option<Result<RawUserRecord>> {
        self.records.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    async fn drain<S: RecordSource>(source: &mut S) -> Vec<Result<RawUserRecord>> {
        let mut out = Vec::new();
        while let Some(record) = source.next_record().await {
            out.push(record);
        }
        out
    }

    #[test]
    fn test_validate_csv_path() {
        assert!(validate_csv_path(Path::new("users.csv")).is_ok());
        assert!(validate_csv_path(Path::new("/tmp/USERS.CSV")).is_ok());
        assert!(matches!(
            validate_csv_path(Path::new("users.json")),
            Err(MigrationError::InvalidInput(_))
        ));
        assert!(validate_csv_path(Path::new("users")).is_err());
    }

    #[tokio::test]
    async fn test_reads_records_in_order_and_skips_blank_lines() {
        let data = "loyalty_user_id,current_tier,created_at,updated_at,email\n\
                    u1,GOLD,2024-01-01,2024-01-02,a@x.io\n\
                    \n\
                    u2,SILVER,2024-02-01,2024-02-02,b@x.io\n";
        let mut source = CsvRecordSource::from_reader(Cursor::new(data)).unwrap();

        let records: Vec<_> = drain(&mut source)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].loyalty_user_id, "u1");
        assert_eq!(records[0].current_tier, "GOLD");
        assert_eq!(records[0].get("email"), Some("a@x.io"));
        assert_eq!(records[1].loyalty_user_id, "u2");
        assert_eq!(source.rows_read(), 2);
        assert!(source.next_record().await.is_none());
    }

    #[tokio::test]
    async fn test_bad_rows_are_reported_without_stopping_the_stream() {
        let data = "loyalty_user_id,current_tier\n\
                    u1,GOLD\n\
                    u2,SILVER,EXTRA\n\
                    ,BRONZE\n\
                    u4,GOLD\n";
        let mut source = CsvRecordSource::from_reader(Cursor::new(data)).unwrap();

        let results = drain(&mut source).await;
        assert_eq!(results.len(), 4);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(MigrationError::Csv(_))));
        assert!(matches!(results[2], Err(MigrationError::InvalidInput(_))));
        assert_eq!(results[3].as_ref().unwrap().loyalty_user_id, "u4");
    }

    #[test]
    fn test_missing_identifier_column_is_rejected() {
        let data = "user,current_tier\nu1,GOLD\n";
        let result = CsvRecordSource::from_reader(Cursor::new(data));
        assert!(matches!(result, Err(MigrationError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_open_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "loyalty_user_id\nu1\nu2").unwrap();

        let mut source = CsvRecordSource::open(file.path()).unwrap();
        assert_eq!(source.path(), Some(file.path()));
        assert_eq!(drain(&mut source).await.len(), 2);
    }

    #[test]
    fn test_open_rejects_wrong_extension() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(matches!(
            CsvRecordSource::open(file.path()),
            Err(MigrationError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_vec_source() {
        let mut source = VecRecordSource::from(vec![RawUserRecord::new("a"), RawUserRecord::new("b")]);
        let ids: Vec<_> = drain(&mut source)
            .await
            .into_iter()
            .map(|r| r.unwrap().loyalty_user_id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
