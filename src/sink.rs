//! Append-only record stores
//!
//! Every sink persists one record per `append` and flushes before returning,
//! so an aborted run leaves everything written so far intact.

use anyhow::{Context, Result};
use clap::ValueEnum;
use rusqlite::Connection;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::types::DeedRecord;

pub trait OutputSink {
    fn append(&mut self, record: &DeedRecord) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line
    Json,
    Csv,
    Sqlite,
}

impl OutputFormat {
    pub fn default_path(&self) -> &'static str {
        match self {
            OutputFormat::Json => "results.jsonl",
            OutputFormat::Csv => "results.csv",
            OutputFormat::Sqlite => "results.db",
        }
    }
}

/// Open the sink for `format`, appending to whatever is already at `path`
pub fn open_sink(format: OutputFormat, path: &Path) -> Result<Box<dyn OutputSink>> {
    Ok(match format {
        OutputFormat::Json => Box::new(JsonLinesSink::open(path)?),
        OutputFormat::Csv => Box::new(CsvSink::open(path)?),
        OutputFormat::Sqlite => Box::new(SqliteSink::open(path)?),
    })
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn append(&mut self, record: &DeedRecord) -> Result<()> {
        (**self).append(record)
    }
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open output: {}", path.display()))
}

pub struct JsonLinesSink {
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            writer: BufWriter::new(open_append(path)?),
        })
    }
}

impl OutputSink for JsonLinesSink {
    fn append(&mut self, record: &DeedRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

pub struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    pub fn open(path: &Path) -> Result<Self> {
        let file = open_append(path)?;
        // Header only at the top of a fresh file, not again on resumed runs
        let is_empty = file.metadata()?.len() == 0;
        let writer = csv::WriterBuilder::new()
            .has_headers(is_empty)
            .from_writer(file);
        Ok(Self { writer })
    }
}

impl OutputSink for CsvSink {
    fn append(&mut self, record: &DeedRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        Ok(())
    }
}

pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        init_database(&conn)?;
        Ok(Self { conn })
    }
}

pub fn init_database(conn: &Connection) -> Result<()> {
    let schema = include_str!("../schema.sql");
    conn.execute_batch(schema)?;
    Ok(())
}

impl OutputSink for SqliteSink {
    fn append(&mut self, record: &DeedRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO deeds (date, type, book, page_num, doc_num, city, description, cost, street_address, state, zip)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                &record.date,
                &record.document_type,
                &record.book,
                &record.page_number,
                &record.document_number,
                &record.city,
                &record.raw_description,
                &record.cost,
                &record.street_address,
                &record.state,
                &record.zip,
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn record(doc_num: &str, cost: Option<f64>) -> DeedRecord {
        DeedRecord {
            date: "01/02/2020".to_string(),
            document_type: "DEED".to_string(),
            book: "25012".to_string(),
            page_number: "118".to_string(),
            document_number: doc_num.to_string(),
            city: "TAUNTON".to_string(),
            raw_description: "12 ELM ST, $ 250000".to_string(),
            cost,
            street_address: Some("12 ELM ST".to_string()),
            state: None,
            zip: None,
        }
    }

    #[test]
    fn test_json_lines_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");

        JsonLinesSink::open(&path)
            .unwrap()
            .append(&record("1", Some(250000.0)))
            .unwrap();
        JsonLinesSink::open(&path)
            .unwrap()
            .append(&record("2", None))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<DeedRecord> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines, vec![record("1", Some(250000.0)), record("2", None)]);
    }

    #[test]
    fn test_csv_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&record("1", Some(1.0))).unwrap();
        drop(sink);
        CsvSink::open(&path)
            .unwrap()
            .append(&record("2", None))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date,type,book,page_num,doc_num,city,description"));
        assert_eq!(content.matches("date,type").count(), 1);
    }

    #[test]
    fn test_sqlite_inserts_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.db");

        let mut sink = SqliteSink::open(&path).unwrap();
        sink.append(&record("1", Some(250000.0))).unwrap();
        sink.append(&record("2", None)).unwrap();

        let conn = Connection::open(&path).unwrap();
        let rows: Vec<(String, Option<f64>)> = conn
            .prepare("SELECT doc_num, cost FROM deeds ORDER BY id")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(
            rows,
            vec![("1".to_string(), Some(250000.0)), ("2".to_string(), None)]
        );
    }
}
