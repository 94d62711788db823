//! CSV sink for the export
//!
//! Semicolon-delimited, every field quoted, UTF-8. The header row comes
//! from the output contract and is written exactly once, before the
//! first record. The sink is flushed at every window boundary so a
//! fatal mid-run error never loses rows that were already emitted.

use crate::core::enrich::OutputRow;
use crate::domain::{CnpjError, Result};
use csv::{QuoteStyle, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};

pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows_written: u64,
}

impl CsvSink {
    /// Create the output file, truncating any previous export
    ///
    /// Parent directories are created as needed.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CnpjError::Output(format!(
                        "Cannot create output directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let file = File::create(&path).map_err(|e| {
            CnpjError::Output(format!("Cannot create output file {}: {e}", path.display()))
        })?;

        let writer = WriterBuilder::new()
            .delimiter(b';')
            .quote_style(QuoteStyle::Always)
            .has_headers(true)
            .from_writer(file);

        Ok(Self {
            writer,
            path,
            rows_written: 0,
        })
    }

    /// Append one window of output rows
    pub fn write_window(&mut self, rows: &[OutputRow]) -> Result<()> {
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.rows_written += rows.len() as u64;
        Ok(())
    }

    /// Flush buffered rows to disk
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
