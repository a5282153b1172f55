//! CsvSink: durable per-session log of samples.
//!
//! One destination per session, named from the session start time. The
//! header is `Timestamp` followed by the label order fixed at open time;
//! every row carries one field per fixed label, empty when the reading is
//! absent or null. Labels that show up later but were not in the header
//! are never written.
//!
//! A failed row write closes the sink and is reported once. The caller
//! logs it and keeps acquiring; later writes are silent no-ops.

use crate::error::{ObdVisError, Result, ResultExt};
use crate::types::Sample;
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Calendar format of the timestamp column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format used in destination file names
const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Collision suffixes tried before giving up
const MAX_NAME_ATTEMPTS: u32 = 1000;

type RowWriter = csv::Writer<Box<dyn Write + Send>>;

/// Shortest round-trip text for a reading, always with a decimal point
pub fn format_number(value: f64) -> String {
    format!("{:?}", value)
}

/// CsvSink: writes each sample as one delimited row.
pub struct CsvSink {
    directory: PathBuf,
    file_prefix: String,
    writer: Option<RowWriter>,
    path: Option<PathBuf>,
    labels: Vec<String>,
    rows_written: u64,
}

impl std::fmt::Debug for CsvSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvSink")
            .field("directory", &self.directory)
            .field("path", &self.path)
            .field("labels", &self.labels)
            .field("open", &self.writer.is_some())
            .field("rows_written", &self.rows_written)
            .finish()
    }
}

impl CsvSink {
    /// Sink that creates destinations under `directory`
    pub fn new(directory: impl Into<PathBuf>, file_prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_prefix: file_prefix.into(),
            writer: None,
            path: None,
            labels: Vec::new(),
            rows_written: 0,
        }
    }

    /// Close any prior destination and open a fresh timestamped file
    ///
    /// Returns the path of the new destination.
    pub fn open(&mut self, labels: &[String]) -> Result<PathBuf> {
        self.close();

        fs::create_dir_all(&self.directory).with_context(|| {
            format!("Failed to create log directory {:?}", self.directory)
        })?;
        let (path, file) = self.create_destination(Local::now())?;

        self.open_with_writer(labels, Box::new(file))?;
        tracing::info!("CsvSink opened file: {:?}", path);
        self.path = Some(path.clone());
        Ok(path)
    }

    /// Open the sink over an arbitrary writer
    ///
    /// Writes the header immediately; on failure the sink stays closed.
    pub fn open_with_writer(
        &mut self,
        labels: &[String],
        writer: Box<dyn Write + Send>,
    ) -> Result<()> {
        self.close();

        let mut writer = csv::Writer::from_writer(writer);
        let header = std::iter::once("Timestamp").chain(labels.iter().map(String::as_str));
        writer.write_record(header)?;
        writer.flush()?;

        self.writer = Some(writer);
        self.labels = labels.to_vec();
        self.rows_written = 0;
        Ok(())
    }

    /// Write one row for `sample`; a no-op when closed
    ///
    /// On failure the sink closes itself and the error is returned once.
    pub fn write(&mut self, sample: &Sample) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };

        let mut row = Vec::with_capacity(self.labels.len() + 1);
        row.push(sample.timestamp.format(TIMESTAMP_FORMAT).to_string());
        for label in &self.labels {
            row.push(sample.reading(label).map(format_number).unwrap_or_default());
        }

        let result = writer
            .write_record(&row)
            .and_then(|_| writer.flush().map_err(csv::Error::from));

        match result {
            Ok(()) => {
                self.rows_written += 1;
                Ok(())
            }
            Err(e) => {
                tracing::error!("CsvSink write failed, closing {:?}: {}", self.path, e);
                self.close();
                Err(ObdVisError::Persistence(e.to_string()))
            }
        }
    }

    /// Flush and release the destination; safe to call when closed
    pub fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                tracing::warn!("CsvSink flush on close failed: {}", e);
            }
            tracing::info!(
                "CsvSink closed {:?} after {} rows",
                self.path,
                self.rows_written
            );
        }
        self.path = None;
        self.labels.clear();
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Current destination path, if opened from a file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Fixed label order of the open session
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Rows written since the last open
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    fn create_destination(&self, at: DateTime<Local>) -> Result<(PathBuf, fs::File)> {
        let stem = format!("{}_{}", self.file_prefix, at.format(FILE_STAMP_FORMAT));
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{}.csv", stem)
            } else {
                format!("{}_{}.csv", stem, attempt)
            };
            let path = self.directory.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(ObdVisError::from(e).with_context(format!(
                        "Failed to create {:?}",
                        path
                    )))
                }
            }
        }
        Err(ObdVisError::Persistence(format!(
            "No free file name for {} in {:?}",
            stem, self.directory
        )))
    }
}

impl Drop for CsvSink {
    fn drop(&mut self) {
        self.close();
    }
}
