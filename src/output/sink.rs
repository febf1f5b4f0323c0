//! Record sinks
//!
//! A sink receives each finished `ListingRecord` exactly once. Emission order
//! is whatever order detail extractions complete in; no cross-item ordering
//! is promised to consumers.

use crate::record::ListingRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

/// Errors that can occur during record emission
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink poisoned by a panicked writer")]
    Poisoned,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for record sinks
///
/// Implementations must be thread-safe; the driver emits from concurrent
/// detail-extraction tasks.
pub trait RecordSink: Send + Sync {
    /// Emits one finished record
    fn emit(&self, record: &ListingRecord) -> OutputResult<()>;

    /// Flushes and finalizes the sink at the end of a crawl
    fn finalize(&self) -> OutputResult<()>;
}

/// JSON-lines file sink: one record per line, fields in record order
pub struct JsonLinesSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    /// Creates (or truncates) the output file at `path`
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl RecordSink for JsonLinesSink {
    fn emit(&self, record: &ListingRecord) -> OutputResult<()> {
        let line = serde_json::to_string(record)?;
        let mut writer = self.writer.lock().map_err(|_| OutputError::Poisoned)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn finalize(&self) -> OutputResult<()> {
        let mut writer = self.writer.lock().map_err(|_| OutputError::Poisoned)?;
        writer.flush()?;
        Ok(())
    }
}

/// In-memory sink for tests
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<ListingRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything emitted so far
    pub fn records(&self) -> Vec<ListingRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl RecordSink for MemorySink {
    fn emit(&self, record: &ListingRecord) -> OutputResult<()> {
        self.records
            .lock()
            .map_err(|_| OutputError::Poisoned)?
            .push(record.clone());
        Ok(())
    }

    fn finalize(&self) -> OutputResult<()> {
        Ok(())
    }
}
