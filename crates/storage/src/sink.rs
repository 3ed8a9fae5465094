use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use rankwatch_core::{Event, EventSink, SourceError};

/// Appends events to a JSON-lines file, one event per line.
///
/// Opened in append mode on every call. No deduplication happens here.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<File, SourceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?)
    }
}

impl EventSink for JsonLinesSink {
    fn persist(&mut self, events: &[Event]) -> Result<usize, SourceError> {
        if events.is_empty() {
            return Ok(0);
        }
        let mut writer = BufWriter::new(self.open()?);
        for event in events {
            serde_json::to_writer(&mut writer, event)
                .map_err(|e| SourceError::Serialize(e.to_string()))?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        info!(path = %self.path.display(), events = events.len(), "events persisted");
        Ok(events.len())
    }
}

/// Read back a JSON-lines event file.
pub fn read_events(path: &Path) -> Result<Vec<Event>, crate::StorageError> {
    let raw = fs::read_to_string(path)?;
    raw.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).map_err(crate::StorageError::from))
        .collect()
}
