//! Recording sink selection.
//!
//! A configured file is opened only once recording is actually on, and a
//! file that cannot be opened degrades to the in-memory ring.

use mff_core::{FollowConfig, FollowResult, JsonlFileSink, MemorySink, RecordEntry, RecordingSink};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

pub fn build_sink(config: &FollowConfig) -> Box<dyn RecordingSink> {
    let sink_config = &config.recording_sink;
    match &sink_config.file {
        None => Box::new(MemorySink::new(sink_config.capacity)),
        Some(path) if config.recording => open_or_memory(path, sink_config.capacity),
        Some(path) => {
            info!(?path, "Recording file will be opened when recording starts");
            Box::new(DeferredFileSink::new(path.clone(), sink_config.capacity))
        }
    }
}

fn open_or_memory(path: &Path, capacity: usize) -> Box<dyn RecordingSink> {
    match JsonlFileSink::open(path, capacity) {
        Ok(sink) => Box::new(sink),
        Err(e) => {
            warn!(?path, error = %e, "Failed to open recording file, recording to memory");
            Box::new(MemorySink::new(capacity))
        }
    }
}

/// Opens its file on the first recorded entry.
struct DeferredFileSink {
    path: PathBuf,
    capacity: usize,
    inner: Mutex<Option<Box<dyn RecordingSink>>>,
}

impl DeferredFileSink {
    fn new(path: PathBuf, capacity: usize) -> Self {
        Self {
            path,
            capacity,
            inner: Mutex::new(None),
        }
    }
}

impl RecordingSink for DeferredFileSink {
    fn record(&self, entry: &RecordEntry) -> FollowResult<()> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .get_or_insert_with(|| open_or_memory(&self.path, self.capacity))
            .record(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mff_core::{Decision, FocusEvent, Point, WindowId};

    fn entry() -> RecordEntry {
        let event = FocusEvent::new(WindowId(1), Point::new(5, 5), 0, 1);
        RecordEntry::new(event, Decision::Accepted, Some(Point::new(5, 5)), 0)
    }

    fn config(recording: bool, file: PathBuf) -> FollowConfig {
        let mut config = FollowConfig {
            recording,
            ..FollowConfig::default()
        };
        config.recording_sink.file = Some(file);
        config
    }

    #[test]
    fn test_unopenable_file_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let sink = build_sink(&config(true, blocker.join("focus.jsonl")));
        assert!(sink.record(&entry()).is_ok());
    }

    #[test]
    fn test_file_untouched_until_recording() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("focus.jsonl");

        let sink = build_sink(&config(false, path.clone()));
        assert!(!path.exists());

        sink.record(&entry()).unwrap();
        drop(sink);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
