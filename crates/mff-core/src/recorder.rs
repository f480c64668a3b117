//! Diagnostics recording: append-only log of focus decisions.
//!
//! Sinks are best-effort. A full or unavailable sink reports
//! `SinkUnavailable` and the entry is dropped; the warp path never waits.

use crate::{FocusEvent, FollowError, FollowResult, Point};
use crossbeam_channel::{bounded, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, TryLockError};
use std::thread::{self, JoinHandle};
use time::OffsetDateTime;
use tracing::{debug, error, info};

/// What the engine did with a focus event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accepted,
    Suppressed,
    OutOfBounds,
    WarpFailed,
}

/// One recorded focus decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub event: FocusEvent,
    pub decision: Decision,
    /// The warp target, when a warp was attempted.
    pub warp_point: Option<Point>,
    /// Engine clock at decision time (ms).
    pub timestamp_ms: u64,
    /// Wall clock at decision time, for humans reading the log.
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

impl RecordEntry {
    pub fn new(
        event: FocusEvent,
        decision: Decision,
        warp_point: Option<Point>,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            event,
            decision,
            warp_point,
            timestamp_ms,
            recorded_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Destination for recorded entries.
pub trait RecordingSink: Send {
    fn record(&self, entry: &RecordEntry) -> FollowResult<()>;
}

impl<S: RecordingSink + ?Sized> RecordingSink for Box<S> {
    fn record(&self, entry: &RecordEntry) -> FollowResult<()> {
        (**self).record(entry)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RecordingSink for NullSink {
    fn record(&self, _entry: &RecordEntry) -> FollowResult<()> {
        Ok(())
    }
}

/// Bounded in-memory ring. Clones share the same buffer, so a log viewer can
/// hold one clone while the engine writes through another.
#[derive(Debug, Clone)]
pub struct MemorySink {
    capacity: usize,
    entries: Arc<Mutex<VecDeque<RecordEntry>>>,
}

impl MemorySink {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(4096)))),
        }
    }

    /// Snapshot of the buffered entries, oldest first.
    pub fn entries(&self) -> Vec<RecordEntry> {
        let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl RecordingSink for MemorySink {
    fn record(&self, entry: &RecordEntry) -> FollowResult<()> {
        // Never wait on a reader holding the lock.
        let mut guard = match self.entries.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                return Err(FollowError::SinkUnavailable("buffer busy".into()));
            }
        };
        if guard.len() >= self.capacity {
            guard.pop_front();
        }
        guard.push_back(entry.clone());
        Ok(())
    }
}

/// Appends entries as JSON lines from a background writer thread.
pub struct JsonlFileSink {
    path: PathBuf,
    tx: Option<Sender<RecordEntry>>,
    thread: Option<JoinHandle<()>>,
}

impl JsonlFileSink {
    /// Open (or create) `path` for appending. At most `capacity` entries
    /// wait for the writer; beyond that `record` drops.
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> FollowResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                info!(?parent, "Created recording directory");
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let (tx, rx) = bounded::<RecordEntry>(capacity.max(1));

        let writer_path = path.clone();
        let thread = thread::spawn(move || {
            debug!(path = ?writer_path, "Recording writer thread started");
            let mut out = BufWriter::new(file);
            while let Ok(entry) = rx.recv() {
                let mut batch = vec![entry];
                batch.extend(rx.try_iter());
                for entry in &batch {
                    if let Err(e) = write_line(&mut out, entry) {
                        error!(error = %e, "failed to write recording entry");
                    }
                }
                if let Err(e) = out.flush() {
                    error!(error = %e, "failed to flush recording file");
                }
            }
            debug!("Recording writer thread exiting");
        });

        info!(?path, "Recording to file");
        Ok(Self {
            path,
            tx: Some(tx),
            thread: Some(thread),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_line(out: &mut impl Write, entry: &RecordEntry) -> FollowResult<()> {
    serde_json::to_writer(&mut *out, entry)?;
    out.write_all(b"\n")?;
    Ok(())
}

impl RecordingSink for JsonlFileSink {
    fn record(&self, entry: &RecordEntry) -> FollowResult<()> {
        let Some(tx) = self.tx.as_ref() else {
            return Err(FollowError::SinkUnavailable("writer closed".into()));
        };
        match tx.try_send(entry.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(FollowError::SinkUnavailable("queue full".into())),
            Err(TrySendError::Disconnected(_)) => {
                Err(FollowError::SinkUnavailable("writer stopped".into()))
            }
        }
    }
}

impl Drop for JsonlFileSink {
    fn drop(&mut self) {
        // Closing the channel lets the writer drain and flush before exit.
        drop(self.tx.take());
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WindowId;

    fn entry(n: i32, decision: Decision) -> RecordEntry {
        let event = FocusEvent::new(WindowId(n as u64), Point::new(n, n), n as u64, 7);
        RecordEntry::new(event, decision, Some(Point::new(n, n)), n as u64)
    }

    #[test]
    fn test_memory_sink_evicts_oldest() {
        let sink = MemorySink::new(2);
        sink.record(&entry(1, Decision::Accepted)).unwrap();
        sink.record(&entry(2, Decision::Suppressed)).unwrap();
        sink.record(&entry(3, Decision::OutOfBounds)).unwrap();

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event.point, Point::new(2, 2));
        assert_eq!(entries[1].decision, Decision::OutOfBounds);
    }

    #[test]
    fn test_memory_sink_clones_share_buffer() {
        let sink = MemorySink::new(8);
        let viewer = sink.clone();
        sink.record(&entry(1, Decision::Accepted)).unwrap();
        assert_eq!(viewer.len(), 1);
        viewer.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_memory_sink_busy_drops_instead_of_blocking() {
        let sink = MemorySink::new(8);
        let _guard = sink.entries.lock().unwrap();
        let err = sink.record(&entry(1, Decision::Accepted)).unwrap_err();
        assert!(matches!(err, FollowError::SinkUnavailable(_)));
    }

    #[test]
    fn test_entry_json_shape() {
        let json = serde_json::to_value(entry(5, Decision::OutOfBounds)).unwrap();
        assert_eq!(json["decision"], "out_of_bounds");
        assert_eq!(json["warp_point"]["x"], 5);
        assert!(json["recorded_at"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_jsonl_file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("focus.jsonl");

        {
            let sink = JsonlFileSink::open(&path, 16).unwrap();
            sink.record(&entry(1, Decision::Accepted)).unwrap();
            sink.record(&entry(2, Decision::Suppressed)).unwrap();
        }
        {
            let sink = JsonlFileSink::open(&path, 16).unwrap();
            sink.record(&entry(3, Decision::WarpFailed)).unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<RecordEntry> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].decision, Decision::Suppressed);
        assert_eq!(lines[2].event.window_id, WindowId(3));
    }
}
