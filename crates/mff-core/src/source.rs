//! Push-style focus event source abstraction.

use crate::{FocusEvent, FollowResult};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// Handler invoked once per normalized focus change. May be called from a
/// host thread; implementations forward into the engine queue.
pub type FocusCallback = Box<dyn Fn(FocusEvent) + Send + Sync + 'static>;

/// Host focus-change notifications, normalized to global screen coordinates.
pub trait FocusEventSource {
    /// Register for notifications. Fails with `PermissionDenied` when the
    /// host refuses, or `Unsupported` when there is no host backend.
    fn start(&mut self, callback: FocusCallback) -> FollowResult<()>;

    /// Unregister. Safe to call any number of times.
    fn stop(&mut self);
}

/// Source fed from a channel: scripted sessions, replays, tests.
pub struct ChannelSource {
    rx: Option<Receiver<FocusEvent>>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ChannelSource {
    pub fn new(rx: Receiver<FocusEvent>) -> Self {
        Self {
            rx: Some(rx),
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl FocusEventSource for ChannelSource {
    fn start(&mut self, callback: FocusCallback) -> FollowResult<()> {
        let Some(rx) = self.rx.take() else {
            debug!("channel source already started");
            return Ok(());
        };

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        self.thread = Some(thread::spawn(move || {
            info!("Channel focus source started");
            while running.load(Ordering::SeqCst) {
                match rx.recv_timeout(Duration::from_millis(50)) {
                    Ok(event) => callback(event),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            running.store(false, Ordering::SeqCst);
            info!("Channel focus source exiting");
        }));
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ChannelSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point, WindowId};
    use crossbeam_channel::unbounded;
    use std::sync::Mutex;

    #[test]
    fn test_channel_source_forwards_in_order() {
        let (tx, rx) = unbounded();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut source = ChannelSource::new(rx);
        source
            .start(Box::new(move |ev| sink.lock().unwrap().push(ev.window_id)))
            .unwrap();

        for id in 1..=5 {
            tx.send(FocusEvent::new(WindowId(id), Point::new(0, 0), id, 1))
                .unwrap();
        }
        drop(tx);

        for _ in 0..100 {
            if !source.is_running() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        let ids: Vec<u64> = seen.lock().unwrap().iter().map(|w| w.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (_tx, rx) = unbounded::<FocusEvent>();
        let mut source = ChannelSource::new(rx);
        source.stop();
        source.start(Box::new(|_| {})).unwrap();
        source.stop();
        source.stop();
        assert!(!source.is_running());
    }
}
