//! Keeps the focus source running, retrying while host permission is missing.

use mff_core::{FocusCallback, FocusEventSource, FollowError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// Not started yet, or refused and waiting to retry.
    Waiting,
    Running,
    /// No backend on this host.
    Unavailable,
}

pub struct FocusSupervisor<S> {
    source: S,
    make_callback: Box<dyn Fn() -> FocusCallback>,
    state: SourceState,
    retry_every: Duration,
    last_attempt: Option<Instant>,
    refusals: u32,
}

impl<S: FocusEventSource> FocusSupervisor<S> {
    pub fn new(
        source: S,
        make_callback: impl Fn() -> FocusCallback + 'static,
        retry_every: Duration,
    ) -> Self {
        Self {
            source,
            make_callback: Box::new(make_callback),
            state: SourceState::Waiting,
            retry_every,
            last_attempt: None,
            refusals: 0,
        }
    }

    pub fn state(&self) -> SourceState {
        self.state
    }

    /// Start the source if it is not running. After a refusal, a new attempt
    /// is made only once `trusted` reports access and `retry_every` passed.
    pub fn poll(&mut self, trusted: impl FnOnce() -> bool) -> SourceState {
        if self.state != SourceState::Waiting {
            return self.state;
        }
        if let Some(last) = self.last_attempt {
            if last.elapsed() < self.retry_every || !trusted() {
                return self.state;
            }
        }

        self.last_attempt = Some(Instant::now());
        match self.source.start((self.make_callback)()) {
            Ok(()) => {
                info!(after_refusals = self.refusals, "Focus source started");
                self.state = SourceState::Running;
            }
            Err(FollowError::PermissionDenied(msg)) => {
                if self.refusals == 0 {
                    error!("Focus tracking disabled until access is granted: {msg}");
                } else {
                    debug!("Focus source still refused: {msg}");
                }
                self.refusals += 1;
            }
            Err(FollowError::Unsupported(what)) => {
                error!("Focus tracking unavailable on this platform: {what}");
                self.state = SourceState::Unavailable;
            }
            Err(e) => warn!("Focus source failed to start, will retry: {e}"),
        }
        self.state
    }

    pub fn stop(&mut self) {
        self.source.stop();
        if self.state == SourceState::Running {
            self.state = SourceState::Waiting;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mff_core::{FocusEvent, FollowResult, Point, WindowId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Refuses the first `refuse` starts, then hands events to the callback.
    struct FlakySource {
        refuse: usize,
        attempts: Arc<AtomicUsize>,
        callback: Arc<Mutex<Option<FocusCallback>>>,
    }

    impl FocusEventSource for FlakySource {
        fn start(&mut self, callback: FocusCallback) -> FollowResult<()> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if n < self.refuse {
                return Err(FollowError::PermissionDenied("not trusted".into()));
            }
            *self.callback.lock().unwrap() = Some(callback);
            Ok(())
        }

        fn stop(&mut self) {
            self.callback.lock().unwrap().take();
        }
    }

    fn flaky(refuse: usize) -> (FlakySource, Arc<AtomicUsize>, Arc<Mutex<Option<FocusCallback>>>) {
        let attempts = Arc::new(AtomicUsize::new(0));
        let callback = Arc::new(Mutex::new(None));
        let source = FlakySource {
            refuse,
            attempts: attempts.clone(),
            callback: callback.clone(),
        };
        (source, attempts, callback)
    }

    #[test]
    fn test_refused_then_started_once_trusted() {
        let (source, attempts, callback) = flaky(1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut supervisor = FocusSupervisor::new(
            source,
            move || {
                let sink = sink.clone();
                Box::new(move |ev: FocusEvent| sink.lock().unwrap().push(ev.window_id))
            },
            Duration::ZERO,
        );

        assert_eq!(supervisor.poll(|| false), SourceState::Waiting);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);

        // Still untrusted: no new attempt.
        assert_eq!(supervisor.poll(|| false), SourceState::Waiting);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);

        assert_eq!(supervisor.poll(|| true), SourceState::Running);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);

        let cb = callback.lock().unwrap();
        (cb.as_ref().unwrap())(FocusEvent::new(WindowId(9), Point::new(1, 1), 0, 1));
        assert_eq!(*seen.lock().unwrap(), vec![WindowId(9)]);
    }

    #[test]
    fn test_retry_waits_for_interval() {
        let (source, attempts, _callback) = flaky(1);
        let mut supervisor = FocusSupervisor::new(
            source,
            || Box::new(|_: FocusEvent| {}),
            Duration::from_secs(3600),
        );

        supervisor.poll(|| true);
        supervisor.poll(|| true);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(supervisor.state(), SourceState::Waiting);
    }

    #[test]
    fn test_unsupported_is_not_retried() {
        struct NoBackend(Arc<AtomicUsize>);

        impl FocusEventSource for NoBackend {
            fn start(&mut self, _callback: FocusCallback) -> FollowResult<()> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(FollowError::Unsupported("focus notifications".into()))
            }
            fn stop(&mut self) {}
        }

        let attempts = Arc::new(AtomicUsize::new(0));
        let mut supervisor = FocusSupervisor::new(
            NoBackend(attempts.clone()),
            || Box::new(|_: FocusEvent| {}),
            Duration::ZERO,
        );
        assert_eq!(supervisor.poll(|| true), SourceState::Unavailable);
        assert_eq!(supervisor.poll(|| true), SourceState::Unavailable);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
