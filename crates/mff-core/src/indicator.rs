//! Transient on-screen marker at the warp target.
//!
//! The presenter owns one timer thread. Each `show` creates an independent
//! marker that fades out over the configured duration and is then removed;
//! later shows never cancel earlier countdowns. Dropping the presenter
//! removes whatever is still on screen.

use crate::{IndicatorConfig, IndicatorRequest};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Identifier of one marker on a [`MarkerSurface`].
pub type MarkerId = u64;

/// Something that can draw markers (a borderless overlay window, a UI
/// layer, a log line).
pub trait MarkerSurface: Send {
    /// Put a marker of diameter `size` on screen at full opacity.
    fn create(&mut self, id: MarkerId, request: &IndicatorRequest, size: u32);
    fn set_opacity(&mut self, id: MarkerId, opacity: f32);
    fn remove(&mut self, id: MarkerId);
}

/// Anything the engine can hand an indicator request to.
pub trait IndicatorTrigger: Send {
    fn show(&self, request: IndicatorRequest);

    /// Change size/timing for markers shown from now on.
    fn reconfigure(&self, _config: IndicatorConfig) {}
}

impl<F> IndicatorTrigger for F
where
    F: Fn(IndicatorRequest) + Send,
{
    fn show(&self, request: IndicatorRequest) {
        self(request)
    }
}

#[derive(Debug)]
enum PresenterCommand {
    Show(IndicatorRequest),
    Reconfigure(IndicatorConfig),
    Shutdown,
}

/// Cloneable handle the engine uses to request markers.
#[derive(Debug, Clone)]
pub struct PresenterTrigger {
    cmd_tx: Sender<PresenterCommand>,
}

impl IndicatorTrigger for PresenterTrigger {
    fn show(&self, request: IndicatorRequest) {
        match self.cmd_tx.try_send(PresenterCommand::Show(request)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("indicator queue full, marker skipped"),
            Err(TrySendError::Disconnected(_)) => debug!("indicator presenter stopped"),
        }
    }

    fn reconfigure(&self, config: IndicatorConfig) {
        if self.cmd_tx.send(PresenterCommand::Reconfigure(config)).is_err() {
            debug!("indicator presenter stopped");
        }
    }
}

/// Owner of the marker timer thread.
pub struct IndicatorPresenter {
    cmd_tx: Sender<PresenterCommand>,
    thread: Option<JoinHandle<()>>,
}

impl IndicatorPresenter {
    pub fn spawn<S: MarkerSurface + 'static>(surface: S, config: IndicatorConfig) -> Self {
        let (cmd_tx, cmd_rx) = bounded(64);
        let thread = thread::spawn(move || {
            TimerLoop::new(surface, config).run(cmd_rx);
        });
        Self {
            cmd_tx,
            thread: Some(thread),
        }
    }

    /// Show a marker. Returns immediately.
    pub fn show(&self, request: IndicatorRequest) {
        self.trigger().show(request);
    }

    /// Change size/duration for markers shown from now on.
    pub fn reconfigure(&self, config: IndicatorConfig) {
        self.trigger().reconfigure(config);
    }

    pub fn trigger(&self) -> PresenterTrigger {
        PresenterTrigger {
            cmd_tx: self.cmd_tx.clone(),
        }
    }
}

impl Drop for IndicatorPresenter {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(PresenterCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

struct LiveMarker {
    id: MarkerId,
    shown_at: Instant,
    duration: Duration,
    tick: Duration,
    next_tick: Instant,
}

impl LiveMarker {
    fn expires_at(&self) -> Instant {
        self.shown_at + self.duration
    }

    fn next_deadline(&self) -> Instant {
        self.next_tick.min(self.expires_at())
    }

    fn opacity_at(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.shown_at).as_secs_f32();
        let total = self.duration.as_secs_f32().max(f32::EPSILON);
        (1.0 - elapsed / total).clamp(0.0, 1.0)
    }
}

struct TimerLoop<S> {
    surface: S,
    config: IndicatorConfig,
    markers: Vec<LiveMarker>,
    next_id: MarkerId,
}

impl<S: MarkerSurface> TimerLoop<S> {
    fn new(surface: S, config: IndicatorConfig) -> Self {
        Self {
            surface,
            config,
            markers: Vec::new(),
            next_id: 1,
        }
    }

    fn run(mut self, cmd_rx: Receiver<PresenterCommand>) {
        info!("Indicator timer thread started");

        loop {
            let cmd = match self.markers.iter().map(LiveMarker::next_deadline).min() {
                None => cmd_rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                Some(deadline) => {
                    cmd_rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                }
            };

            match cmd {
                Ok(PresenterCommand::Show(request)) => self.show(request),
                Ok(PresenterCommand::Reconfigure(config)) => self.config = config,
                Ok(PresenterCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }

            self.advance(Instant::now());
        }

        for marker in self.markers.drain(..) {
            self.surface.remove(marker.id);
        }
        info!("Indicator timer thread exiting");
    }

    fn show(&mut self, request: IndicatorRequest) {
        let id = self.next_id;
        self.next_id += 1;

        let now = Instant::now();
        let tick = Duration::from_millis(self.config.tick_ms.max(1));
        debug!(id, point = %request.point, "showing indicator");
        self.surface.create(id, &request, self.config.size);
        self.markers.push(LiveMarker {
            id,
            shown_at: now,
            duration: Duration::from_millis(self.config.duration_ms),
            tick,
            next_tick: now + tick,
        });
    }

    fn advance(&mut self, now: Instant) {
        let surface = &mut self.surface;
        self.markers.retain_mut(|marker| {
            if now >= marker.expires_at() {
                surface.remove(marker.id);
                return false;
            }
            if now >= marker.next_tick {
                surface.set_opacity(marker.id, marker.opacity_at(now));
                while marker.next_tick <= now {
                    marker.next_tick += marker.tick;
                }
            }
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, DisplayId, Point};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(MarkerId, Point, u32),
        Opacity(MarkerId, f32),
        Remove(MarkerId),
    }

    #[derive(Clone, Default)]
    struct RecordingSurface {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl RecordingSurface {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn removed(&self) -> Vec<MarkerId> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Remove(id) => Some(id),
                    _ => None,
                })
                .collect()
        }
    }

    impl MarkerSurface for RecordingSurface {
        fn create(&mut self, id: MarkerId, request: &IndicatorRequest, size: u32) {
            self.calls.lock().unwrap().push(Call::Create(id, request.point, size));
        }
        fn set_opacity(&mut self, id: MarkerId, opacity: f32) {
            self.calls.lock().unwrap().push(Call::Opacity(id, opacity));
        }
        fn remove(&mut self, id: MarkerId) {
            self.calls.lock().unwrap().push(Call::Remove(id));
        }
    }

    fn request(x: i32, y: i32) -> IndicatorRequest {
        IndicatorRequest {
            point: Point::new(x, y),
            color: Color::new(255, 0, 0),
            display: DisplayId(0),
        }
    }

    fn config(duration_ms: u64, tick_ms: u64) -> IndicatorConfig {
        IndicatorConfig {
            duration_ms,
            tick_ms,
            ..IndicatorConfig::default()
        }
    }

    #[test]
    fn test_marker_fades_and_is_removed() {
        let surface = RecordingSurface::default();
        let presenter = IndicatorPresenter::spawn(surface.clone(), config(100, 20));

        presenter.show(request(10, 20));
        thread::sleep(Duration::from_millis(300));

        let calls = surface.calls();
        assert_eq!(calls.first(), Some(&Call::Create(1, Point::new(10, 20), 40)));
        assert_eq!(calls.last(), Some(&Call::Remove(1)));

        let opacities: Vec<f32> = calls
            .iter()
            .filter_map(|c| match c {
                Call::Opacity(_, o) => Some(*o),
                _ => None,
            })
            .collect();
        assert!(!opacities.is_empty());
        assert!(opacities.windows(2).all(|w| w[0] >= w[1]));
        drop(presenter);
    }

    #[test]
    fn test_overlapping_markers_keep_their_own_lifetime() {
        let surface = RecordingSurface::default();
        let presenter = IndicatorPresenter::spawn(surface.clone(), config(400, 50));

        presenter.show(request(1, 1));
        thread::sleep(Duration::from_millis(150));
        presenter.show(request(2, 2));
        thread::sleep(Duration::from_millis(330));

        // First marker has expired, second is still on screen.
        assert_eq!(surface.removed(), vec![1]);

        thread::sleep(Duration::from_millis(300));
        assert_eq!(surface.removed(), vec![1, 2]);
    }

    #[test]
    fn test_drop_removes_outstanding_markers() {
        let surface = RecordingSurface::default();
        let presenter = IndicatorPresenter::spawn(surface.clone(), config(10_000, 1_000));

        presenter.show(request(5, 5));
        presenter.show(request(6, 6));
        drop(presenter);

        let mut removed = surface.removed();
        removed.sort();
        assert_eq!(removed, vec![1, 2]);
    }

    #[test]
    fn test_closure_trigger() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let trigger = move |req: IndicatorRequest| sink.lock().unwrap().push(req.point);

        trigger.show(request(3, 4));
        assert_eq!(*seen.lock().unwrap(), vec![Point::new(3, 4)]);
    }

    #[test]
    fn test_trigger_reconfigure_applies_to_later_markers() {
        let surface = RecordingSurface::default();
        let presenter = IndicatorPresenter::spawn(surface.clone(), config(10_000, 1_000));
        let trigger = presenter.trigger();

        trigger.show(request(1, 1));
        trigger.reconfigure(IndicatorConfig {
            size: 96,
            ..config(10_000, 1_000)
        });
        trigger.show(request(2, 2));
        drop(presenter);

        let sizes: Vec<u32> = surface
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(_, _, size) => Some(size),
                _ => None,
            })
            .collect();
        assert_eq!(sizes, vec![40, 96]);
    }
}
