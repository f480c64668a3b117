//! Focus-follow engine: state machine + processing thread.
//!
//! `FollowEngine` is the synchronous state machine. `FollowEngine::spawn`
//! moves it onto a dedicated thread fed by one FIFO command queue, so focus
//! events from any host thread are processed strictly one at a time and a
//! warp is never computed while another is half applied.

use crate::{
    Clock, Decision, DisplayLayout, FocusCallback, FocusEvent, FollowConfig, FollowError,
    IndicatorRequest, IndicatorTrigger, MonotonicClock, NullSink, Point, PointerWarper,
    RecordEntry, RecordingSink, WarpSuppressor, WindowId,
};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Engine state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// `active = false`; focus events are ignored.
    #[default]
    Disabled,
    /// Active, waiting for focus events.
    Idle,
    /// Mid pointer move. Never re-entered.
    Warping,
}

/// State owned by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    pub active: bool,
    pub recording: bool,
    /// Most recent warp issued by this process. Never set from an external
    /// focus change.
    pub last_warp_point: Option<Point>,
    pub last_warp_timestamp_ms: Option<u64>,
}

/// Flags the UI flips from its own thread. The engine picks them up before
/// each event, so disabling takes effect even with events already queued.
#[derive(Debug, Default)]
pub struct Toggles {
    active: AtomicBool,
    recording: AtomicBool,
}

impl Toggles {
    pub fn new(active: bool, recording: bool) -> Self {
        Self {
            active: AtomicBool::new(active),
            recording: AtomicBool::new(recording),
        }
    }

    pub fn active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn set_recording(&self, recording: bool) {
        self.recording.store(recording, Ordering::SeqCst);
    }
}

/// Snapshot for menu checkmarks and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub phase: Phase,
    pub state: EngineState,
    pub warps: u64,
    pub suppressed: u64,
    pub out_of_bounds: u64,
    pub failed: u64,
    /// Recording entries the sink could not take.
    pub dropped_records: u64,
}

/// What `handle_event` did with one focus event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Engine disabled; nothing recorded.
    Ignored,
    Suppressed,
    OutOfBounds,
    Warped(Point),
    WarpFailed(String),
}

/// Commands sent to the engine thread.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    Focus(FocusEvent),
    /// Re-read [`Toggles`].
    SyncToggles,
    ApplyConfig(Box<FollowConfig>),
    Shutdown,
}

/// Events emitted by the engine thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineEvent {
    PhaseChanged { old: Phase, new: Phase },
    Warped { window_id: WindowId, point: Point },
    Dropped { window_id: WindowId, decision: Decision },
}

/// The focus-to-pointer coordination state machine.
pub struct FollowEngine {
    config: FollowConfig,
    state: EngineState,
    phase: Phase,
    toggles: Arc<Toggles>,
    suppressor: WarpSuppressor,
    layout: Box<dyn DisplayLayout>,
    warper: Box<dyn PointerWarper>,
    sink: Box<dyn RecordingSink>,
    indicator: Option<Box<dyn IndicatorTrigger>>,
    clock: Arc<dyn Clock>,
    status: Arc<Mutex<EngineStatus>>,
    counters: EngineStatus,
    event_tx: Option<Sender<EngineEvent>>,
}

impl FollowEngine {
    pub fn new(
        config: FollowConfig,
        layout: impl DisplayLayout + 'static,
        warper: impl PointerWarper + 'static,
    ) -> Self {
        let config = config.validate();
        let state = EngineState {
            active: config.active,
            recording: config.recording,
            ..EngineState::default()
        };
        let phase = if config.active {
            Phase::Idle
        } else {
            Phase::Disabled
        };

        let engine = Self {
            suppressor: WarpSuppressor::new(config.suppression),
            toggles: Arc::new(Toggles::new(config.active, config.recording)),
            config,
            state,
            phase,
            layout: Box::new(layout),
            warper: Box::new(warper),
            sink: Box::new(NullSink),
            indicator: None,
            clock: Arc::new(MonotonicClock),
            status: Arc::new(Mutex::new(EngineStatus::default())),
            counters: EngineStatus::default(),
            event_tx: None,
        };
        engine.publish();
        engine
    }

    pub fn with_sink(mut self, sink: impl RecordingSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_indicator(mut self, trigger: impl IndicatorTrigger + 'static) -> Self {
        self.indicator = Some(Box::new(trigger));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn config(&self) -> &FollowConfig {
        &self.config
    }

    pub fn suppressor(&self) -> &WarpSuppressor {
        &self.suppressor
    }

    pub fn toggles(&self) -> Arc<Toggles> {
        self.toggles.clone()
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            phase: self.phase,
            state: self.state,
            ..self.counters
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.toggles.set_active(active);
        self.sync_toggles();
    }

    pub fn set_recording(&mut self, recording: bool) {
        self.toggles.set_recording(recording);
        self.sync_toggles();
    }

    /// Replace the configuration. `active`/`recording` from the new config
    /// win over earlier toggles.
    pub fn apply_config(&mut self, config: FollowConfig) {
        let config = config.validate();
        self.suppressor.reconfigure(config.suppression);
        self.warper.configure(&config.warp);
        if let Some(indicator) = &self.indicator {
            indicator.reconfigure(config.indicator);
        }
        self.toggles.set_active(config.active);
        self.toggles.set_recording(config.recording);
        if config.launch_at_login != self.config.launch_at_login {
            debug!(launch_at_login = config.launch_at_login, "login item setting ignored by engine");
        }
        self.config = config;
        info!("Engine configuration applied");
        self.sync_toggles();
    }

    /// Pull the UI toggles into engine state.
    pub fn sync_toggles(&mut self) {
        let active = self.toggles.active();
        let recording = self.toggles.recording();

        if recording != self.state.recording {
            info!(recording, "recording toggled");
            self.state.recording = recording;
        }

        if active != self.state.active {
            info!(active, "follow focus toggled");
            self.state.active = active;
            self.transition(if active { Phase::Idle } else { Phase::Disabled });
        }

        self.publish();
    }

    /// Process one focus event to completion.
    pub fn handle_event(&mut self, event: FocusEvent) -> Outcome {
        self.sync_toggles();
        self.note_late_landing();

        if self.phase == Phase::Disabled {
            debug!(window = ?event.window_id, "engine disabled, focus event ignored");
            return Outcome::Ignored;
        }

        if self.suppressor.should_suppress(&event) {
            debug!(point = %event.point, "focus event suppressed as warp echo");
            self.counters.suppressed += 1;
            self.record(&event, Decision::Suppressed, None);
            self.emit(EngineEvent::Dropped {
                window_id: event.window_id,
                decision: Decision::Suppressed,
            });
            self.publish();
            return Outcome::Suppressed;
        }

        let Some(screen) = self.layout.locate(event.point) else {
            let err = FollowError::OutOfBounds { point: event.point };
            info!(error = %err, "focus event dropped");
            self.counters.out_of_bounds += 1;
            self.record(&event, Decision::OutOfBounds, None);
            self.emit(EngineEvent::Dropped {
                window_id: event.window_id,
                decision: Decision::OutOfBounds,
            });
            self.publish();
            return Outcome::OutOfBounds;
        };

        let target = screen.bounds.clamp(event.point);
        let screen_id = screen.id;
        self.transition(Phase::Warping);

        let issued_at = self.clock.now_ms();
        let previous_window = self.suppressor.window();
        self.suppressor.mark_warp(target, issued_at);

        let outcome = match self.warper.warp(target) {
            Ok(()) => {
                debug!(%target, screen = screen_id.0, "pointer warped");
                self.state.last_warp_point = Some(target);
                self.state.last_warp_timestamp_ms = Some(issued_at);
                self.counters.warps += 1;

                if self.config.indicator.enabled {
                    if let Some(indicator) = &self.indicator {
                        indicator.show(IndicatorRequest {
                            point: target,
                            color: self.config.indicator.color,
                            display: screen_id,
                        });
                    }
                }

                self.record(&event, Decision::Accepted, Some(target));
                self.emit(EngineEvent::Warped {
                    window_id: event.window_id,
                    point: target,
                });
                Outcome::Warped(target)
            }
            Err(e) => {
                warn!(%target, error = %e, "pointer warp abandoned");
                if matches!(e, FollowError::WarpTimedOut { .. }) {
                    // The host call may still land; keep its echo covered.
                    debug!(%target, "suppression kept for pending warp");
                } else {
                    self.suppressor.restore(previous_window);
                }
                self.counters.failed += 1;
                self.record(&event, Decision::WarpFailed, Some(target));
                self.emit(EngineEvent::Dropped {
                    window_id: event.window_id,
                    decision: Decision::WarpFailed,
                });
                Outcome::WarpFailed(e.to_string())
            }
        };

        // A disable that arrived mid-warp lands here.
        let settled = if self.toggles.active() {
            Phase::Idle
        } else {
            self.state.active = false;
            Phase::Disabled
        };
        self.transition(settled);
        self.publish();
        outcome
    }

    /// A warp that timed out earlier may have landed since; treat it as
    /// freshly issued so its echo is suppressed.
    fn note_late_landing(&mut self) {
        let Some(point) = self.warper.take_late_landing() else {
            return;
        };
        let now = self.clock.now_ms();
        info!(%point, "late warp landing, suppression re-armed");
        self.suppressor.mark_warp(point, now);
        self.state.last_warp_point = Some(point);
        self.state.last_warp_timestamp_ms = Some(now);
        self.publish();
    }

    fn record(&mut self, event: &FocusEvent, decision: Decision, warp_point: Option<Point>) {
        if !self.state.recording {
            return;
        }
        let entry = RecordEntry::new(*event, decision, warp_point, self.clock.now_ms());
        if let Err(e) = self.sink.record(&entry) {
            self.counters.dropped_records += 1;
            debug!(error = %e, "recording entry dropped");
        }
    }

    fn transition(&mut self, new: Phase) {
        let old = self.phase;
        if old == new {
            return;
        }
        self.phase = new;
        debug!(?old, ?new, "phase transition");
        self.emit(EngineEvent::PhaseChanged { old, new });
        self.publish();
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(tx) = &self.event_tx {
            if let Err(TrySendError::Full(event)) = tx.try_send(event) {
                debug!(?event, "engine event queue full, event discarded");
            }
        }
    }

    fn publish(&self) {
        let mut guard = self.status.lock().unwrap_or_else(|e| e.into_inner());
        *guard = self.status();
    }

    /// Move the engine onto its own processing thread.
    pub fn spawn(mut self) -> EngineHandle {
        let (cmd_tx, cmd_rx) = bounded(512);
        let (event_tx, event_rx) = bounded(256);
        self.event_tx = Some(event_tx);

        let status = self.status.clone();
        let toggles = self.toggles.clone();

        let thread = thread::spawn(move || {
            self.run_loop(cmd_rx);
        });

        EngineHandle {
            cmd_tx,
            event_rx,
            status,
            toggles,
            thread: Some(thread),
        }
    }

    fn run_loop(mut self, cmd_rx: Receiver<EngineCommand>) {
        info!("Engine thread started");

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                EngineCommand::Focus(event) => {
                    self.handle_event(event);
                }
                EngineCommand::SyncToggles => self.sync_toggles(),
                EngineCommand::ApplyConfig(config) => self.apply_config(*config),
                EngineCommand::Shutdown => break,
            }
        }

        info!("Engine thread exiting");
    }
}

/// Handle to control the engine thread.
pub struct EngineHandle {
    cmd_tx: Sender<EngineCommand>,
    event_rx: Receiver<EngineEvent>,
    status: Arc<Mutex<EngineStatus>>,
    toggles: Arc<Toggles>,
    thread: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Queue a focus event. Returns false if the queue is full or closed.
    pub fn submit(&self, event: FocusEvent) -> bool {
        self.forwarder().forward(event)
    }

    /// A cloneable sender for host callback threads.
    pub fn forwarder(&self) -> EventForwarder {
        EventForwarder {
            cmd_tx: self.cmd_tx.clone(),
        }
    }

    pub fn set_active(&self, active: bool) {
        self.toggles.set_active(active);
        self.send(EngineCommand::SyncToggles);
    }

    pub fn set_recording(&self, recording: bool) {
        self.toggles.set_recording(recording);
        self.send(EngineCommand::SyncToggles);
    }

    pub fn apply_config(&self, config: FollowConfig) {
        self.send(EngineCommand::ApplyConfig(Box::new(config)));
    }

    /// Current status snapshot.
    pub fn status(&self) -> EngineStatus {
        *self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive all pending events.
    pub fn drain(&self) -> Vec<EngineEvent> {
        self.event_rx.try_iter().collect()
    }

    /// Blocking access to the event stream; ends when the engine stops.
    pub fn events(&self) -> &Receiver<EngineEvent> {
        &self.event_rx
    }

    /// Stop and wait for the thread to finish.
    pub fn shutdown(self) {
        drop(self);
    }

    fn send(&self, cmd: EngineCommand) {
        if let Err(e) = self.cmd_tx.send(cmd) {
            warn!("Failed to send command to engine: {}", e);
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Marshals focus events from host threads onto the engine queue.
#[derive(Debug, Clone)]
pub struct EventForwarder {
    cmd_tx: Sender<EngineCommand>,
}

impl EventForwarder {
    pub fn forward(&self, event: FocusEvent) -> bool {
        match self.cmd_tx.try_send(EngineCommand::Focus(event)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(window = ?event.window_id, "engine queue full, focus event dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Wrap as a [`FocusCallback`] for a [`crate::FocusEventSource`].
    pub fn into_callback(self) -> FocusCallback {
        Box::new(move |event| {
            self.forward(event);
        })
    }
}
