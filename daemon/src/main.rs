//! MouseFollowsFocus: warps the pointer to whichever window gains focus.

mod config;
mod focus;
mod logging;
mod paths;
mod shutdown;
mod sink;

use focus::{FocusSupervisor, SourceState};
use mff_core::{
    BoundedWarper, EngineEvent, FollowEngine, IndicatorPresenter, PointerWarper,
};
use mff_platform::{
    is_trusted, request_trust, EnigoWarper, NoopWarper, SystemDisplays, SystemFocusSource,
    TracingSurface,
};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How often the main loop wakes to check for shutdown and retry the focus source.
const TICK: Duration = Duration::from_millis(250);
const PERMISSION_RETRY: Duration = Duration::from_secs(2);

fn build_warper() -> Box<dyn PointerWarper> {
    match EnigoWarper::new() {
        Ok(warper) => Box::new(warper),
        Err(e) => {
            error!("Pointer warp unavailable: {e}");
            Box::new(NoopWarper)
        }
    }
}

fn log_event(event: EngineEvent) {
    match event {
        EngineEvent::Warped { window_id, point } => {
            debug!(window = window_id.0, %point, "warped");
        }
        EngineEvent::Dropped {
            window_id,
            decision,
        } => {
            debug!(window = window_id.0, ?decision, "focus event dropped");
        }
        EngineEvent::PhaseChanged { old, new } => {
            debug!(?old, ?new, "phase changed");
        }
    }
}

fn main() -> anyhow::Result<()> {
    logging::setup(!cfg!(debug_assertions));
    shutdown::install();

    let settings = config::load_settings();
    if !paths::settings_path().exists() {
        if let Err(e) = config::save_settings(&settings) {
            warn!("Failed to write default settings: {e}");
        }
    }
    let follow = settings.follow.clone();
    info!(
        active = follow.active,
        recording = follow.recording,
        radius_px = follow.suppression.radius_px,
        interval_ms = follow.suppression.interval_ms,
        "Starting MouseFollowsFocus"
    );

    if !request_trust() {
        warn!("Accessibility access not granted yet; focus tracking starts once it is");
    }

    let displays = SystemDisplays::new();
    let warper = BoundedWarper::spawn(
        build_warper(),
        Duration::from_millis(follow.warp.timeout_ms),
    );
    let presenter = IndicatorPresenter::spawn(TracingSurface, follow.indicator);
    let sink = sink::build_sink(&follow);

    let handle = FollowEngine::new(follow, displays, warper)
        .with_sink(sink)
        .with_indicator(presenter.trigger())
        .spawn();

    let forwarder = handle.forwarder();
    let mut source = FocusSupervisor::new(
        SystemFocusSource::new(settings.focus.clone()),
        move || forwarder.clone().into_callback(),
        PERMISSION_RETRY,
    );
    source.poll(is_trusted);

    while !shutdown::requested() {
        match handle.events().recv_timeout(TICK) {
            Ok(event) => log_event(event),
            Err(e) if e.is_disconnected() => {
                warn!("Engine stopped unexpectedly");
                break;
            }
            Err(_) => {}
        }
        if source.state() == SourceState::Waiting {
            source.poll(is_trusted);
        }
    }

    info!("Shutdown requested");
    source.stop();
    let status = handle.status();
    info!(
        warps = status.warps,
        suppressed = status.suppressed,
        failed = status.failed,
        "MouseFollowsFocus exiting"
    );
    handle.shutdown();
    drop(presenter);
    Ok(())
}
