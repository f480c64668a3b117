//! Suppression of focus events caused by our own pointer warps.
//!
//! Moving the pointer can make the host activate whatever window now sits
//! under it. Without this filter the engine would warp again in response to
//! its own warp and oscillate.

use crate::{FocusEvent, Point, SuppressionConfig};
use tracing::trace;

/// The single live suppression entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressionWindow {
    pub point: Point,
    pub issued_at_ms: u64,
    pub expires_at_ms: u64,
}

/// Remembers the most recent warp and filters focus events near it.
#[derive(Debug, Clone)]
pub struct WarpSuppressor {
    radius_px: u32,
    interval_ms: u64,
    window: Option<SuppressionWindow>,
}

impl WarpSuppressor {
    pub fn new(config: SuppressionConfig) -> Self {
        Self {
            radius_px: config.radius_px,
            interval_ms: config.interval_ms,
            window: None,
        }
    }

    /// Apply new tuning. The live entry keeps its original expiry.
    pub fn reconfigure(&mut self, config: SuppressionConfig) {
        self.radius_px = config.radius_px;
        self.interval_ms = config.interval_ms;
    }

    /// Record that a warp to `point` was issued at `now_ms`. Replaces any
    /// previous entry.
    pub fn mark_warp(&mut self, point: Point, now_ms: u64) {
        self.window = Some(SuppressionWindow {
            point,
            issued_at_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(self.interval_ms),
        });
    }

    /// Forget the live entry (e.g. the warp never happened).
    pub fn clear(&mut self) {
        self.window = None;
    }

    /// The current entry, live or not.
    pub fn window(&self) -> Option<SuppressionWindow> {
        self.window
    }

    /// Put back an entry taken with [`WarpSuppressor::window`].
    pub fn restore(&mut self, window: Option<SuppressionWindow>) {
        self.window = window;
    }

    /// True if `event` is plausibly an echo of the most recent warp.
    pub fn should_suppress(&self, event: &FocusEvent) -> bool {
        let Some(window) = self.window else {
            return false;
        };

        if event.timestamp_ms > window.expires_at_ms {
            return false;
        }

        let hit = window.point.within(&event.point, self.radius_px);
        trace!(?window, point = %event.point, hit, "suppression check");
        hit
    }

    /// The entry if it is still live at `now_ms`.
    pub fn live_window(&self, now_ms: u64) -> Option<SuppressionWindow> {
        self.window.filter(|w| now_ms <= w.expires_at_ms)
    }
}
