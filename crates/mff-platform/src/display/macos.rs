//! macOS display geometry via Core Graphics.
//!
//! CG reports bounds in global points with a top-left origin at the main
//! display, which is the same space focus points and warps use.

use core_graphics::display::CGDisplay;
use mff_core::{Display, DisplayId, Rect};
use tracing::warn;

/// Set DPI awareness (no-op on macOS).
///
/// Retina scaling is handled by the system; all coordinates here are points.
pub fn set_dpi_aware() {}

pub fn list_displays() -> Vec<Display> {
    let ids = match CGDisplay::active_displays() {
        Ok(ids) => ids,
        Err(code) => {
            warn!(code, "CGGetActiveDisplayList failed");
            return Vec::new();
        }
    };

    ids.into_iter()
        .map(|id| {
            let display = CGDisplay::new(id);
            let bounds = display.bounds();
            let width = bounds.size.width;
            let scale_factor = if width > 0.0 {
                display.pixels_wide() as f64 / width
            } else {
                1.0
            };
            Display {
                id: DisplayId(id),
                bounds: Rect::new(
                    bounds.origin.x.round() as i32,
                    bounds.origin.y.round() as i32,
                    width.round() as i32,
                    bounds.size.height.round() as i32,
                ),
                scale_factor,
            }
        })
        .collect()
}
