//! Display enumeration and DPI awareness.
//!
//! Platform implementations:
//! - Windows: `EnumDisplayMonitors` + Per-Monitor V2 DPI awareness (`windows.rs`)
//! - macOS: Core Graphics active display list (`macos.rs`)
//! - Other: `rdev::display_size` as a single display at the origin

use mff_core::{Display, DisplayLayout};
use tracing::warn;

#[cfg(windows)]
mod windows;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(windows)]
pub use windows::set_dpi_aware;

#[cfg(target_os = "macos")]
pub use macos::set_dpi_aware;

#[cfg(not(any(windows, target_os = "macos")))]
mod fallback {
    use mff_core::{Display, Rect};
    use tracing::warn;

    /// Set DPI awareness (no-op on unsupported platforms).
    pub fn set_dpi_aware() {}

    pub fn list_displays() -> Vec<Display> {
        match rdev::display_size() {
            Ok((w, h)) => vec![Display::new(0, Rect::new(0, 0, w as i32, h as i32))],
            Err(e) => {
                warn!(error = ?e, "failed to query display size");
                Vec::new()
            }
        }
    }
}

#[cfg(not(any(windows, target_os = "macos")))]
pub use fallback::set_dpi_aware;

/// Live display arrangement of the host.
///
/// Every call re-queries the system, so hot-plugged or rearranged
/// displays are picked up on the next focus event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDisplays;

impl SystemDisplays {
    pub fn new() -> Self {
        set_dpi_aware();
        Self
    }
}

impl DisplayLayout for SystemDisplays {
    fn displays(&self) -> Vec<Display> {
        #[cfg(windows)]
        let displays = windows::list_displays();
        #[cfg(target_os = "macos")]
        let displays = macos::list_displays();
        #[cfg(not(any(windows, target_os = "macos")))]
        let displays = fallback::list_displays();

        if displays.is_empty() {
            warn!("no displays reported by the system");
        }
        displays
    }
}
