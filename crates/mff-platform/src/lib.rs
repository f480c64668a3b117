//! mff-platform: platform-specific I/O boundary for mouse-follows-focus.
//!
//! This crate provides:
//! - Pointer warp via `enigo`
//! - Focus-change notifications (WinEvent hook on Windows, window-list
//!   watcher on macOS)
//! - Display geometry (Core Graphics, Win32 monitors, `rdev` elsewhere)
//! - Accessibility permission probing
//! - Marker surfaces for the indicator presenter
//!
//! ## Module Structure
//!
//! - `error` - Common error types
//! - `warper` - Pointer warp (shared implementation using enigo)
//! - `display` - Display enumeration and DPI awareness
//! - `focus` - Focus event source
//! - `permission` - Host permission checks
//! - `surface` - Marker surfaces

mod display;
mod error;
mod focus;
mod permission;
mod surface;
mod warper;

// Re-export error types
pub use error::{PlatformError, PlatformResult};

// Re-export display geometry
pub use display::{set_dpi_aware, SystemDisplays};

// Re-export focus source
pub use focus::{FocusSourceConfig, SystemFocusSource};

// Accessibility trust
pub use permission::{is_trusted, request_trust};

// Re-export marker surfaces
pub use surface::{CallbackSurface, TracingSurface};

// Re-export pointer warp
pub use warper::{EnigoWarper, NoopWarper};
