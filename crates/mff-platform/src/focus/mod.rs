//! Host focus-change notifications.
//!
//! Platform implementations:
//! - Windows: `SetWinEventHook(EVENT_SYSTEM_FOREGROUND)` on a message-loop thread (`windows.rs`)
//! - macOS: Accessibility-gated watcher over the on-screen window list (`macos.rs`)
//! - Other: unsupported

use mff_core::{FocusCallback, FocusEventSource, FollowResult, Rect, WindowId};
use serde::{Deserialize, Serialize};

#[cfg(windows)]
mod windows;

#[cfg(target_os = "macos")]
mod macos;

/// Configuration for the system focus source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusSourceConfig {
    /// How often the frontmost window is sampled where the host offers no
    /// push notification (milliseconds).
    pub poll_interval_ms: u64,
}

impl Default for FocusSourceConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

/// Frontmost window as sampled from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub(crate) struct FrontWindow {
    pub id: WindowId,
    pub frame: Rect,
    pub pid: u32,
}

/// Turns a stream of samples into focus transitions: only a change of
/// window id counts, and the first sample is the baseline.
#[derive(Debug, Default)]
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub(crate) struct ChangeFilter {
    current: Option<WindowId>,
    primed: bool,
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
impl ChangeFilter {
    pub fn observe(&mut self, sample: Option<FrontWindow>) -> Option<FrontWindow> {
        let id = sample.map(|w| w.id);
        let changed = self.primed && id.is_some() && id != self.current;
        self.primed = true;
        self.current = id;
        if changed {
            sample
        } else {
            None
        }
    }
}

/// The host's focus source.
pub struct SystemFocusSource {
    #[cfg(windows)]
    inner: windows::WinEventSource,
    #[cfg(target_os = "macos")]
    inner: macos::WindowListSource,
}

impl SystemFocusSource {
    pub fn new(config: FocusSourceConfig) -> Self {
        #[cfg(not(target_os = "macos"))]
        let _ = &config;
        Self {
            #[cfg(windows)]
            inner: windows::WinEventSource::new(),
            #[cfg(target_os = "macos")]
            inner: macos::WindowListSource::new(config),
        }
    }
}

impl Default for SystemFocusSource {
    fn default() -> Self {
        Self::new(FocusSourceConfig::default())
    }
}

impl FocusEventSource for SystemFocusSource {
    fn start(&mut self, callback: FocusCallback) -> FollowResult<()> {
        #[cfg(any(windows, target_os = "macos"))]
        {
            self.inner.start(callback).map_err(Into::into)
        }
        #[cfg(not(any(windows, target_os = "macos")))]
        {
            drop(callback);
            Err(crate::PlatformError::Unsupported("focus notifications").into())
        }
    }

    fn stop(&mut self) {
        #[cfg(any(windows, target_os = "macos"))]
        self.inner.stop();
    }
}

impl Drop for SystemFocusSource {
    fn drop(&mut self) {
        self.stop();
    }
}
