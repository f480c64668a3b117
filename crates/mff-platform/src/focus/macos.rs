//! macOS focus watcher.
//!
//! Focus changes are detected by sampling the on-screen window list, which
//! Core Graphics returns front to back. The first normal-layer window is the
//! one with keyboard focus. Requires Accessibility trust so the watcher
//! matches what the pointer warp itself needs.

use super::{ChangeFilter, FocusSourceConfig, FrontWindow};
use crate::{permission, PlatformError, PlatformResult};
use core_foundation::array::CFArray;
use core_foundation::base::{CFType, TCFType};
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::number::CFNumber;
use core_foundation::string::{CFString, CFStringRef};
use core_graphics::geometry::{CGPoint, CGRect, CGSize};
use core_graphics::window::{
    copy_window_info, kCGNullWindowID, kCGWindowBounds, kCGWindowLayer,
    kCGWindowListExcludeDesktopElements, kCGWindowListOptionOnScreenOnly, kCGWindowNumber,
    kCGWindowOwnerPID,
};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use mff_core::{monotonic_ms, FocusCallback, FocusEvent, Rect, WindowId};
use std::ffi::c_void;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, trace};

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGRectMakeWithDictionaryRepresentation(dict: CFDictionaryRef, rect: *mut CGRect) -> bool;
}

pub struct WindowListSource {
    config: FocusSourceConfig,
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl WindowListSource {
    pub fn new(config: FocusSourceConfig) -> Self {
        Self {
            config,
            stop_tx: None,
            thread: None,
        }
    }

    pub fn start(&mut self, callback: FocusCallback) -> PlatformResult<()> {
        if self.thread.is_some() {
            debug!("focus watcher already running");
            return Ok(());
        }
        if !permission::is_trusted() {
            return Err(PlatformError::PermissionDenied(
                "Accessibility access is required; enable it in System Settings > Privacy & Security > Accessibility".into(),
            ));
        }

        let interval = Duration::from_millis(self.config.poll_interval_ms.max(10));
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let thread = thread::spawn(move || {
            info!(?interval, "Focus watcher thread started (macOS window list)");
            let mut filter = ChangeFilter::default();
            loop {
                if let Some(front) = filter.observe(frontmost_window()) {
                    let event = FocusEvent::new(
                        front.id,
                        front.frame.center(),
                        monotonic_ms(),
                        front.pid,
                    );
                    trace!(?event, "frontmost window changed");
                    callback(event);
                }
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            info!("Focus watcher thread exiting");
        });

        self.stop_tx = Some(stop_tx);
        self.thread = Some(thread);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.try_send(());
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

fn frontmost_window() -> Option<FrontWindow> {
    let options = kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements;
    let windows: CFArray = copy_window_info(options, kCGNullWindowID)?;

    windows
        .get_all_values()
        .into_iter()
        .find_map(window_from_info)
}

fn window_from_info(raw: *const c_void) -> Option<FrontWindow> {
    let info: CFDictionary<CFString, CFType> =
        unsafe { CFDictionary::wrap_under_get_rule(raw as CFDictionaryRef) };

    let layer = number_field(&info, unsafe { kCGWindowLayer })?;
    if layer != 0 {
        return None;
    }
    let number = number_field(&info, unsafe { kCGWindowNumber })?;
    let pid = number_field(&info, unsafe { kCGWindowOwnerPID }).unwrap_or(0);

    let bounds = info.find(&key(unsafe { kCGWindowBounds }))?;
    let mut rect = CGRect::new(&CGPoint::new(0.0, 0.0), &CGSize::new(0.0, 0.0));
    let ok = unsafe {
        CGRectMakeWithDictionaryRepresentation(
            bounds.as_CFTypeRef() as CFDictionaryRef,
            &mut rect,
        )
    };
    if !ok || rect.size.width <= 0.0 || rect.size.height <= 0.0 {
        return None;
    }

    Some(FrontWindow {
        id: WindowId(number as u64),
        frame: Rect::new(
            rect.origin.x.round() as i32,
            rect.origin.y.round() as i32,
            rect.size.width.round() as i32,
            rect.size.height.round() as i32,
        ),
        pid: pid as u32,
    })
}

fn key(raw: CFStringRef) -> CFString {
    unsafe { CFString::wrap_under_get_rule(raw) }
}

fn number_field(info: &CFDictionary<CFString, CFType>, raw_key: CFStringRef) -> Option<i64> {
    info.find(&key(raw_key))?.downcast::<CFNumber>()?.to_i64()
}
