//! Windows display geometry via Win32 monitor enumeration.

use mff_core::{Display, DisplayId, Rect};
use std::ptr;
use std::sync::Once;
use tracing::{info, trace, warn};
use windows_sys::Win32::Foundation::{BOOL, LPARAM, RECT, TRUE};
use windows_sys::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO,
};

static INIT: Once = Once::new();

/// Set the process DPI awareness to Per-Monitor V2.
/// Monitor rects, window rects and pointer warps then all use physical pixels.
///
/// Must be called early in the application lifecycle, before any window is created.
pub fn set_dpi_aware() {
    INIT.call_once(|| unsafe {
        const DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2: isize = -4;

        #[link(name = "user32")]
        extern "system" {
            fn SetProcessDpiAwarenessContext(value: isize) -> i32;
        }

        if SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) != 0 {
            info!("Set Per-Monitor V2 DPI awareness");
        } else {
            warn!("Failed to set Per-Monitor V2 DPI awareness, coordinates may be scaled");
        }
    });
}

pub fn list_displays() -> Vec<Display> {
    let mut monitors: Vec<HMONITOR> = Vec::new();
    let ok = unsafe {
        EnumDisplayMonitors(
            ptr::null_mut(),
            ptr::null(),
            Some(enum_monitor_callback),
            &mut monitors as *mut Vec<HMONITOR> as LPARAM,
        )
    };
    if ok == 0 {
        warn!("EnumDisplayMonitors failed");
        return Vec::new();
    }

    monitors
        .into_iter()
        .enumerate()
        .filter_map(|(index, monitor)| monitor_display(index as u32, monitor))
        .collect()
}

unsafe extern "system" fn enum_monitor_callback(
    monitor: HMONITOR,
    _hdc: HDC,
    _rect: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let monitors = &mut *(lparam as *mut Vec<HMONITOR>);
    monitors.push(monitor);
    TRUE
}

fn monitor_display(index: u32, monitor: HMONITOR) -> Option<Display> {
    unsafe {
        let mut info: MONITORINFO = std::mem::zeroed();
        info.cbSize = std::mem::size_of::<MONITORINFO>() as u32;
        if GetMonitorInfoW(monitor, &mut info) == 0 {
            warn!(index, "GetMonitorInfoW failed");
            return None;
        }

        let rc = info.rcMonitor;
        let display = Display {
            id: DisplayId(index),
            bounds: Rect::new(rc.left, rc.top, rc.right - rc.left, rc.bottom - rc.top),
            scale_factor: monitor_scale(monitor),
        };
        trace!(?display, "monitor");
        Some(display)
    }
}

fn monitor_scale(monitor: HMONITOR) -> f64 {
    const MDT_EFFECTIVE_DPI: i32 = 0;

    #[link(name = "shcore")]
    extern "system" {
        fn GetDpiForMonitor(monitor: HMONITOR, dpi_type: i32, dpi_x: *mut u32, dpi_y: *mut u32)
            -> i32;
    }

    let (mut dpi_x, mut dpi_y) = (0u32, 0u32);
    let hr = unsafe { GetDpiForMonitor(monitor, MDT_EFFECTIVE_DPI, &mut dpi_x, &mut dpi_y) };
    if hr != 0 || dpi_x == 0 {
        return 1.0;
    }
    dpi_x as f64 / 96.0
}
