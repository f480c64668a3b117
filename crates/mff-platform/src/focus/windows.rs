//! Windows focus notifications via WinEvent hooks.
//!
//! The hook is registered out-of-context on a dedicated thread, so the
//! system delivers callbacks through that thread's message loop.

use crate::{PlatformError, PlatformResult};
use crossbeam_channel::bounded;
use mff_core::{monotonic_ms, FocusCallback, FocusEvent, Rect, WindowId};
use std::cell::RefCell;
use std::ptr;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};
use windows_sys::Win32::Foundation::{HWND, RECT};
use windows_sys::Win32::System::Threading::GetCurrentThreadId;
use windows_sys::Win32::UI::Accessibility::{SetWinEventHook, UnhookWinEvent, HWINEVENTHOOK};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, GetWindowRect, GetWindowThreadProcessId, IsIconic,
    PostThreadMessageW, TranslateMessage, EVENT_SYSTEM_FOREGROUND, MSG, OBJID_WINDOW,
    WINEVENT_OUTOFCONTEXT, WINEVENT_SKIPOWNPROCESS, WM_QUIT,
};

// Thread-local storage for the callback, owned by the hook thread
thread_local! {
    static CALLBACK: RefCell<Option<FocusCallback>> = const { RefCell::new(None) };
}

pub struct WinEventSource {
    thread_id: Option<u32>,
    thread: Option<JoinHandle<()>>,
}

impl WinEventSource {
    pub fn new() -> Self {
        Self {
            thread_id: None,
            thread: None,
        }
    }

    pub fn start(&mut self, callback: FocusCallback) -> PlatformResult<()> {
        if self.thread.is_some() {
            debug!("focus hook already running");
            return Ok(());
        }

        let (ready_tx, ready_rx) = bounded::<PlatformResult<u32>>(1);
        let thread = thread::spawn(move || {
            CALLBACK.with(|cb| *cb.borrow_mut() = Some(callback));

            let hook = unsafe {
                SetWinEventHook(
                    EVENT_SYSTEM_FOREGROUND,
                    EVENT_SYSTEM_FOREGROUND,
                    ptr::null_mut(),
                    Some(win_event_proc),
                    0,
                    0,
                    WINEVENT_OUTOFCONTEXT | WINEVENT_SKIPOWNPROCESS,
                )
            };
            if hook.is_null() {
                let _ = ready_tx.send(Err(PlatformError::RegistrationFailed(
                    "SetWinEventHook returned null".into(),
                )));
                return;
            }

            let thread_id = unsafe { GetCurrentThreadId() };
            let _ = ready_tx.send(Ok(thread_id));
            info!(thread_id, "Focus hook thread started");

            run_message_loop();

            unsafe {
                UnhookWinEvent(hook);
            }
            CALLBACK.with(|cb| cb.borrow_mut().take());
            info!("Focus hook thread exiting");
        });

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => {
                self.thread_id = Some(thread_id);
                self.thread = Some(thread);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(PlatformError::RegistrationFailed(
                    "focus hook thread exited during startup".into(),
                ))
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(thread_id) = self.thread_id.take() {
            let posted = unsafe { PostThreadMessageW(thread_id, WM_QUIT, 0, 0) };
            if posted == 0 {
                warn!(thread_id, "failed to post WM_QUIT to focus hook thread");
            }
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

fn run_message_loop() {
    let mut msg: MSG = unsafe { std::mem::zeroed() };
    loop {
        let ret = unsafe { GetMessageW(&mut msg, ptr::null_mut(), 0, 0) };
        match ret {
            0 => break,
            -1 => {
                error!("GetMessageW failed in focus hook thread");
                break;
            }
            _ => unsafe {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            },
        }
    }
}

unsafe extern "system" fn win_event_proc(
    _hook: HWINEVENTHOOK,
    event: u32,
    hwnd: HWND,
    id_object: i32,
    _id_child: i32,
    _event_thread: u32,
    _event_time: u32,
) {
    if event != EVENT_SYSTEM_FOREGROUND || id_object != OBJID_WINDOW || hwnd.is_null() {
        return;
    }
    if IsIconic(hwnd) != 0 {
        trace!("foreground window is minimized, ignoring");
        return;
    }

    let Some(frame) = window_rect(hwnd) else {
        return;
    };
    let mut pid: u32 = 0;
    GetWindowThreadProcessId(hwnd, &mut pid);

    let event = FocusEvent::new(
        WindowId(hwnd as usize as u64),
        frame.center(),
        monotonic_ms(),
        pid,
    );
    trace!(?event, "foreground changed");

    CALLBACK.with(|cb| {
        if let Some(callback) = cb.borrow().as_ref() {
            callback(event);
        }
    });
}

fn window_rect(hwnd: HWND) -> Option<Rect> {
    unsafe {
        let mut rect: RECT = std::mem::zeroed();
        if GetWindowRect(hwnd, &mut rect) == 0 {
            return None;
        }
        let frame = Rect::new(
            rect.left,
            rect.top,
            rect.right - rect.left,
            rect.bottom - rect.top,
        );
        if frame.width <= 0 || frame.height <= 0 {
            return None;
        }
        Some(frame)
    }
}

