//! Ctrl+C / termination requests.
//!
//! The handler only flips a flag; the main loop polls it.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);

pub fn requested() -> bool {
    STOP_REQUESTED.load(Ordering::SeqCst)
}

#[cfg(unix)]
extern "C" fn on_signal(_signum: libc::c_int) {
    STOP_REQUESTED.store(true, Ordering::SeqCst);
}

/// Install handlers for SIGINT and SIGTERM.
#[cfg(unix)]
pub fn install() {
    let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    for signum in [libc::SIGINT, libc::SIGTERM] {
        let previous = unsafe { libc::signal(signum, handler) };
        if previous == libc::SIG_ERR {
            warn!(signum, "failed to install signal handler");
        }
    }
}

#[cfg(windows)]
unsafe extern "system" fn on_console_ctrl(_ctrl_type: u32) -> windows_sys::Win32::Foundation::BOOL {
    STOP_REQUESTED.store(true, Ordering::SeqCst);
    1
}

/// Install a console control handler (Ctrl+C, Ctrl+Break, close, logoff, shutdown).
#[cfg(windows)]
pub fn install() {
    use windows_sys::Win32::System::Console::SetConsoleCtrlHandler;

    let ok = unsafe { SetConsoleCtrlHandler(Some(on_console_ctrl), 1) };
    if ok == 0 {
        warn!("SetConsoleCtrlHandler failed");
    }
}

#[cfg(not(any(unix, windows)))]
pub fn install() {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_sigterm_requests_stop() {
        install();
        assert!(!requested());
        unsafe {
            libc::raise(libc::SIGTERM);
        }
        assert!(requested());
    }
}
