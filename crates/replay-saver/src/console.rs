//! Console window handling after the first-run prompt.

use tracing::debug;

/// Whether a console shared by `attached` processes belongs to us alone.
///
/// A count of one means the console was created for this process (started
/// from Explorer); more means a parent shell owns it.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) fn owns_console(attached: u32) -> bool {
    attached == 1
}

/// Hide the console window once settings are complete and the hotkey is live.
///
/// A console shared with a parent shell is left visible.
#[cfg(target_os = "windows")]
pub(crate) fn hide_console() {
    use windows_sys::Win32::{
        System::Console::{GetConsoleProcessList, GetConsoleWindow},
        UI::WindowsAndMessaging::{SW_HIDE, ShowWindow},
    };

    let mut processes = [0u32; 2];
    // SAFETY: the pointer and length describe `processes`.
    let attached = unsafe { GetConsoleProcessList(processes.as_mut_ptr(), processes.len() as u32) };
    if !owns_console(attached) {
        debug!(attached, "Console shared with other processes, leaving it visible");
        return;
    }

    // SAFETY: no arguments; returns null when there is no console.
    let window = unsafe { GetConsoleWindow() };
    if window.is_null() {
        return;
    }

    // SAFETY: `window` is the live console window handle.
    unsafe {
        ShowWindow(window, SW_HIDE);
    }
    debug!("Console window hidden");
}

/// Other platforms never open a console window of their own.
#[cfg(not(target_os = "windows"))]
pub(crate) fn hide_console() {
    debug!("No console window to hide on this platform");
}
