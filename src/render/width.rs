//! Terminal width detection with safe fallbacks.
//!
//! Priority: explicit `CCLINE_COLUMNS` override, then `COLUMNS`, then a
//! TIOCGWINSZ query against `/dev/tty` (the controlling terminal, which
//! still answers when stdout is a pipe), then a conservative 80.

use std::os::unix::io::AsRawFd;

/// Explicit width override, highest priority.
pub const COLUMNS_OVERRIDE_ENV: &str = "CCLINE_COLUMNS";

/// Fallback when nothing answers. 80, not 200: over-reporting width makes
/// every tier render bars that wrap.
pub const DEFAULT_COLUMNS: u16 = 80;

/// Detect the terminal column count.
pub fn detect_columns() -> u16 {
    for var in [COLUMNS_OVERRIDE_ENV, "COLUMNS"] {
        if let Ok(raw) = std::env::var(var) {
            if let Ok(cols) = raw.trim().parse::<u16>() {
                if cols > 0 {
                    return cols;
                }
            }
        }
    }
    tty_columns().unwrap_or(DEFAULT_COLUMNS)
}

/// Ask the controlling terminal directly.
fn tty_columns() -> Option<u16> {
    let tty = std::fs::File::open("/dev/tty").ok()?;
    let mut size: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(tty.as_raw_fd(), libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 {
        Some(size.ws_col)
    } else {
        None
    }
}
