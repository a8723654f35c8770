//! Terminal detection utilities.
//!
//! Provides functions to detect TTY status and color support.

use std::env;

/// Returns `true` if stdout is connected to a terminal (TTY).
pub fn is_tty() -> bool {
    crossterm::tty::IsTty::is_tty(&std::io::stdout())
}

/// Determines if ANSI color codes should be used.
///
/// Respects standard conventions:
/// - `NO_COLOR` (any value): disables color (<https://no-color.org/>)
/// - `CLICOLOR=0`: disables color
/// - `TERM=dumb`: disables color
/// - `CLICOLOR_FORCE` (any value): forces color even in non-TTY
/// - Falls back to TTY detection
pub fn supports_color() -> bool {
    // NO_COLOR standard -- any value disables color.
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }

    // CLICOLOR=0 disables color.
    if env::var("CLICOLOR").as_deref() == Ok("0") {
        return false;
    }

    // TERM=dumb disables color.
    if env::var("TERM").as_deref() == Ok("dumb") {
        return false;
    }

    // CLICOLOR_FORCE forces color even in non-TTY.
    if env::var_os("CLICOLOR_FORCE").is_some() {
        return true;
    }

    // Default: use color only if stdout is a TTY.
    is_tty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_detection_does_not_panic() {
        // The answer depends on the environment; we just verify the
        // whole detection chain runs.
        let _ = supports_color();
    }
}
