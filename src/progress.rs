// src/progress.rs

//! Terminal feedback while external commands run
//!
//! Two pieces:
//! - [`Spinner`]: a scoped ticking indicator. It starts when created and is
//!   cleared when dropped, so every exit path of the decorated call (success,
//!   error return, panic unwind) restores the terminal line.
//! - [`status`]: the one-line `[ OK ]` / `[FAIL]` style outcome reporter.
//!
//! The spinner draws to stderr and hides itself when stderr is not a
//! terminal, so logs and pipes never see control sequences.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Tick interval of the spinner
const TICK: Duration = Duration::from_millis(120);

/// Scoped spinner decorating a blocking call
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    /// Start ticking with the given label
    pub fn start(label: &str) -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("|/-\\ ")
                .template("[{spinner:.cyan}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(label.to_string());
        bar.enable_steady_tick(TICK);
        Self { bar }
    }

    /// Spinner that never draws (quiet mode and tests)
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.bar.is_hidden()
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Status line output
pub mod status {
    /// Informational line
    pub fn info(msg: &str) {
        println!("[INFO] {}", msg);
    }

    /// Success line
    pub fn ok(msg: &str) {
        println!("[ OK ] {}", msg);
    }

    /// Warning line
    pub fn warn(msg: &str) {
        println!("[WARN] {}", msg);
    }

    /// Failure line (stderr)
    pub fn fail(msg: &str) {
        eprintln!("[FAIL] {}", msg);
    }
}
