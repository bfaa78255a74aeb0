//! Unified progress bar helpers
//!
//! Provides consistent progress bar styling for downloads and extraction.
//! Every constructor takes `quiet`; a quiet bar is hidden but still usable.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Standard spinner characters
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard tick interval for spinners
const TICK_INTERVAL_MS: u64 = 80;

const BYTES_TEMPLATE: &str = "     {spinner:.cyan} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({eta})";

/// Create a spinner progress bar with standard styling.
pub fn create_spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("     {spinner:.cyan} {msg}") {
        pb.set_style(style.tick_chars(SPINNER_CHARS));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(TICK_INTERVAL_MS));
    pb
}

/// Upgrade a spinner to a byte progress bar when content length becomes known.
pub fn upgrade_to_bytes(pb: &ProgressBar, total_bytes: u64) {
    pb.set_length(total_bytes);
    if let Ok(style) = ProgressStyle::default_bar().template(BYTES_TEMPLATE) {
        pb.set_style(style.progress_chars("━╸━"));
    }
}

/// RAII guard that clears a progress bar when dropped.
///
/// Keeps the terminal clean when a download or extraction bails out with `?`.
pub struct ProgressGuard<'a>(&'a ProgressBar);

impl<'a> ProgressGuard<'a> {
    pub fn new(pb: &'a ProgressBar) -> Self {
        Self(pb)
    }
}

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}
