//! Progress bars for window construction

use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over `len` windows, or a hidden one when `enabled` is false.
pub fn window_progress(len: usize, message: &'static str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb.set_message(message);
    pb
}
