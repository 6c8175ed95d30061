//! Spinner shown while a run is writing sitemaps.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a simple spinner for the build.
pub fn create_spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg}") {
        bar.set_style(style.tick_chars("\u{25b8}\u{25b9}\u{25b8}\u{25b9}\u{25b8}"));
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Update the spinner after a sitemap file is flushed.
pub fn set_flushed(bar: &ProgressBar, files: u32, urls: usize) {
    bar.set_message(format!("Writing sitemaps  \x1b[34m{files} file(s), {urls} URLs\x1b[0m"));
}

/// Replace the spinner with a completion line.
pub fn set_done(bar: &ProgressBar, detail: &str) {
    if let Ok(style) = ProgressStyle::with_template("  {msg}") {
        bar.set_style(style);
    }
    bar.finish_with_message(format!("\x1b[32m\u{2713}\x1b[0m {detail}"));
}

/// Replace the spinner with a failure line.
pub fn set_failed(bar: &ProgressBar, detail: &str) {
    if let Ok(style) = ProgressStyle::with_template("  {msg}") {
        bar.set_style(style);
    }
    bar.finish_with_message(format!("\x1b[31m\u{2717}\x1b[0m {detail}"));
}
