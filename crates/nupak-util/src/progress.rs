//! Terminal status output on stderr, aligned like Cargo's:
//!
//! ```text
//!       Locked 4 packages to nupak.lock
//!        Fresh nupak.lock is up to date
//! ```

use std::io::Write;
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

/// Width the label is right-aligned to.
const LABEL_WIDTH: usize = 12;

fn write_status(style: Style, label: &str, message: &str) {
    let _ = writeln!(
        std::io::stderr(),
        "{:>width$} {message}",
        style.apply_to(label),
        width = LABEL_WIDTH
    );
}

/// A completed action, bold green label.
pub fn status(label: &str, message: &str) {
    write_status(Style::new().green().bold(), label, message);
}

/// Nothing needed doing, bold cyan label.
pub fn status_info(label: &str, message: &str) {
    write_status(Style::new().cyan().bold(), label, message);
}

pub fn status_warn(label: &str, message: &str) {
    write_status(Style::new().yellow().bold(), label, message);
}

/// A spinner laid out like a status line, for work of unknown length.
/// Call [`ProgressBar::finish_and_clear`] when done.
pub fn spinner(label: &str, message: &str) -> ProgressBar {
    let template = format!("{{prefix:>{LABEL_WIDTH}.green.bold}} {{msg}} {{spinner}}");
    let style = ProgressStyle::with_template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let pb = ProgressBar::new_spinner()
        .with_style(style)
        .with_prefix(label.to_string())
        .with_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
