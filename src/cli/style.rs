//! Terminal styling helpers
//!
//! Styles always emit ANSI sequences; `anstream::println` strips them when
//! stdout is not a terminal.

use indicatif::ProgressStyle;
use owo_colors::Style;
use std::fmt::Display;

/// Check mark used for completed steps
pub const CHECK: &str = "✓";

fn paint<T: Display + ?Sized>(value: &T, style: Style) -> String {
    style.style(value).to_string()
}

/// Semantic styles for CLI output
pub trait Stylize: Display {
    /// De-emphasized text (hints, progress)
    fn muted(&self) -> String {
        paint(self, Style::new().dimmed())
    }

    /// Headings and names
    fn emphasis(&self) -> String {
        paint(self, Style::new().bold())
    }

    /// Branch names, ids, counts
    fn accent(&self) -> String {
        paint(self, Style::new().cyan())
    }

    /// Completed steps
    fn success(&self) -> String {
        paint(self, Style::new().green())
    }

    /// Warnings
    fn warn(&self) -> String {
        paint(self, Style::new().yellow())
    }

    /// Failures
    fn error(&self) -> String {
        paint(self, Style::new().red().bold())
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Green check mark
pub fn check() -> String {
    CHECK.success()
}

/// Spinner used around network and git round trips
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .map_or_else(|_| ProgressStyle::default_spinner(), |style| {
            style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
        })
}

/// Render `url` as a clickable link when the terminal supports it
pub fn link(text: &str, url: &str) -> String {
    if supports_hyperlinks::on(supports_hyperlinks::Stream::Stdout) {
        terminal_link::Link::new(text, url).to_string()
    } else if text == url {
        url.to_string()
    } else {
        format!("{text} ({url})")
    }
}
