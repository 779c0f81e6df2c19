//! Terminal output for status-style command reports.
//!
//! `RenderSink` is the contract command handlers write to; `Renderer` is the
//! stderr implementation. Tests substitute a recording sink.

use crossterm::style::{Color, Stylize};

const INDENT_1: &str = "  ";
const LABEL_WARNING: &str = "warning:";
const LABEL_ERROR: &str = "error:";
const GLYPH_SECTION_BULLET: &str = "•";
const GLYPH_SUCCESS: &str = "✓";

/// Injectable rendering interface used by command handlers.
pub trait RenderSink: Send + Sync {
    /// Render a titled section divider.
    fn section(&self, title: &str);
    /// Render one key/value field row.
    fn field(&self, key: &str, value: &str);
    /// Render additional detail text.
    fn detail(&self, text: &str);
    /// Render a completed-action line.
    fn success(&self, msg: &str);
    /// Render a warning line.
    fn warn(&self, msg: &str);
    /// Render an error line.
    fn error(&self, msg: &str);
}

/// Default stderr renderer.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl RenderSink for Renderer {
    fn section(&self, title: &str) {
        if self.color {
            eprintln!(
                "{} {}",
                GLYPH_SECTION_BULLET.with(Color::DarkGrey),
                title.with(Color::Cyan).bold()
            );
        } else {
            eprintln!("{title}:");
        }
    }

    fn field(&self, key: &str, value: &str) {
        if self.color {
            eprintln!(
                "{INDENT_1}{} {}",
                format!("{key}:").with(Color::DarkGrey),
                value.with(Color::White),
            );
        } else {
            eprintln!("{INDENT_1}{key}: {value}");
        }
    }

    fn detail(&self, text: &str) {
        if self.color {
            eprintln!("{INDENT_1}{}", text.with(Color::Grey));
        } else {
            eprintln!("{INDENT_1}{text}");
        }
    }

    fn success(&self, msg: &str) {
        if self.color {
            eprintln!("{} {msg}", GLYPH_SUCCESS.with(Color::Green).bold());
        } else {
            eprintln!("{GLYPH_SUCCESS} {msg}");
        }
    }

    fn warn(&self, msg: &str) {
        if self.color {
            eprintln!("{} {msg}", LABEL_WARNING.with(Color::Yellow).bold());
        } else {
            eprintln!("{LABEL_WARNING} {msg}");
        }
    }

    fn error(&self, msg: &str) {
        if self.color {
            eprintln!("{} {msg}", LABEL_ERROR.with(Color::Red).bold());
        } else {
            eprintln!("{LABEL_ERROR} {msg}");
        }
    }
}
