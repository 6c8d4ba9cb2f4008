//! Message formatting and display.
//!
//! Results go to stdout either as short text lines or, in JSON mode, as a
//! single JSON document per command so scripts can consume them.
//!
//! # Examples
//!
//! ```
//! use pdfjoin::output::OutputFormatter;
//!
//! let formatter = OutputFormatter::new(false);
//! formatter.info("Validating 3 files...");
//! formatter.success("Merged 2 files");
//! formatter.warning("notes.txt (Not a PDF file)");
//! ```

use std::io::{self, IsTerminal};

use serde::Serialize;

/// Level of output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Informational message.
    Info,
    /// Success message.
    Success,
    /// Warning message.
    Warning,
    /// Error message.
    Error,
}

impl MessageLevel {
    fn decoration(self) -> (&'static str, &'static str) {
        match self {
            Self::Info => ("", ""),
            Self::Success => ("✓ ", "\x1b[32m"),
            Self::Warning => ("⚠ ", "\x1b[33m"),
            Self::Error => ("✗ ", "\x1b[31m"),
        }
    }
}

/// Prints command results as text or JSON.
pub struct OutputFormatter {
    /// Emit JSON documents instead of text lines.
    json: bool,
    /// Whether to use colored output.
    colored: bool,
}

impl OutputFormatter {
    /// Create a new output formatter.
    pub fn new(json: bool) -> Self {
        Self {
            json,
            colored: Self::should_use_color(),
        }
    }

    /// Detect if colored output should be used.
    fn should_use_color() -> bool {
        io::stdout().is_terminal() && std::env::var("TERM").is_ok()
    }

    /// Whether results are printed as JSON.
    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print an informational message. Suppressed in JSON mode.
    pub fn info(&self, message: &str) {
        if !self.json {
            self.print_message(MessageLevel::Info, message);
        }
    }

    /// Print a success message. Suppressed in JSON mode.
    pub fn success(&self, message: &str) {
        if !self.json {
            self.print_message(MessageLevel::Success, message);
        }
    }

    /// Print a warning message. Suppressed in JSON mode.
    pub fn warning(&self, message: &str) {
        if !self.json {
            self.print_message(MessageLevel::Warning, message);
        }
    }

    /// Print an error message to stderr.
    ///
    /// Always displayed.
    pub fn error(&self, message: &str) {
        let (prefix, color_code) = MessageLevel::Error.decoration();
        if self.colored && io::stderr().is_terminal() {
            eprintln!("{color_code}{prefix}{message}\x1b[0m");
        } else {
            eprintln!("{prefix}{message}");
        }
    }

    /// Print a list item.
    pub fn list_item(&self, index: usize, message: &str) {
        if !self.json {
            println!("  {index}. {message}");
        }
    }

    /// Print `value` as pretty JSON. Does nothing in text mode.
    pub fn json_value<T: Serialize>(&self, value: &T) {
        if !self.json {
            return;
        }
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(err) => tracing::error!(error = %err, "Cannot serialize output"),
        }
    }

    /// Render a message with level-appropriate decoration.
    pub fn render(&self, level: MessageLevel, message: &str) -> String {
        let (prefix, color_code) = level.decoration();
        if self.colored && !color_code.is_empty() {
            format!("{color_code}{prefix}{message}\x1b[0m")
        } else {
            format!("{prefix}{message}")
        }
    }

    fn print_message(&self, level: MessageLevel, message: &str) {
        println!("{}", self.render(level, message));
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(false)
    }
}
