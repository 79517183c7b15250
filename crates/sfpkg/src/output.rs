//! Command output.
//!
//! Everything a command shows the user goes through [`Ux`]. In `--json` mode
//! status lines and tables are suppressed and only the envelope is written.

use serde::Serialize;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone)]
enum Sink {
    Stdout,
    Capture(Arc<Mutex<Vec<String>>>),
}

/// Output sink shared by a command and its lifecycle listeners.
#[derive(Debug, Clone)]
pub struct Ux {
    json: bool,
    sink: Sink,
}

/// Lines written to a capturing [`Ux`].
#[derive(Debug, Clone)]
pub struct Captured(Arc<Mutex<Vec<String>>>);

impl Captured {
    /// Everything written so far, one entry per write.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Ux {
    /// Write to stdout.
    #[must_use]
    pub const fn stdout(json: bool) -> Self {
        Self {
            json,
            sink: Sink::Stdout,
        }
    }

    /// Write to memory, for tests.
    #[must_use]
    pub fn capture(json: bool) -> (Self, Captured) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let ux = Self {
            json,
            sink: Sink::Capture(Arc::clone(&lines)),
        };
        (ux, Captured(lines))
    }

    /// Whether structured output was requested.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        self.json
    }

    fn write(&self, text: &str) {
        match &self.sink {
            Sink::Stdout => {
                let mut out = io::stdout().lock();
                let _ = writeln!(out, "{text}");
                let _ = out.flush();
            }
            Sink::Capture(lines) => lines
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(text.to_string()),
        }
    }

    /// Print a human readable line. Suppressed in JSON mode.
    pub fn log(&self, line: &str) {
        if !self.json {
            self.write(line);
        }
    }

    /// Print a table. Suppressed in JSON mode.
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        if !self.json {
            self.write(&render_table(headers, rows));
        }
    }

    /// Print a serializable value as pretty JSON.
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => self.write(&json),
            Err(e) => tracing::error!(error = %e, "Failed to serialize JSON output"),
        }
    }
}

fn pad_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Render rows as space separated, left aligned columns.
#[must_use]
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let rules: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(pad_row(headers.iter().copied(), &widths));
    out.push(pad_row(rules.iter().map(String::as_str), &widths));
    for row in rows {
        out.push(pad_row(row.iter().map(String::as_str), &widths));
    }
    out.join("\n")
}
