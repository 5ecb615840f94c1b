use console::style;
use serde::Serialize;
use serde_json::json;

use crate::error::{Result, SbError};

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)
        .map_err(|err| SbError::Internal(format!("serialize output: {err}")))?;
    println!("{payload}");
    Ok(())
}

/// Robot-mode error document: `{"error": true, "code", "message", ...}`.
#[must_use]
pub fn robot_error(err: &SbError) -> serde_json::Value {
    let structured = err.to_structured();
    json!({
        "error": true,
        "code": structured.code,
        "message": structured.message,
        "suggestion": structured.suggestion,
        "recoverable": structured.recoverable,
    })
}

/// Format a currency amount as `$1,234,567`.
#[must_use]
pub fn dollars(amount: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let whole = amount.abs().round() as i64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && whole > 0 { "-" } else { "" };
    format!("{sign}${grouped}")
}

pub struct HumanLayout {
    lines: Vec<String>,
    key_width: usize,
}

impl Default for HumanLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanLayout {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            key_width: 22,
        }
    }

    pub fn title(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push(String::new());
        self
    }

    pub fn section(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push("-".repeat(text.len().max(3)));
        self
    }

    pub fn kv(&mut self, key: &str, value: &str) -> &mut Self {
        self.lines
            .push(format!("{key:width$} {value}", width = self.key_width));
        self
    }

    pub fn bullet(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("- {text}"));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    #[must_use]
    pub fn build(&self) -> String {
        self.lines.join("\n")
    }
}

pub fn emit_human(layout: &HumanLayout) {
    println!("{}", layout.build());
}
