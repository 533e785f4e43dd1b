//! Positioned errors and warnings, and the collector every stage reports into.

use std::fmt::{self, Write as _};

use serde::Serialize;

use crate::lexer::{Token, TokenKind};
use crate::suggest::{did_you_mean, similar_names};

// ── Severity ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("Error"),
            Severity::Warning => f.write_str("Warning"),
        }
    }
}

// ── Diagnostic ────────────────────────────────────────────────────────────

/// One problem found in a document.
///
/// `line` and `column` are 1-based; `0` means "unknown".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub line: usize,
    pub column: usize,
    /// Width of the offending token, used to underline it. At least 1.
    pub width: usize,
    /// The quoted source line; filled in by [`Diagnostics::push`].
    pub source_line: Option<String>,
    pub suggestion: Option<String>,
    /// Extra notes such as "First declaration at line 3".
    pub related: Vec<String>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            severity,
            message: message.into(),
            line,
            column,
            width: 1,
            source_line: None,
            suggestion: None,
            related: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::new(Severity::Error, message, line, column)
    }

    pub fn warning(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::new(Severity::Warning, message, line, column)
    }

    /// An error located at `token` and underlining all of it.
    pub fn at_token(message: impl Into<String>, token: &Token) -> Self {
        Self::error(message, token.line, token.column).with_width(token.literal.chars().count())
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.related.push(note.into());
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Compiler-style multi-line rendering with a caret under the offending
    /// column when the source line is known.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}: {}", self.severity, self.message);

        if self.line > 0 {
            let _ = writeln!(out, "  --> line {}, column {}", self.line, self.column);
        }

        if let Some(src) = &self.source_line {
            out.push_str("    |\n");
            let _ = writeln!(out, "{:3} | {}", self.line, src);
            if self.column > 0 {
                let pointer = format!(
                    "{}^{}",
                    " ".repeat(self.column - 1),
                    "~".repeat(self.width.saturating_sub(1))
                );
                let _ = writeln!(out, "    | {pointer}");
            }
            out.push_str("    |\n");
        }

        if let Some(s) = &self.suggestion {
            let _ = writeln!(out, "\nSuggestion: {s}");
        }

        if !self.related.is_empty() {
            out.push('\n');
            for note in &self.related {
                let _ = writeln!(out, "Note: {note}");
            }
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// ── Canned diagnostics ────────────────────────────────────────────────────

pub fn unexpected_token(expected: TokenKind, got: &Token) -> Diagnostic {
    let shown = if got.is(TokenKind::Eof) { "end of input" } else { got.literal.as_str() };
    Diagnostic::at_token(format!("Expected {expected}, but got '{shown}'"), got)
        .with_suggestion(format!("Try replacing '{shown}' with {expected}"))
}

pub fn undefined_variable(name: &str, line: usize, column: usize, available: &[&str]) -> Diagnostic {
    let d = Diagnostic::error(format!("Undefined variable '{name}'"), line, column)
        .with_width(name.chars().count());

    if available.is_empty() {
        return d.with_suggestion(
            "No variables have been declared yet. Use 'var name: TYPE = value' to declare a variable",
        );
    }
    match did_you_mean(&similar_names(name, available.iter().copied())) {
        Some(s) => d.with_suggestion(s),
        None => d.with_note(format!("Available variables: {}", available.join(", "))),
    }
}

/// An initial value that does not fit the declared type. `got` is the type
/// the literal reads as; when it matches `expected` the value is only out of
/// range and no conversion is suggested.
pub fn type_mismatch(
    variable: &str,
    expected: &str,
    got: &str,
    detail: &str,
    line: usize,
    column: usize,
) -> Diagnostic {
    let d = Diagnostic::error(format!("Invalid initial value for variable '{variable}': {detail}"), line, column);
    if expected == got {
        return d;
    }
    d.with_suggestion(format!("Convert the value to {expected} or change the variable type to {got}"))
        .with_note(format!("Type mismatch: expected {expected}, got {got}"))
}

pub fn duplicate_declaration(name: &str, line: usize, column: usize, first_line: usize) -> Diagnostic {
    Diagnostic::error(format!("Duplicate declaration of '{name}'"), line, column)
        .with_suggestion(format!("Variable '{name}' is already declared"))
        .with_note(format!("First declaration at line {first_line}"))
}

pub fn unknown_attribute(attr: &str, context: &str, line: usize, column: usize, valid: &[&str]) -> Diagnostic {
    let mut d = Diagnostic::error(format!("Unknown attribute '{attr}' in {context}"), line, column)
        .with_width(attr.chars().count());
    if valid.is_empty() {
        return d;
    }
    if let Some(s) = did_you_mean(&similar_names(attr, valid.iter().copied())) {
        d = d.with_suggestion(s);
    }
    d.with_note(format!("Valid attributes for {context}: {}", valid.join(", ")))
}

// ── Diagnostics (collector) ───────────────────────────────────────────────

/// Accumulates diagnostics for one document. Errors and warnings are kept
/// apart, each in the order they were reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    source: String,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    /// `source` is the document text, used to quote offending lines. Pass an
    /// empty string when there is no text (e.g. a frame built in code).
    pub fn new(source: &str) -> Self {
        Self { source: source.to_string(), errors: Vec::new(), warnings: Vec::new() }
    }

    pub fn push(&mut self, mut d: Diagnostic) {
        if d.source_line.is_none() && d.line > 0 {
            d.source_line = self.source.lines().nth(d.line - 1).map(str::to_string);
        }
        match d.severity {
            Severity::Error => self.errors.push(d),
            Severity::Warning => self.warnings.push(d),
        }
    }

    pub fn error(&mut self, message: impl Into<String>, line: usize, column: usize) {
        self.push(Diagnostic::error(message, line, column));
    }

    pub fn warning(&mut self, message: impl Into<String>, line: usize, column: usize, suggestion: impl Into<String>) {
        self.push(Diagnostic::warning(message, line, column).with_suggestion(suggestion));
    }

    /// Move every diagnostic of `other` into `self`.
    pub fn extend(&mut self, other: Diagnostics) {
        for d in other.errors.into_iter().chain(other.warnings) {
            self.push(d);
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Errors first, then warnings.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }

    pub fn render_all(&self) -> String {
        let mut out = String::new();

        if !self.errors.is_empty() {
            let _ = write!(out, "Found {} error(s):\n\n", self.errors.len());
            render_numbered(&mut out, &self.errors);
        }

        if !self.warnings.is_empty() {
            if !self.errors.is_empty() {
                out.push_str("\n\n");
            }
            let _ = write!(out, "Found {} warning(s):\n\n", self.warnings.len());
            render_numbered(&mut out, &self.warnings);
        }
        out
    }
}

fn render_numbered(out: &mut String, items: &[Diagnostic]) {
    for (i, d) in items.iter().enumerate() {
        let _ = write!(out, "[{}] {}", i + 1, d.render());
        if i + 1 < items.len() {
            out.push('\n');
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_all())
    }
}
