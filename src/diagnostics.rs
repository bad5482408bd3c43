//! Validator / Diagnostics.
//!
//! Diagnostics are plain data, never exceptions: every component-local
//! failure during lexing/parsing/rendering produces a `Diagnostic` pushed
//! onto the owning `Document` instead of unwinding.

use serde::{Deserialize, Serialize};

use crate::keyword::Keyword;
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    UnknownKeyword,
    UnclosedBlock,
    UnexpectedClose,
    InvalidAttribute,
    InvalidColor,
    DuplicateAnchor,
    UnresolvedFootnote,
    NestingTooDeep,
    EmptyBlock,
    MixedInlineBlock,
    /// Multi-paragraph content inside a single `見出しN` marker was joined
    /// with a warning rather than treated as an error.
    MultiLineHeading,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            span,
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn error(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, span, message)
    }

    pub fn warning(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, kind, span, message)
    }

    /// Attach up to 3 keyword suggestions ranked by edit distance.
    /// Used for `UnknownKeyword` diagnostics.
    pub fn with_keyword_suggestions(mut self, unknown: &str) -> Self {
        self.suggestions = crate::keyword::suggest(unknown, 3)
            .into_iter()
            .map(|k: &Keyword| k.name.to_string())
            .collect();
        self
    }

    /// Human-readable stanza: severity, kind, location, message, the
    /// offending source line excerpt, and suggestions if any.
    pub fn render_text(&self, source: &str) -> String {
        let line_no = self.span.start.line as usize;
        let excerpt = source.lines().nth(line_no.saturating_sub(1)).unwrap_or("");
        let caret_col = self.span.start.column.max(1) as usize;
        let mut stanza = format!(
            "{:?} [{:?}] at line {}, column {}: {}\n    {}\n    {}^",
            self.severity,
            self.kind,
            line_no,
            self.span.start.column,
            self.message,
            excerpt,
            " ".repeat(caret_col.saturating_sub(1)),
        );
        if !self.suggestions.is_empty() {
            stanza.push_str(&format!("\n    suggestion(s): {}", self.suggestions.join(", ")));
        }
        stanza
    }
}

/// Produces the structured report and the human-readable text report for a
/// document's accumulated diagnostics.
pub struct ValidationReport<'a> {
    diagnostics: &'a [Diagnostic],
}

impl<'a> ValidationReport<'a> {
    pub fn new(diagnostics: &'a [Diagnostic]) -> Self {
        Self { diagnostics }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn to_text(&self, source: &str) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.render_text(source))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self.diagnostics)
    }
}
