use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

/// Parse errors with the offending token and source location.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    /// The token text the parser stopped on, when one is available.
    pub token: Option<String>,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn error(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        ParseError {
            message: message.into(),
            token: None,
            span,
            file_id,
            severity: Severity::Error,
            notes: Vec::new(),
        }
    }

    pub fn at_token(
        message: impl Into<String>,
        token: impl Into<String>,
        span: Range<usize>,
        file_id: usize,
    ) -> Self {
        ParseError {
            message: message.into(),
            token: Some(token.into()),
            span,
            file_id,
            severity: Severity::Error,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let label = match &self.token {
            Some(tok) => Label::primary(self.file_id, self.span.clone())
                .with_message(format!("near `{}`", tok)),
            None => Label::primary(self.file_id, self.span.clone()),
        };
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(vec![label])
            .with_notes(self.notes.clone())
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token {
            Some(tok) => write!(f, "{} (near `{}`)", self.message, tok),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}
