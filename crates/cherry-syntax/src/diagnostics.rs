//! Scan diagnostics and API errors.
//!
//! Nothing a source file contains can abort a scan: malformed input becomes a
//! [`Diagnostic`] value returned next to the tree. [`SyntaxError`] is reserved
//! for caller mistakes such as asking for an unregistered language.

use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    UnknownTag,
    MalformedArgument,
    DuplicateTag,
    UnterminatedComment,
    UnterminatedString,
    UnterminatedBlock,
    UnbalancedBlock,
    NestingTooDeep,
    UnresolvedTag,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::UnknownTag => "unknown-tag",
            DiagnosticKind::MalformedArgument => "malformed-argument",
            DiagnosticKind::DuplicateTag => "duplicate-tag",
            DiagnosticKind::UnterminatedComment => "unterminated-comment",
            DiagnosticKind::UnterminatedString => "unterminated-string",
            DiagnosticKind::UnterminatedBlock => "unterminated-block",
            DiagnosticKind::UnbalancedBlock => "unbalanced-block",
            DiagnosticKind::NestingTooDeep => "nesting-too-deep",
            DiagnosticKind::UnresolvedTag => "unresolved-tag",
        }
    }

    /// Kinds produced by structural recovery rather than tag validation.
    pub fn is_recovery(&self) -> bool {
        matches!(
            self,
            DiagnosticKind::UnterminatedComment
                | DiagnosticKind::UnterminatedString
                | DiagnosticKind::UnterminatedBlock
                | DiagnosticKind::UnbalancedBlock
                | DiagnosticKind::NestingTooDeep
        )
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable problem found while scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Span,
    pub message: String,
    /// Best-effort text the scanner kept in place of what it expected.
    pub recovered: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            span,
            message: message.into(),
            recovered: None,
        }
    }

    pub fn with_recovered(mut self, text: impl Into<String>) -> Self {
        self.recovered = Some(text.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.span.start, self.kind, self.message)
    }
}

/// Errors in how the engine was called, as opposed to what it was fed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("unknown language: {0}")]
    UnknownLanguage(String),
    #[error("language already registered: {0}")]
    DuplicateLanguage(String),
    #[error("tag already registered: @{0}")]
    DuplicateTag(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Position;

    #[test]
    fn display_uses_start_position() {
        let at = Position {
            offset: 12,
            line: 3,
            column: 5,
        };
        let d = Diagnostic::new(DiagnosticKind::UnknownTag, Span::point(at), "@frobnicate");
        assert_eq!(d.to_string(), "3:5: unknown-tag: @frobnicate");
    }

    #[test]
    fn recovery_kinds() {
        assert!(DiagnosticKind::UnbalancedBlock.is_recovery());
        assert!(DiagnosticKind::UnterminatedString.is_recovery());
        assert!(!DiagnosticKind::UnknownTag.is_recovery());
        assert!(!DiagnosticKind::UnresolvedTag.is_recovery());
    }
}
