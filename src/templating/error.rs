//! Error types for the template engine.
//!
//! Structural problems (malformed delimiters, unknown tags, unbalanced blocks,
//! broken expressions) are reported as [`TemplateSyntaxError`] and abort the
//! whole render. Problems evaluating a single expression are [`EvalError`]s;
//! the renderer contains those to the node that raised them.

use thiserror::Error;

/// A template could not be tokenized or parsed.
///
/// `offset` is a byte offset into the template text pointing at the construct
/// that failed (the opening delimiter of an unterminated tag, the opening tag
/// of an unclosed block, the character where an expression broke, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at offset {offset})")]
pub struct TemplateSyntaxError {
    pub message: String,
    pub offset: usize,
}

impl TemplateSyntaxError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Internal scanner state violation.
///
/// The tokenizer only asks the scanner for positions it got from the scanner
/// itself, so these should never surface in practice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("scanner cannot move backwards from {from} to {to}")]
    Rewind { from: usize, to: usize },

    #[error("scanner position {position} is not on a character boundary")]
    CharBoundary { position: usize },
}

impl ScanError {
    fn position(&self) -> usize {
        match self {
            ScanError::Rewind { from, .. } => *from,
            ScanError::CharBoundary { position } => *position,
        }
    }
}

impl From<ScanError> for TemplateSyntaxError {
    fn from(err: ScanError) -> Self {
        let offset = err.position();
        TemplateSyntaxError::new(format!("internal scanner error: {err}"), offset)
    }
}

/// Failure while evaluating one expression against a context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("value of kind '{kind}' is not callable")]
    NotCallable { kind: &'static str },

    #[error("operator '{op}' cannot be applied to {left} and {right}")]
    InvalidOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("operator '{op}' cannot be applied to {operand}")]
    InvalidOperand {
        op: &'static str,
        operand: &'static str,
    },
}
