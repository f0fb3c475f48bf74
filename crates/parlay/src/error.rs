//! # Error Types
//!
//! Recognition errors, diagnostic records, and listener hooks.
//!
//! Recognition errors ([`RecognitionError`]) are the recoverable kind: the
//! recognizer reports a diagnostic, repairs the input, and keeps going, so a
//! parse always runs to completion. Structural misuse of the runtime is the
//! separate, fatal [`StreamError`](crate::stream::StreamError) /
//! [`AutomatonError`](crate::automaton::AutomatonError) category.
//!
//! Every recovery event produces one [`Diagnostic`] record. Records are
//! collected on the parser for post-parse inspection and forwarded to any
//! registered [`DiagnosticListener`]s as they happen. Message text is a pure
//! function of the offending token, its position, and the expected token
//! set, so repeated parses of the same input produce byte-identical
//! diagnostics.

use crate::token::{Token, TokenKind, TokenSet};
use compact_str::CompactString;
use std::fmt;
use thiserror::Error;

/// A recoverable recognition failure.
///
/// Returned to generated rule code so it can unwind the current rule; by the
/// time a caller sees one, the corresponding diagnostic has already been
/// reported and the stream repositioned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecognitionError<K: TokenKind> {
    /// The current token matched neither the expectation nor any local
    /// repair.
    #[error("mismatched input {} expecting {expected}", .offending.error_display())]
    TokenMismatch {
        offending: Token<K>,
        expected: TokenSet<K>,
    },

    /// Adaptive prediction eliminated every alternative of a decision.
    #[error("no viable alternative at input '{consumed}'")]
    NoViableAlternative {
        /// The token that eliminated the last alternative.
        offending: Token<K>,
        /// The decision that failed.
        decision: usize,
        /// Source text of the tokens the decision inspected, up to and
        /// including the offending one.
        consumed: CompactString,
        /// How many lookahead steps matched before the failure.
        matched_depth: usize,
        /// Union of the token sets still expected at the failing depth.
        expected: TokenSet<K>,
    },

    /// Resynchronization discarded input to the end of the stream without
    /// finding a continuation token.
    #[error("error recovery reached end of stream expecting {expected}")]
    RecoveryExhausted {
        offending: Token<K>,
        expected: TokenSet<K>,
    },
}

impl<K: TokenKind> RecognitionError<K> {
    /// The token the failure was detected at.
    #[must_use]
    pub const fn offending(&self) -> &Token<K> {
        match self {
            Self::TokenMismatch { offending, .. }
            | Self::NoViableAlternative { offending, .. }
            | Self::RecoveryExhausted { offending, .. } => offending,
        }
    }

    /// The token set expected where the failure was detected.
    #[must_use]
    pub const fn expected(&self) -> &TokenSet<K> {
        match self {
            Self::TokenMismatch { expected, .. }
            | Self::NoViableAlternative { expected, .. }
            | Self::RecoveryExhausted { expected, .. } => expected,
        }
    }
}

/// One reported recovery event.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic<K: TokenKind> {
    /// Message body, without the position prefix.
    pub message: String,
    /// The token the diagnostic points at.
    pub offending: Token<K>,
    /// 1-based source line of the offending token.
    pub line: u32,
    /// 0-based character position within the line.
    pub column: u32,
}

impl<K: TokenKind> Diagnostic<K> {
    /// Build a diagnostic positioned at `offending`.
    #[must_use]
    pub fn at(offending: Token<K>, message: String) -> Self {
        let line = offending.line;
        let column = offending.column;
        Self {
            message,
            offending,
            line,
            column,
        }
    }
}

impl<K: TokenKind> fmt::Display for Diagnostic<K> {
    /// The canonical form: `line L:C <message>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}:{} {}", self.line, self.column, self.message)
    }
}

/// Streaming hook for recovery diagnostics.
///
/// Listeners registered on a parser are invoked for every diagnostic, in
/// token-stream order, as recovery happens.
pub trait DiagnosticListener<K: TokenKind> {
    /// Called once per reported recovery event.
    fn syntax_error(&mut self, diagnostic: &Diagnostic<K>);
}

/// A listener that writes each diagnostic to standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleListener;

impl<K: TokenKind> DiagnosticListener<K> for ConsoleListener {
    fn syntax_error(&mut self, diagnostic: &Diagnostic<K>) {
        eprintln!("{diagnostic}");
    }
}
