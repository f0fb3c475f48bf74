//! Error recovery strategies.
//!
//! A strategy owns the recovery policy: what to do when a token fails to
//! match, when prediction finds no viable alternative, and how to
//! resynchronize at sync points. [`DefaultErrorStrategy`] repairs with
//! single-token deletion first, single-token insertion second, and
//! otherwise reports a mismatch and lets the current rule unwind.
//!
//! Strategies run in one of two modes. In normal mode every failure is
//! reported; after a mismatch the strategy enters recovery mode, where
//! further reports are suppressed until a token matches cleanly, so one
//! error event produces exactly one diagnostic.

use crate::error::RecognitionError;
use crate::parser::Recognizer;
use crate::token::{Token, TokenKind, TokenSet};
use crate::tree::RuleContext;
use compact_str::CompactString;

/// Recovery policy hooks, called by the parser at failure points.
pub trait ErrorStrategy<K: TokenKind, C: RuleContext> {
    /// Forget all recovery state (for parser reuse).
    fn reset(&mut self);

    /// Whether a recovery is in progress.
    fn in_recovery(&self) -> bool;

    /// A token matched cleanly; recovery, if any, is over.
    fn report_match(&mut self);

    /// Repair a failed token match. Returns the matched (or conjured) token
    /// on successful repair.
    ///
    /// # Errors
    ///
    /// [`RecognitionError::TokenMismatch`] when no local repair applies; the
    /// caller should unwind the current rule.
    fn recover_inline(
        &mut self,
        rec: &mut Recognizer<K, C>,
        expected: &TokenSet<K>,
    ) -> Result<Token<K>, RecognitionError<K>>;

    /// Handle a failed prediction: report, consume the inspected tokens as
    /// error leaves, and hand back the error the caller should return.
    fn recover_decision(
        &mut self,
        rec: &mut Recognizer<K, C>,
        error: RecognitionError<K>,
    ) -> RecognitionError<K>;

    /// Resynchronize at a sync point: ensure the next token is in
    /// `continuation`, discarding input as error leaves if necessary.
    ///
    /// # Errors
    ///
    /// [`RecognitionError::RecoveryExhausted`] when the stream ends before a
    /// continuation token appears.
    fn sync(
        &mut self,
        rec: &mut Recognizer<K, C>,
        continuation: &TokenSet<K>,
    ) -> Result<(), RecognitionError<K>>;

    /// Strategy name, for debugging.
    fn name(&self) -> &'static str;
}

/// The standard deletion / insertion / mismatch ladder.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorStrategy {
    recovering: bool,
}

impl DefaultErrorStrategy {
    /// Create a strategy in normal mode.
    #[must_use]
    pub const fn new() -> Self {
        Self { recovering: false }
    }

    /// Report unless a recovery is already in progress.
    fn report<K: TokenKind, C: RuleContext>(
        &self,
        rec: &mut Recognizer<K, C>,
        offending: &Token<K>,
        message: String,
    ) {
        if !self.recovering {
            rec.report(offending.clone(), message);
        }
    }
}

impl<K: TokenKind, C: RuleContext> ErrorStrategy<K, C> for DefaultErrorStrategy {
    fn reset(&mut self) {
        self.recovering = false;
    }

    fn in_recovery(&self) -> bool {
        self.recovering
    }

    fn report_match(&mut self) {
        self.recovering = false;
    }

    fn recover_inline(
        &mut self,
        rec: &mut Recognizer<K, C>,
        expected: &TokenSet<K>,
    ) -> Result<Token<K>, RecognitionError<K>> {
        let offending = rec.lookahead(1).clone();

        // Single-token deletion: the very next token satisfies the
        // expectation, so the offending one is extraneous.
        if expected.contains(rec.lookahead(2).kind) {
            self.report(
                rec,
                &offending,
                format!(
                    "extraneous input {} expecting {expected}",
                    offending.error_display()
                ),
            );
            rec.consume_as_error();
            let matched = rec.consume_matched();
            self.recovering = false;
            return Ok(matched);
        }

        // Single-token insertion: the offending token belongs to what may
        // follow the current rule, so the expected token is merely missing.
        let follow = rec.current_follow_set();
        if follow.contains(offending.kind) {
            self.report(
                rec,
                &offending,
                format!("missing {expected} at {}", offending.error_display()),
            );
            let conjured = conjure_missing(expected, &offending);
            rec.add_conjured_error(conjured.clone());
            self.recovering = false;
            return Ok(conjured);
        }

        // No local repair: report, enter recovery mode, drop the offending
        // token into the tree, and let the rule unwind.
        let error = RecognitionError::TokenMismatch {
            offending: offending.clone(),
            expected: expected.clone(),
        };
        self.report(rec, &offending, error.to_string());
        self.recovering = true;
        if !offending.is_eof() {
            rec.consume_as_error();
        }
        Err(error)
    }

    fn recover_decision(
        &mut self,
        rec: &mut Recognizer<K, C>,
        error: RecognitionError<K>,
    ) -> RecognitionError<K> {
        let (offending, decision, consumed, matched_depth, expected) = match error {
            RecognitionError::NoViableAlternative {
                offending,
                decision,
                consumed,
                matched_depth,
                expected,
            } => (offending, decision, consumed, matched_depth, expected),
            other => return other,
        };

        // A decision that fails on its very first token is reported as a
        // plain mismatch against the union of the alternatives' first sets.
        let error = if matched_depth == 0 {
            RecognitionError::TokenMismatch {
                offending,
                expected,
            }
        } else {
            RecognitionError::NoViableAlternative {
                offending,
                decision,
                consumed,
                matched_depth,
                expected,
            }
        };
        self.report(rec, error.offending(), error.to_string());
        self.recovering = true;

        // The tokens the decision inspected become error leaves.
        for _ in 0..=matched_depth {
            if rec.lookahead(1).is_eof() {
                break;
            }
            rec.consume_as_error();
        }
        error
    }

    fn sync(
        &mut self,
        rec: &mut Recognizer<K, C>,
        continuation: &TokenSet<K>,
    ) -> Result<(), RecognitionError<K>> {
        let offending = rec.lookahead(1).clone();
        if continuation.contains(offending.kind) {
            self.recovering = false;
            return Ok(());
        }

        self.report(
            rec,
            &offending,
            format!(
                "extraneous input {} expecting {continuation}",
                offending.error_display()
            ),
        );
        self.recovering = true;

        loop {
            let next = rec.lookahead(1);
            if continuation.contains(next.kind) {
                self.recovering = false;
                return Ok(());
            }
            if next.is_eof() {
                return Err(RecognitionError::RecoveryExhausted {
                    offending: next.clone(),
                    expected: continuation.clone(),
                });
            }
            rec.consume_as_error();
        }
    }

    fn name(&self) -> &'static str {
        "default"
    }
}

/// Build the placeholder token for single-token insertion, positioned at
/// the token it was conjured in front of.
fn conjure_missing<K: TokenKind>(expected: &TokenSet<K>, at: &Token<K>) -> Token<K> {
    let kind = expected
        .first()
        .expect("Internal error: insertion with an empty expected set");
    let text: CompactString = format!("<missing {}>", kind.display_name()).into();
    Token::new(kind, text, at.index)
        .with_range(crate::token::TextRange::empty(at.range.start()))
        .with_position(at.line, at.column)
}
