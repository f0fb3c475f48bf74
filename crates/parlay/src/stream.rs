//! # Token Source Adapter
//!
//! Buffered, rewindable access to a pull-based token source.
//!
//! [`BufferedTokenStream`] pulls tokens on demand, exposes bounded lookahead,
//! and supports nested speculation marks so the predictor can inspect input
//! and roll back without consuming it. Past end-of-stream the adapter yields
//! the end-of-stream token indefinitely, so lookahead never fails.

use crate::token::{Channel, Token, TokenKind};
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// A pull-based producer of tokens.
///
/// Once the underlying input is exhausted the source must keep yielding the
/// end-of-stream token on every call.
pub trait TokenSource<K: TokenKind> {
    /// Produce the next token.
    fn next_token(&mut self) -> Token<K>;
}

/// Structural misuse of the stream API. These are programming-contract
/// violations, not parse errors: a parse hitting one must be aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum StreamError {
    #[error("unknown speculation mark")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(stream::unknown_mark)))]
    UnknownMark,

    #[error("speculation mark released out of order (depth {released}, innermost is {innermost})")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(stream::non_nested_release)))]
    NonNestedRelease { released: usize, innermost: usize },

    #[error("speculation mark already released (depth {released})")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(stream::mark_already_released)))]
    MarkAlreadyReleased { released: usize },
}

/// A checkpoint into a [`BufferedTokenStream`].
///
/// Marks nest: they must be released (rewound or committed) innermost-first,
/// and exactly once. The type is deliberately not `Clone`.
#[derive(Debug)]
pub struct Mark {
    depth: usize,
}

/// Adapts a [`TokenSource`] into buffered, rewindable stream access.
///
/// Hidden-channel tokens are dropped while buffering; the recognizer only
/// ever sees the default channel.
pub struct BufferedTokenStream<K: TokenKind> {
    source: Box<dyn TokenSource<K>>,
    buffer: Vec<Token<K>>,
    eof: Option<Token<K>>,
    pos: usize,
    marks: Vec<usize>,
}

impl<K: TokenKind> BufferedTokenStream<K> {
    /// Wrap a token source.
    #[must_use]
    pub fn new(source: Box<dyn TokenSource<K>>) -> Self {
        Self {
            source,
            buffer: Vec::new(),
            eof: None,
            pos: 0,
            marks: Vec::new(),
        }
    }

    /// Convenience constructor over a pre-lexed token vector.
    #[must_use]
    pub fn from_tokens(tokens: Vec<Token<K>>, eof_kind: K) -> Self {
        Self::new(Box::new(VecTokenSource::new(tokens, eof_kind)))
    }

    /// Pull from the source until `n` unconsumed tokens are buffered or the
    /// end of the stream is reached.
    fn ensure_buffered(&mut self, n: usize) {
        while self.eof.is_none() && self.buffer.len() < self.pos + n {
            let token = self.source.next_token();
            if token.is_eof() {
                self.eof = Some(token);
            } else if token.channel == Channel::Default {
                self.buffer.push(token);
            }
        }
    }

    /// The end-of-stream token. Buffers the whole remaining input on first
    /// use past the end.
    fn eof_token(&mut self) -> &Token<K> {
        if self.eof.is_none() {
            self.ensure_buffered(usize::MAX - self.pos);
        }
        self.eof
            .as_ref()
            .expect("Internal error: token source ended without an end-of-stream token")
    }

    /// Look at the `k`-th upcoming token without consuming it.
    ///
    /// `k` is 1-based: `lookahead(1)` is the next token [`consume`] would
    /// return. Past end-of-stream this yields the end-of-stream token for
    /// every `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero.
    ///
    /// [`consume`]: BufferedTokenStream::consume
    pub fn lookahead(&mut self, k: usize) -> &Token<K> {
        assert!(k >= 1, "lookahead distance is 1-based");
        self.ensure_buffered(k);
        if self.pos + k <= self.buffer.len() {
            &self.buffer[self.pos + k - 1]
        } else {
            self.eof_token()
        }
    }

    /// Consume and return the next token. At end-of-stream this returns the
    /// end-of-stream token without advancing further.
    pub fn consume(&mut self) -> Token<K> {
        self.ensure_buffered(1);
        if self.pos < self.buffer.len() {
            let token = self.buffer[self.pos].clone();
            self.pos += 1;
            token
        } else {
            self.eof_token().clone()
        }
    }

    /// Current position in the (default-channel) token sequence.
    #[must_use]
    pub fn index(&self) -> usize {
        self.pos
    }

    /// Whether the next token is the end-of-stream token.
    pub fn is_at_end(&mut self) -> bool {
        self.lookahead(1).is_eof()
    }

    /// Record the current position for later [`rewind`] or [`commit`].
    ///
    /// [`rewind`]: BufferedTokenStream::rewind
    /// [`commit`]: BufferedTokenStream::commit
    #[must_use]
    pub fn mark(&mut self) -> Mark {
        self.marks.push(self.pos);
        Mark {
            depth: self.marks.len(),
        }
    }

    /// Release a mark, restoring the position it recorded.
    ///
    /// # Errors
    ///
    /// Fails when `mark` is not the innermost open mark.
    pub fn rewind(&mut self, mark: Mark) -> Result<(), StreamError> {
        let pos = self.release(mark)?;
        self.pos = pos;
        Ok(())
    }

    /// Release a mark, keeping the current position.
    ///
    /// # Errors
    ///
    /// Fails when `mark` is not the innermost open mark.
    pub fn commit(&mut self, mark: Mark) -> Result<(), StreamError> {
        self.release(mark)?;
        Ok(())
    }

    fn release(&mut self, mark: Mark) -> Result<usize, StreamError> {
        if mark.depth == 0 {
            return Err(StreamError::UnknownMark);
        }
        match mark.depth.cmp(&self.marks.len()) {
            std::cmp::Ordering::Greater => Err(StreamError::MarkAlreadyReleased {
                released: mark.depth,
            }),
            std::cmp::Ordering::Less => Err(StreamError::NonNestedRelease {
                released: mark.depth,
                innermost: self.marks.len(),
            }),
            std::cmp::Ordering::Equal => Ok(self
                .marks
                .pop()
                .expect("Internal error: mark stack empty at matched depth")),
        }
    }

    /// Rewind to an absolute position. Only used by [`Parser::reset`].
    ///
    /// [`Parser::reset`]: crate::parser::Parser::reset
    pub(crate) fn seek_start(&mut self) {
        self.pos = 0;
        self.marks.clear();
    }
}

impl<K: TokenKind> std::fmt::Debug for BufferedTokenStream<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedTokenStream")
            .field("buffered", &self.buffer.len())
            .field("pos", &self.pos)
            .field("open_marks", &self.marks.len())
            .finish_non_exhaustive()
    }
}

/// Drop guard for speculative lookahead.
///
/// Takes a mark on creation and rewinds it on drop, so a speculation rolls
/// back on every exit path, including early returns and panics. Call
/// [`commit`](SpeculationGuard::commit) to keep the consumed position
/// instead.
pub struct SpeculationGuard<'a, K: TokenKind> {
    stream: &'a mut BufferedTokenStream<K>,
    mark: Option<Mark>,
}

impl<'a, K: TokenKind> SpeculationGuard<'a, K> {
    /// Open a speculation on the stream.
    pub fn new(stream: &'a mut BufferedTokenStream<K>) -> Self {
        let mark = stream.mark();
        Self {
            stream,
            mark: Some(mark),
        }
    }

    /// Access the guarded stream.
    pub fn stream(&mut self) -> &mut BufferedTokenStream<K> {
        self.stream
    }

    /// Keep the position reached during the speculation.
    pub fn commit(mut self) {
        if let Some(mark) = self.mark.take() {
            self.stream
                .commit(mark)
                .expect("Internal error: speculation mark resolved out of order");
        }
    }
}

impl<K: TokenKind> Drop for SpeculationGuard<'_, K> {
    fn drop(&mut self) {
        if let Some(mark) = self.mark.take() {
            self.stream
                .rewind(mark)
                .expect("Internal error: speculation mark resolved out of order");
        }
    }
}

/// A [`TokenSource`] over a pre-lexed token vector.
///
/// When the vector runs out it synthesizes the end-of-stream token,
/// positioned just past the last real token, and yields it forever.
pub struct VecTokenSource<K: TokenKind> {
    tokens: Vec<Token<K>>,
    eof_kind: K,
    next: usize,
}

impl<K: TokenKind> VecTokenSource<K> {
    /// Create a source over `tokens` that terminates with `eof_kind`.
    #[must_use]
    pub fn new(tokens: Vec<Token<K>>, eof_kind: K) -> Self {
        Self {
            tokens,
            eof_kind,
            next: 0,
        }
    }

    fn synthesize_eof(&self) -> Token<K> {
        let (line, column) = self.tokens.last().map_or((1, 0), |last| {
            let width = u32::try_from(last.text.chars().count()).unwrap_or(0);
            (last.line, last.column + width)
        });
        let range = self
            .tokens
            .last()
            .map_or_else(crate::token::TextRange::default, |last| {
                crate::token::TextRange::empty(last.range.end())
            });
        Token::new(self.eof_kind, "", self.tokens.len())
            .with_range(range)
            .with_position(line, column)
    }
}

impl<K: TokenKind> TokenSource<K> for VecTokenSource<K> {
    fn next_token(&mut self) -> Token<K> {
        if self.next < self.tokens.len() {
            let token = self.tokens[self.next].clone();
            self.next += 1;
            token
        } else {
            self.synthesize_eof()
        }
    }
}
