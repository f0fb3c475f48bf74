//! # Token Model
//!
//! Tokens, token kinds, and ordered token sets.
//!
//! The runtime never lexes: it is handed [`Token`]s through a
//! [`TokenSource`](crate::stream::TokenSource) and only inspects the fields
//! defined here. A grammar defines its vocabulary by implementing
//! [`TokenKind`] on a fieldless enum.

use compact_str::CompactString;
use smallvec::SmallVec;
use std::fmt;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// A character offset into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TextSize(u32);

impl TextSize {
    /// Create a `TextSize` from a raw offset.
    #[must_use]
    pub const fn from(offset: u32) -> Self {
        Self(offset)
    }

    /// Get the raw offset value.
    #[must_use]
    pub const fn into(self) -> u32 {
        self.0
    }

    /// The zero offset.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}

impl From<u32> for TextSize {
    fn from(offset: u32) -> Self {
        Self(offset)
    }
}

impl std::ops::Add for TextSize {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

/// A half-open `[start, end)` character range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TextRange {
    start: TextSize,
    end: TextSize,
}

impl TextRange {
    /// Create a range from start and end offsets.
    ///
    /// # Panics
    ///
    /// Panics if `start > end`.
    #[must_use]
    pub fn new(start: TextSize, end: TextSize) -> Self {
        assert!(start <= end, "TextRange start must not exceed end");
        Self { start, end }
    }

    /// Create a range starting at `start` with the given length.
    #[must_use]
    pub const fn at(start: TextSize, len: TextSize) -> Self {
        Self {
            start,
            end: TextSize(start.0 + len.0),
        }
    }

    /// An empty range at the given offset.
    #[must_use]
    pub const fn empty(offset: TextSize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Start offset of the range.
    #[must_use]
    pub const fn start(self) -> TextSize {
        self.start
    }

    /// End offset of the range (exclusive).
    #[must_use]
    pub const fn end(self) -> TextSize {
        self.end
    }

    /// Length of the range.
    #[must_use]
    pub const fn len(self) -> TextSize {
        TextSize(self.end.0 - self.start.0)
    }

    /// Whether the range is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }
}

#[cfg(feature = "diagnostics")]
impl From<TextRange> for miette::SourceSpan {
    fn from(range: TextRange) -> Self {
        Self::new(
            (range.start().into() as usize).into(),
            range.len().into() as usize,
        )
    }
}

/// The channel a token was emitted on.
///
/// Only [`Channel::Default`] tokens participate in parsing; lexers route
/// whitespace and comments to [`Channel::Hidden`] so they never reach the
/// recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Channel {
    /// The channel the parser reads from.
    #[default]
    Default,
    /// Trivia channel, invisible to the parser.
    Hidden,
}

/// The vocabulary of a grammar.
///
/// Implemented on a fieldless `Copy` enum listing every terminal the lexer
/// can produce, plus a dedicated end-of-stream marker.
pub trait TokenKind:
    Copy + PartialEq + Eq + std::hash::Hash + fmt::Debug + Send + Sync + 'static
{
    /// Whether this kind is the end-of-stream marker.
    fn is_eof(self) -> bool;

    /// How this kind appears in diagnostics: the quoted literal form for
    /// literal tokens (`'x'`), a bare name for named kinds (`Identifier`),
    /// and `<EOF>` for the end marker.
    fn display_name(self) -> &'static str;
}

/// A token handed to the runtime by a token source.
///
/// Once matched into the parse tree a token is immutable.
///
/// # Example
///
/// ```rust,no_run
/// use parlay::token::{Channel, TextRange, TextSize, Token, TokenKind};
///
/// # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// # enum MyKind { Number, Eof }
/// # impl TokenKind for MyKind {
/// #     fn is_eof(self) -> bool { matches!(self, MyKind::Eof) }
/// #     fn display_name(self) -> &'static str {
/// #         match self { MyKind::Number => "Number", MyKind::Eof => "<EOF>" }
/// #     }
/// # }
/// let token = Token::new(MyKind::Number, "42", 0)
///     .with_range(TextRange::at(TextSize::from(0), TextSize::from(2)))
///     .with_position(1, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Token<K: TokenKind> {
    /// The kind of this token.
    pub kind: K,
    /// The matched source text.
    pub text: CompactString,
    /// The channel this token was emitted on.
    pub channel: Channel,
    /// Position of this token in the token stream.
    pub index: usize,
    /// The character range in the source text.
    pub range: TextRange,
    /// 1-based source line.
    pub line: u32,
    /// 0-based character position within the line.
    pub column: u32,
}

impl<K: TokenKind> Token<K> {
    /// Create a token with the given kind, text, and stream index.
    ///
    /// Range and line/column default to the origin and are normally filled in
    /// with [`Token::with_range`] and [`Token::with_position`].
    #[must_use]
    pub fn new(kind: K, text: impl Into<CompactString>, index: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            channel: Channel::Default,
            index,
            range: TextRange::empty(TextSize::zero()),
            line: 1,
            column: 0,
        }
    }

    /// Set the source range.
    #[must_use]
    pub fn with_range(mut self, range: TextRange) -> Self {
        self.range = range;
        self
    }

    /// Set the source line (1-based) and column (0-based).
    #[must_use]
    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    /// Set the channel.
    #[must_use]
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    /// Whether this is the end-of-stream token.
    #[inline]
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.kind.is_eof()
    }

    /// How this token appears in diagnostics: `'text'`, or `<EOF>` for the
    /// end-of-stream token.
    #[must_use]
    pub fn error_display(&self) -> String {
        if self.is_eof() {
            "<EOF>".to_string()
        } else {
            format!("'{}'", self.text)
        }
    }
}

/// An insertion-ordered set of token kinds.
///
/// Order matters: sets are rendered in diagnostics (`{'x', 'y'}`) and the
/// rendering must follow grammar declaration order, so insertion order is
/// preserved and duplicates are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenSet<K: TokenKind> {
    kinds: SmallVec<[K; 8]>,
}

impl<K: TokenKind> TokenSet<K> {
    /// The empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kinds: SmallVec::new(),
        }
    }

    /// A set holding a single kind.
    #[must_use]
    pub fn single(kind: K) -> Self {
        let mut set = Self::new();
        set.insert(kind);
        set
    }

    /// Insert a kind, keeping first-insertion order. Returns `true` if the
    /// kind was not already present.
    pub fn insert(&mut self, kind: K) -> bool {
        if self.contains(kind) {
            false
        } else {
            self.kinds.push(kind);
            true
        }
    }

    /// Insert every kind from `other`, preserving this set's order first.
    pub fn extend_from(&mut self, other: &Self) {
        for &kind in &other.kinds {
            self.insert(kind);
        }
    }

    /// Whether `kind` is a member.
    #[must_use]
    pub fn contains(&self, kind: K) -> bool {
        self.kinds.iter().any(|&k| k == kind)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Iterate members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.kinds.iter().copied()
    }

    /// First member in insertion order, if any.
    #[must_use]
    pub fn first(&self) -> Option<K> {
        self.kinds.first().copied()
    }
}

impl<K: TokenKind> FromIterator<K> for TokenSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl<K: TokenKind> fmt::Display for TokenSet<K> {
    /// Diagnostic rendering: a lone member is shown bare (`'y'`), larger
    /// sets as `{'x', 'y'}` in insertion order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kinds.as_slice() {
            [only] => write!(f, "{}", only.display_name()),
            kinds => {
                write!(f, "{{")?;
                for (i, kind) in kinds.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", kind.display_name())?;
                }
                write!(f, "}}")
            }
        }
    }
}
