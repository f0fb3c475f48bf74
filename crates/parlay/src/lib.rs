//! # Parlay
//!
//! A table-driven, adaptive parsing runtime.
//!
//! Parlay is the runtime half of a generated parser: it consumes a token
//! stream, predicts grammar alternatives by bounded speculative lookahead,
//! builds a parse tree incrementally, and recovers from malformed input
//! with deterministic diagnostics. Grammar compilation and code generation
//! live elsewhere; rule functions (generated or hand-written) drive the
//! [`parser::Parser`] facade.
//!
//! ## Components
//!
//! - [`stream`]: buffered, rewindable access to a pull-based token source,
//!   with nested speculation marks
//! - [`automaton`]: the immutable prediction tables shared across parses
//! - [`parser`]: the runtime facade, adaptive prediction, and pluggable
//!   error recovery
//! - [`tree`]: arena-backed parse trees with caller-extensible rule
//!   contexts
//! - [`render`]: the parenthesized `(rule child…)` tree form
//! - [`error`]: recognition errors, diagnostics, and listener hooks
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use parlay::automaton::{AltPath, AutomatonBuilder};
//! use parlay::parser::Parser;
//! use parlay::render::RenderOptions;
//! use parlay::stream::BufferedTokenStream;
//! use parlay::token::{Token, TokenKind, TokenSet};
//! use std::sync::Arc;
//!
//! // 1. Define the token vocabulary.
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Kind { X, Y, Eof }
//!
//! impl TokenKind for Kind {
//!     fn is_eof(self) -> bool { matches!(self, Kind::Eof) }
//!     fn display_name(self) -> &'static str {
//!         match self { Kind::X => "'x'", Kind::Y => "'y'", Kind::Eof => "<EOF>" }
//!     }
//! }
//!
//! // 2. Describe the grammar's rules and decisions (normally emitted by a
//! //    grammar compiler).
//! let mut builder = AutomatonBuilder::new();
//! let rule_a = builder.rule("a", 2, TokenSet::single(Kind::Eof));
//! let decision = builder.decision(rule_a, vec![
//!     AltPath::new([TokenSet::single(Kind::X)]),
//!     AltPath::new([TokenSet::single(Kind::Y)]),
//! ]);
//! let automaton = Arc::new(builder.build().unwrap());
//!
//! // 3. Drive the parser the way generated rule code would.
//! let stream = BufferedTokenStream::from_tokens(
//!     vec![Token::new(Kind::Y, "y", 0)],
//!     Kind::Eof,
//! );
//! let mut parser: Parser<Kind> = Parser::new(automaton, stream);
//! parser.enter_rule(rule_a, 0);
//! if let Ok(alt) = parser.predict(decision) {
//!     parser.set_alt_number(alt);
//!     let kind = if alt == 1 { Kind::X } else { Kind::Y };
//!     let _ = parser.match_token(kind);
//! }
//! parser.exit_rule();
//! assert_eq!(parser.tree_string(RenderOptions::default()), "(a y)");
//! ```
//!
//! ## Features
//!
//! - `diagnostics`: `miette` integration on the structural error types
//! - `serialize`: `serde` derives on tokens and text positions

pub mod automaton;
pub mod error;
pub mod parser;
pub mod render;
pub mod stack;
pub mod stream;
pub mod token;
pub mod tree;

pub use automaton::{AltPath, Automaton, AutomatonBuilder, DecisionState, RuleInfo};
pub use error::{Diagnostic, DiagnosticListener, RecognitionError};
pub use parser::{DefaultErrorStrategy, ErrorStrategy, Parser, ParserConfig};
pub use render::{tree_to_string, RenderOptions};
pub use stack::InvocationStack;
pub use stream::{BufferedTokenStream, Mark, SpeculationGuard, StreamError, TokenSource};
pub use token::{Channel, TextRange, TextSize, Token, TokenKind, TokenSet};
pub use tree::{AltContext, BaseContext, Node, NodeId, ParseTree, RuleContext};
