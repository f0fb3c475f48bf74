//! # Parser Runtime
//!
//! The facade generated rule code drives.
//!
//! A [`Parser`] ties the pieces together: the buffered token stream, the
//! shared automaton, the parse tree under construction, the rule invocation
//! stack, and the pluggable [`ErrorStrategy`]. Rule functions call
//! [`enter_rule`](Parser::enter_rule) / [`exit_rule`](Parser::exit_rule)
//! around their bodies, [`match_token`](Parser::match_token) for terminals,
//! [`predict`](Parser::predict) at decision points, and
//! [`sync`](Parser::sync) at loop boundaries.
//!
//! The internal state lives on [`Recognizer`] so strategy implementations
//! can mutate it while the strategy itself stays a boxed trait object.

pub mod prediction;
pub mod recovery;

pub use recovery::{DefaultErrorStrategy, ErrorStrategy};

use crate::automaton::Automaton;
use crate::error::{Diagnostic, DiagnosticListener, RecognitionError};
use crate::render::{tree_to_string, RenderOptions};
use crate::stream::{BufferedTokenStream, Mark, StreamError};
use crate::token::{Token, TokenKind, TokenSet};
use crate::tree::{BaseContext, ParseTree, RuleContext};
use std::sync::Arc;

/// Knobs fixed at parser construction.
#[derive(Debug, Clone, Copy)]
pub struct ParserConfig {
    /// Build a parse tree while recognizing. When disabled, rule entry and
    /// exit still maintain the invocation stack but no nodes are created.
    pub build_parse_tree: bool,
    /// Upper bound on prediction lookahead depth.
    pub max_lookahead: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            build_parse_tree: true,
            max_lookahead: 16,
        }
    }
}

/// The mutable recognition state shared with the error strategy.
pub struct Recognizer<K: TokenKind, C: RuleContext = BaseContext> {
    automaton: Arc<Automaton<K>>,
    stream: BufferedTokenStream<K>,
    tree: ParseTree<K, C>,
    stack: crate::stack::InvocationStack,
    config: ParserConfig,
    diagnostics: Vec<Diagnostic<K>>,
    listeners: Vec<Box<dyn DiagnosticListener<K>>>,
}

impl<K: TokenKind, C: RuleContext> Recognizer<K, C> {
    /// Look at the `k`-th upcoming token (1-based) without consuming it.
    pub fn lookahead(&mut self, k: usize) -> &Token<K> {
        self.stream.lookahead(k)
    }

    /// Current token stream position.
    #[must_use]
    pub fn stream_index(&self) -> usize {
        self.stream.index()
    }

    /// Consume the next token and attach it as a matched terminal.
    pub fn consume_matched(&mut self) -> Token<K> {
        let token = self.stream.consume();
        if self.config.build_parse_tree && self.tree.current_rule().is_some() {
            self.tree.add_token(token.clone());
        }
        token
    }

    /// Consume the next token and attach it as an error leaf.
    pub fn consume_as_error(&mut self) -> Token<K> {
        let token = self.stream.consume();
        if self.config.build_parse_tree && self.tree.current_rule().is_some() {
            self.tree.add_error_token(token.clone(), false);
        }
        token
    }

    /// Attach a conjured token (single-token insertion) as an error leaf,
    /// consuming nothing.
    pub fn add_conjured_error(&mut self, token: Token<K>) {
        if self.config.build_parse_tree && self.tree.current_rule().is_some() {
            self.tree.add_error_token(token, true);
        }
    }

    /// Follow set of the rule currently being parsed; empty outside any
    /// rule.
    #[must_use]
    pub fn current_follow_set(&self) -> TokenSet<K> {
        self.stack
            .current()
            .and_then(|rule| self.automaton.rule(rule))
            .map_or_else(TokenSet::new, |info| info.follow().clone())
    }

    /// Record a diagnostic and notify listeners.
    pub fn report(&mut self, offending: Token<K>, message: String) {
        let diagnostic = Diagnostic::at(offending, message);
        for listener in &mut self.listeners {
            listener.syntax_error(&diagnostic);
        }
        self.diagnostics.push(diagnostic);
    }

    /// The shared automaton.
    #[must_use]
    pub fn automaton(&self) -> &Automaton<K> {
        &self.automaton
    }
}

/// The parsing runtime driven by generated rule code.
///
/// # Example
///
/// ```rust,no_run
/// use parlay::automaton::{AltPath, AutomatonBuilder};
/// use parlay::parser::Parser;
/// use parlay::stream::BufferedTokenStream;
/// use parlay::token::{Token, TokenKind, TokenSet};
/// use std::sync::Arc;
///
/// # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// # enum Kind { X, Eof }
/// # impl TokenKind for Kind {
/// #     fn is_eof(self) -> bool { matches!(self, Kind::Eof) }
/// #     fn display_name(self) -> &'static str {
/// #         match self { Kind::X => "'x'", Kind::Eof => "<EOF>" }
/// #     }
/// # }
/// let mut builder = AutomatonBuilder::new();
/// let rule_a = builder.rule("a", 1, TokenSet::single(Kind::Eof));
/// let automaton = Arc::new(builder.build().unwrap());
///
/// let stream = BufferedTokenStream::from_tokens(
///     vec![Token::new(Kind::X, "x", 0)],
///     Kind::Eof,
/// );
/// let mut parser: Parser<Kind> = Parser::new(automaton, stream);
/// parser.enter_rule(rule_a, 0);
/// let _ = parser.match_token(Kind::X);
/// parser.exit_rule();
/// ```
pub struct Parser<K: TokenKind, C: RuleContext = BaseContext> {
    rec: Recognizer<K, C>,
    strategy: Box<dyn ErrorStrategy<K, C>>,
}

impl<K: TokenKind, C: RuleContext> Parser<K, C> {
    /// Create a parser over a stream with the default configuration and
    /// recovery strategy.
    #[must_use]
    pub fn new(automaton: Arc<Automaton<K>>, stream: BufferedTokenStream<K>) -> Self {
        Self {
            rec: Recognizer {
                automaton,
                stream,
                tree: ParseTree::new(),
                stack: crate::stack::InvocationStack::new(),
                config: ParserConfig::default(),
                diagnostics: Vec::new(),
                listeners: Vec::new(),
            },
            strategy: Box::new(DefaultErrorStrategy::new()),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.rec.config = config;
        self
    }

    /// Replace the recovery strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Box<dyn ErrorStrategy<K, C>>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Register a diagnostic listener.
    pub fn add_listener(&mut self, listener: Box<dyn DiagnosticListener<K>>) {
        self.rec.listeners.push(listener);
    }

    /// Enter a rule: push the invocation frame and open a rule node.
    ///
    /// # Panics
    ///
    /// Panics if `rule_index` is not a rule of the automaton.
    pub fn enter_rule(&mut self, rule_index: usize, invoking_state: usize) {
        assert!(
            self.rec.automaton.rule(rule_index).is_some(),
            "Internal error: entered an unknown rule index"
        );
        self.rec.stack.push(rule_index);
        if self.rec.config.build_parse_tree {
            self.rec.tree.enter_rule(rule_index, invoking_state);
        }
    }

    /// Exit the innermost rule. Must be called on every exit path of a rule
    /// function, error unwinds included, so the stack and tree stay
    /// balanced.
    pub fn exit_rule(&mut self) {
        self.rec.stack.pop();
        if self.rec.config.build_parse_tree {
            self.rec.tree.exit_rule();
        }
    }

    /// Match one terminal of kind `expected`.
    ///
    /// On a clean match the token is consumed and attached. Otherwise the
    /// strategy repairs (deletion or insertion) and still returns a token,
    /// or reports a mismatch and returns the error so the rule can unwind.
    ///
    /// # Errors
    ///
    /// [`RecognitionError::TokenMismatch`] when no local repair applied.
    pub fn match_token(&mut self, expected: K) -> Result<Token<K>, RecognitionError<K>> {
        if self.rec.lookahead(1).kind == expected {
            let token = self.rec.consume_matched();
            self.strategy.report_match();
            Ok(token)
        } else {
            self.strategy
                .recover_inline(&mut self.rec, &TokenSet::single(expected))
        }
    }

    /// Choose an alternative at a decision point by adaptive lookahead.
    /// Returns the 1-based alternative number; the lowest viable wins ties.
    ///
    /// # Errors
    ///
    /// When no alternative is viable the strategy reports, consumes the
    /// inspected tokens as error leaves, and the error is returned so the
    /// rule can unwind without selecting an alternative.
    pub fn predict(&mut self, decision: usize) -> Result<u32, RecognitionError<K>> {
        let automaton = Arc::clone(&self.rec.automaton);
        match prediction::adaptive_predict(
            &automaton,
            decision,
            &mut self.rec.stream,
            self.rec.config.max_lookahead,
        ) {
            Ok(alt) => Ok(alt),
            Err(error) => Err(self.strategy.recover_decision(&mut self.rec, error)),
        }
    }

    /// Stamp the chosen alternative on the current rule's context. Whether
    /// the number is retained depends on the context type.
    pub fn set_alt_number(&mut self, alt: u32) {
        if self.rec.config.build_parse_tree && self.rec.tree.current_rule().is_some() {
            self.rec.tree.current_context_mut().set_alt_number(alt);
        }
    }

    /// Resynchronize: ensure the next token is in `continuation`,
    /// discarding input as error leaves if needed.
    ///
    /// # Errors
    ///
    /// [`RecognitionError::RecoveryExhausted`] when the stream ends first.
    pub fn sync(&mut self, continuation: &TokenSet<K>) -> Result<(), RecognitionError<K>> {
        self.strategy.sync(&mut self.rec, continuation)
    }

    /// Look at the `k`-th upcoming token (1-based) without consuming it.
    pub fn lookahead(&mut self, k: usize) -> &Token<K> {
        self.rec.lookahead(k)
    }

    /// Whether the next token is the end-of-stream token.
    pub fn at_eof(&mut self) -> bool {
        self.rec.lookahead(1).is_eof()
    }

    /// Open a speculation mark on the stream.
    #[must_use]
    pub fn mark(&mut self) -> Mark {
        self.rec.stream.mark()
    }

    /// Roll the stream back to a mark.
    ///
    /// # Errors
    ///
    /// Fails when `mark` is not the innermost open mark.
    pub fn rewind(&mut self, mark: Mark) -> Result<(), StreamError> {
        self.rec.stream.rewind(mark)
    }

    /// Release a mark, keeping the current position.
    ///
    /// # Errors
    ///
    /// Fails when `mark` is not the innermost open mark.
    pub fn commit(&mut self, mark: Mark) -> Result<(), StreamError> {
        self.rec.stream.commit(mark)
    }

    /// Names of the rules currently being parsed, innermost first.
    #[must_use]
    pub fn rule_invocation_stack(&self) -> Vec<&str> {
        self.rec.stack.snapshot(&self.rec.automaton)
    }

    /// The parse tree built so far. Empty when tree building is disabled.
    #[must_use]
    pub fn tree(&self) -> &ParseTree<K, C> {
        &self.rec.tree
    }

    /// Render the tree to its parenthesized form.
    #[must_use]
    pub fn tree_string(&self, options: RenderOptions) -> String {
        tree_to_string(&self.rec.tree, &self.rec.automaton, options)
    }

    /// All diagnostics reported so far, in token-stream order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic<K>] {
        &self.rec.diagnostics
    }

    /// Whether the strategy is currently recovering.
    #[must_use]
    pub fn in_recovery(&self) -> bool {
        self.strategy.in_recovery()
    }

    /// Rewind the stream to the beginning and clear tree, stack,
    /// diagnostics, and recovery state, so the parser can run again.
    pub fn reset(&mut self) {
        self.rec.stream.seek_start();
        self.rec.tree = ParseTree::new();
        self.rec.stack.clear();
        self.rec.diagnostics.clear();
        self.strategy.reset();
    }
}
