//! # Parse Tree
//!
//! Arena-backed parse trees built incrementally during recognition.
//!
//! Nodes live in a [`ParseTree`] arena and refer to each other through
//! [`NodeId`] indices, so parent back-references are plain indices rather
//! than shared-ownership cycles. The node shape is the closed [`Node`] enum:
//! rule contexts, matched terminals, and error leaves produced by recovery.
//!
//! Rule nodes carry a caller-chosen context type implementing
//! [`RuleContext`]. The runtime only asks a context to track the predicted
//! alternative number; implementations are free to add their own fields on
//! top. [`BaseContext`] discards alternative numbers, [`AltContext`] records
//! them.

use crate::token::{Token, TokenKind};
use smallvec::SmallVec;
use std::fmt;

/// Index of a node in a [`ParseTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Per-rule-node state attached by the grammar author.
///
/// The runtime stamps the predicted alternative through
/// [`set_alt_number`](RuleContext::set_alt_number); whether that number is
/// retained is up to the implementation. Custom implementations may carry
/// arbitrary extra fields.
pub trait RuleContext: Default + fmt::Debug {
    /// The alternative number stamped on this context, if tracked.
    fn alt_number(&self) -> Option<u32>;

    /// Record the 1-based alternative number chosen for this context.
    fn set_alt_number(&mut self, alt: u32);
}

/// The no-op context: alternative numbers are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BaseContext;

impl RuleContext for BaseContext {
    fn alt_number(&self) -> Option<u32> {
        None
    }

    fn set_alt_number(&mut self, _alt: u32) {}
}

/// A context that records the stamped alternative number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AltContext {
    alt: Option<u32>,
}

impl RuleContext for AltContext {
    fn alt_number(&self) -> Option<u32> {
        self.alt
    }

    fn set_alt_number(&mut self, alt: u32) {
        self.alt = Some(alt);
    }
}

/// Interior node for one rule invocation.
#[derive(Debug)]
pub struct RuleNode<C: RuleContext> {
    /// Index of the invoked rule in the automaton.
    pub rule_index: usize,
    /// Automaton state the invoking rule resumed from.
    pub invoking_state: usize,
    /// Caller-chosen context state.
    pub context: C,
    children: SmallVec<[NodeId; 4]>,
    start: Option<usize>,
    stop: Option<usize>,
}

impl<C: RuleContext> RuleNode<C> {
    /// Child nodes, in the order they were attached.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Stream index of the first token matched under this rule.
    #[must_use]
    pub const fn start_index(&self) -> Option<usize> {
        self.start
    }

    /// Stream index of the last token matched under this rule.
    #[must_use]
    pub const fn stop_index(&self) -> Option<usize> {
        self.stop
    }
}

/// Leaf node for a successfully matched token.
#[derive(Debug)]
pub struct TerminalNode<K: TokenKind> {
    pub token: Token<K>,
}

/// Leaf node for a token consumed or conjured during error recovery.
#[derive(Debug)]
pub struct ErrorNode<K: TokenKind> {
    pub token: Token<K>,
    /// `true` when the token was conjured by single-token insertion rather
    /// than consumed from the stream.
    pub inserted: bool,
}

/// The closed set of parse tree node shapes.
#[derive(Debug)]
pub enum Node<K: TokenKind, C: RuleContext> {
    Rule(RuleNode<C>),
    Terminal(TerminalNode<K>),
    Error(ErrorNode<K>),
}

struct NodeEntry<K: TokenKind, C: RuleContext> {
    parent: Option<NodeId>,
    node: Node<K, C>,
}

/// An arena-backed parse tree under construction.
///
/// Children are appended in match order and never reordered. While a rule is
/// open, every added leaf updates the start/stop token indices of all open
/// ancestors, so a finished rule node always covers its descendants.
pub struct ParseTree<K: TokenKind, C: RuleContext = BaseContext> {
    entries: Vec<NodeEntry<K, C>>,
    root: Option<NodeId>,
    open: SmallVec<[NodeId; 8]>,
}

impl<K: TokenKind, C: RuleContext> Default for ParseTree<K, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: TokenKind, C: RuleContext> ParseTree<K, C> {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            root: None,
            open: SmallVec::new(),
        }
    }

    fn push(&mut self, parent: Option<NodeId>, node: Node<K, C>) -> NodeId {
        let id = NodeId(u32::try_from(self.entries.len()).expect("Internal error: tree arena overflow"));
        self.entries.push(NodeEntry { parent, node });
        if let Some(parent) = parent {
            match &mut self.entries[parent.index()].node {
                Node::Rule(rule) => rule.children.push(id),
                _ => panic!("Internal error: parent node is not a rule node"),
            }
        }
        id
    }

    /// Open a rule node under the current rule (or as the root) and make it
    /// the current rule.
    ///
    /// # Panics
    ///
    /// Panics if the tree already has a finished root.
    pub fn enter_rule(&mut self, rule_index: usize, invoking_state: usize) -> NodeId {
        let parent = self.open.last().copied();
        assert!(
            parent.is_some() || self.root.is_none(),
            "Internal error: rule entered after the root rule finished"
        );
        let id = self.push(
            parent,
            Node::Rule(RuleNode {
                rule_index,
                invoking_state,
                context: C::default(),
                children: SmallVec::new(),
                start: None,
                stop: None,
            }),
        );
        if parent.is_none() {
            self.root = Some(id);
        }
        self.open.push(id);
        id
    }

    /// Close the current rule node, returning its id.
    ///
    /// # Panics
    ///
    /// Panics if no rule is open.
    pub fn exit_rule(&mut self) -> NodeId {
        self.open
            .pop()
            .expect("Internal error: exit_rule without a matching enter_rule")
    }

    fn add_leaf(&mut self, node: Node<K, C>, token_index: usize) -> NodeId {
        let parent = self
            .open
            .last()
            .copied()
            .expect("Internal error: leaf added with no open rule");
        let id = self.push(Some(parent), node);
        for &open_id in &self.open {
            if let Node::Rule(rule) = &mut self.entries[open_id.index()].node {
                rule.start.get_or_insert(token_index);
                rule.stop = Some(token_index);
            }
        }
        id
    }

    /// Attach a matched token under the current rule.
    pub fn add_token(&mut self, token: Token<K>) -> NodeId {
        let index = token.index;
        self.add_leaf(Node::Terminal(TerminalNode { token }), index)
    }

    /// Attach an error leaf under the current rule.
    pub fn add_error_token(&mut self, token: Token<K>, inserted: bool) -> NodeId {
        let index = token.index;
        self.add_leaf(Node::Error(ErrorNode { token, inserted }), index)
    }

    /// Context of the current rule.
    ///
    /// # Panics
    ///
    /// Panics if no rule is open.
    pub fn current_context_mut(&mut self) -> &mut C {
        let id = *self
            .open
            .last()
            .expect("Internal error: no open rule");
        match &mut self.entries[id.index()].node {
            Node::Rule(rule) => &mut rule.context,
            _ => unreachable!("open stack holds only rule nodes"),
        }
    }

    /// Id of the current (innermost open) rule node.
    #[must_use]
    pub fn current_rule(&self) -> Option<NodeId> {
        self.open.last().copied()
    }

    /// Number of open rule nodes.
    #[must_use]
    pub fn open_depth(&self) -> usize {
        self.open.len()
    }

    /// The root node, once the outermost rule has been entered.
    #[must_use]
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Look up a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node<K, C> {
        &self.entries[id.index()].node
    }

    /// Parent of a node, `None` for the root.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entries[id.index()].parent
    }

    /// Children of a node; empty for leaves.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Node::Rule(rule) => rule.children(),
            _ => &[],
        }
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: TokenKind, C: RuleContext> fmt::Debug for ParseTree<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseTree")
            .field("nodes", &self.entries.len())
            .field("open", &self.open.len())
            .field("root", &self.root)
            .finish()
    }
}
