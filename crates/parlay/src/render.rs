//! Parenthesized parse tree rendering.
//!
//! Produces the `(rule child…)` form used throughout diagnostics and tests:
//! rule nodes render as their rule name followed by their children, leaves
//! render as their matched text. With [`RenderOptions::alt_numbers`] enabled,
//! a rule name gains a `:N` suffix when its context tracked the predicted
//! alternative and the rule declares more than one alternative.

use crate::automaton::Automaton;
use crate::token::{Token, TokenKind};
use crate::tree::{Node, NodeId, ParseTree, RuleContext};
use std::fmt::Write;

/// Options for [`tree_to_string`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Suffix multi-alternative rule names with the stamped alternative
    /// number (`a:3`).
    pub alt_numbers: bool,
}

impl RenderOptions {
    /// Options with alternative-number suffixes enabled.
    #[must_use]
    pub const fn with_alt_numbers() -> Self {
        Self { alt_numbers: true }
    }
}

/// Render a tree rooted at `tree.root()` to its parenthesized form.
///
/// Returns the empty string for a tree with no root.
#[must_use]
pub fn tree_to_string<K: TokenKind, C: RuleContext>(
    tree: &ParseTree<K, C>,
    automaton: &Automaton<K>,
    options: RenderOptions,
) -> String {
    let mut out = String::new();
    if let Some(root) = tree.root() {
        render_node(tree, automaton, options, root, &mut out);
    }
    out
}

fn render_node<K: TokenKind, C: RuleContext>(
    tree: &ParseTree<K, C>,
    automaton: &Automaton<K>,
    options: RenderOptions,
    id: NodeId,
    out: &mut String,
) {
    match tree.node(id) {
        Node::Rule(rule) => {
            let info = automaton
                .rule(rule.rule_index)
                .expect("Internal error: rule node refers to an unknown rule");
            let suffix = if options.alt_numbers && info.alt_count() > 1 {
                rule.context.alt_number()
            } else {
                None
            };
            let children = rule.children();
            if children.is_empty() {
                write_name(out, info.name(), suffix);
                return;
            }
            out.push('(');
            write_name(out, info.name(), suffix);
            for &child in children {
                out.push(' ');
                render_node(tree, automaton, options, child, out);
            }
            out.push(')');
        }
        Node::Terminal(terminal) => write_leaf(out, &terminal.token),
        Node::Error(error) => write_leaf(out, &error.token),
    }
}

fn write_name(out: &mut String, name: &str, suffix: Option<u32>) {
    match suffix {
        Some(alt) => {
            let _ = write!(out, "{name}:{alt}");
        }
        None => out.push_str(name),
    }
}

fn write_leaf<K: TokenKind>(out: &mut String, token: &Token<K>) {
    if token.is_eof() {
        out.push_str("<EOF>");
    } else {
        out.push_str(&token.text);
    }
}
