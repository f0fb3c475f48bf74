//! Rule invocation bookkeeping.
//!
//! Purely diagnostic: the stack mirrors rule entry and exit so error
//! messages and debuggers can show where in the grammar the parse currently
//! is. Parsing decisions never consult it.

use crate::automaton::Automaton;
use crate::token::TokenKind;

/// The stack of rules currently being parsed.
#[derive(Debug, Clone, Default)]
pub struct InvocationStack {
    frames: Vec<usize>,
}

impl InvocationStack {
    /// An empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Record entry into a rule.
    pub fn push(&mut self, rule_index: usize) {
        self.frames.push(rule_index);
    }

    /// Record exit from the innermost rule.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty.
    pub fn pop(&mut self) -> usize {
        self.frames
            .pop()
            .expect("Internal error: rule exited with an empty invocation stack")
    }

    /// The innermost rule, if any rule is active.
    #[must_use]
    pub fn current(&self) -> Option<usize> {
        self.frames.last().copied()
    }

    /// Number of active rules.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether no rule is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Snapshot of the active rule names, innermost first.
    #[must_use]
    pub fn snapshot<'a, K: TokenKind>(&self, automaton: &'a Automaton<K>) -> Vec<&'a str> {
        self.frames
            .iter()
            .rev()
            .map(|&index| {
                automaton
                    .rule(index)
                    .expect("Internal error: invocation stack holds an unknown rule")
                    .name()
            })
            .collect()
    }

    /// Drop all frames.
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::AutomatonBuilder;
    use crate::token::TokenSet;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestKind {
        Eof,
    }

    impl TokenKind for TestKind {
        fn is_eof(self) -> bool {
            true
        }

        fn display_name(self) -> &'static str {
            "<EOF>"
        }
    }

    #[test]
    fn test_snapshot_is_innermost_first() {
        let mut builder: AutomatonBuilder<TestKind> = AutomatonBuilder::new();
        let r_s = builder.rule("s", 1, TokenSet::new());
        let r_a = builder.rule("a", 1, TokenSet::new());
        let automaton = builder.build().unwrap();

        let mut stack = InvocationStack::new();
        stack.push(r_s);
        stack.push(r_a);
        assert_eq!(stack.snapshot(&automaton), vec!["a", "s"]);
        assert_eq!(stack.current(), Some(r_a));

        stack.pop();
        assert_eq!(stack.snapshot(&automaton), vec!["s"]);
    }

    #[test]
    fn test_balanced_push_pop() {
        let mut stack = InvocationStack::new();
        assert!(stack.is_empty());
        stack.push(0);
        stack.push(1);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop(), 1);
        assert_eq!(stack.pop(), 0);
        assert!(stack.is_empty());
    }
}
