//! # Prediction Tables
//!
//! The immutable automaton a parser consults at decision points.
//!
//! An [`Automaton`] is produced once — by a grammar compiler outside this
//! crate, or by hand through [`AutomatonBuilder`] — and then shared
//! read-only across any number of concurrent parses behind an `Arc`. It
//! records, per rule, the name and alternative count used for rendering and
//! diagnostics plus the follow set that drives single-token insertion, and,
//! per decision point, the lookahead paths of every alternative.

use crate::token::{TokenKind, TokenSet};
use compact_str::CompactString;
use hashbrown::HashMap;
use smallvec::SmallVec;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Static facts about one grammar rule.
#[derive(Debug, Clone)]
pub struct RuleInfo<K: TokenKind> {
    name: CompactString,
    alt_count: u32,
    follow: TokenSet<K>,
}

impl<K: TokenKind> RuleInfo<K> {
    /// The rule name, as written in the grammar.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of top-level alternatives the rule declares.
    #[must_use]
    pub const fn alt_count(&self) -> u32 {
        self.alt_count
    }

    /// Tokens that may follow an invocation of this rule.
    #[must_use]
    pub const fn follow(&self) -> &TokenSet<K> {
        &self.follow
    }
}

/// The lookahead shape of one alternative at a decision point: the token
/// sets the alternative can begin with, one set per lookahead depth.
///
/// An exhausted path keeps the alternative viable at deeper lookahead — a
/// shorter alternative accepts any continuation.
#[derive(Debug, Clone)]
pub struct AltPath<K: TokenKind> {
    steps: SmallVec<[TokenSet<K>; 4]>,
}

impl<K: TokenKind> AltPath<K> {
    /// Build a path from its per-depth token sets.
    #[must_use]
    pub fn new(steps: impl IntoIterator<Item = TokenSet<K>>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    /// The empty path: viable on any input (an epsilon alternative).
    #[must_use]
    pub fn epsilon() -> Self {
        Self {
            steps: SmallVec::new(),
        }
    }

    /// The token set at the given 0-based lookahead depth, if the path
    /// reaches that deep.
    #[must_use]
    pub fn step(&self, depth: usize) -> Option<&TokenSet<K>> {
        self.steps.get(depth)
    }

    /// Number of lookahead steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether this is an epsilon path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// One decision point: the alternatives of a rule or subrule, in grammar
/// order. Alternative numbers are 1-based positions into `alts`.
#[derive(Debug, Clone)]
pub struct DecisionState<K: TokenKind> {
    rule_index: usize,
    alts: Vec<AltPath<K>>,
}

impl<K: TokenKind> DecisionState<K> {
    /// The rule this decision belongs to.
    #[must_use]
    pub const fn rule_index(&self) -> usize {
        self.rule_index
    }

    /// The alternatives, in grammar order.
    #[must_use]
    pub fn alts(&self) -> &[AltPath<K>] {
        &self.alts
    }
}

/// Errors building an automaton.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum AutomatonError {
    #[error("duplicate rule name '{name}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(automaton::duplicate_rule)))]
    DuplicateRule { name: String },

    #[error("decision {decision} refers to unknown rule index {rule_index}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(automaton::unknown_rule)))]
    UnknownRule { decision: usize, rule_index: usize },

    #[error("decision {decision} has no alternatives")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(automaton::empty_decision)))]
    EmptyDecision { decision: usize },
}

/// The shared prediction tables. Immutable after
/// [`AutomatonBuilder::build`]; `Send + Sync`, so independent parses may
/// share one instance via `Arc` with no locking.
#[derive(Debug, Clone)]
pub struct Automaton<K: TokenKind> {
    rules: Vec<RuleInfo<K>>,
    decisions: Vec<DecisionState<K>>,
    rule_names: HashMap<CompactString, usize>,
}

impl<K: TokenKind> Automaton<K> {
    /// Look up a rule by index.
    #[must_use]
    pub fn rule(&self, index: usize) -> Option<&RuleInfo<K>> {
        self.rules.get(index)
    }

    /// Look up a rule index by name.
    #[must_use]
    pub fn rule_by_name(&self, name: &str) -> Option<usize> {
        self.rule_names.get(name).copied()
    }

    /// Look up a decision by index.
    #[must_use]
    pub fn decision(&self, index: usize) -> Option<&DecisionState<K>> {
        self.decisions.get(index)
    }

    /// Number of rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Number of decision points.
    #[must_use]
    pub fn decision_count(&self) -> usize {
        self.decisions.len()
    }
}

/// Builder for [`Automaton`]. Rule and decision indices are assigned in
/// insertion order.
#[derive(Debug, Default)]
pub struct AutomatonBuilder<K: TokenKind> {
    rules: Vec<RuleInfo<K>>,
    decisions: Vec<DecisionState<K>>,
}

impl<K: TokenKind> AutomatonBuilder<K> {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            decisions: Vec::new(),
        }
    }

    /// Add a rule, returning its index.
    pub fn rule(
        &mut self,
        name: impl Into<CompactString>,
        alt_count: u32,
        follow: TokenSet<K>,
    ) -> usize {
        self.rules.push(RuleInfo {
            name: name.into(),
            alt_count,
            follow,
        });
        self.rules.len() - 1
    }

    /// Add a decision point for a rule, returning its index.
    pub fn decision(&mut self, rule_index: usize, alts: Vec<AltPath<K>>) -> usize {
        self.decisions.push(DecisionState { rule_index, alts });
        self.decisions.len() - 1
    }

    /// Validate and freeze the automaton.
    ///
    /// # Errors
    ///
    /// Fails on duplicate rule names, decisions referencing unknown rules,
    /// or decisions with no alternatives.
    pub fn build(self) -> Result<Automaton<K>, AutomatonError> {
        let mut rule_names = HashMap::with_capacity(self.rules.len());
        for (index, rule) in self.rules.iter().enumerate() {
            if rule_names.insert(rule.name.clone(), index).is_some() {
                return Err(AutomatonError::DuplicateRule {
                    name: rule.name.to_string(),
                });
            }
        }
        for (index, decision) in self.decisions.iter().enumerate() {
            if decision.rule_index >= self.rules.len() {
                return Err(AutomatonError::UnknownRule {
                    decision: index,
                    rule_index: decision.rule_index,
                });
            }
            if decision.alts.is_empty() {
                return Err(AutomatonError::EmptyDecision { decision: index });
            }
        }
        Ok(Automaton {
            rules: self.rules,
            decisions: self.decisions,
            rule_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestKind {
        X,
        Y,
        Eof,
    }

    impl TokenKind for TestKind {
        fn is_eof(self) -> bool {
            matches!(self, Self::Eof)
        }

        fn display_name(self) -> &'static str {
            match self {
                Self::X => "'x'",
                Self::Y => "'y'",
                Self::Eof => "<EOF>",
            }
        }
    }

    #[test]
    fn test_build_and_lookup() {
        let mut builder = AutomatonBuilder::new();
        let r_s = builder.rule("s", 1, TokenSet::single(TestKind::Eof));
        let r_a = builder.rule("a", 2, TokenSet::single(TestKind::Eof));
        let d = builder.decision(
            r_a,
            vec![
                AltPath::new([TokenSet::single(TestKind::X)]),
                AltPath::new([TokenSet::single(TestKind::Y)]),
            ],
        );
        let automaton = builder.build().unwrap();

        assert_eq!(automaton.rule(r_s).unwrap().name(), "s");
        assert_eq!(automaton.rule(r_a).unwrap().alt_count(), 2);
        assert_eq!(automaton.rule_by_name("a"), Some(r_a));
        assert_eq!(automaton.decision(d).unwrap().rule_index(), r_a);
        assert_eq!(automaton.decision(d).unwrap().alts().len(), 2);
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let mut builder: AutomatonBuilder<TestKind> = AutomatonBuilder::new();
        builder.rule("a", 1, TokenSet::new());
        builder.rule("a", 2, TokenSet::new());
        let err = builder.build().unwrap_err();
        assert!(matches!(err, AutomatonError::DuplicateRule { .. }));
    }

    #[test]
    fn test_unknown_rule_rejected() {
        let mut builder: AutomatonBuilder<TestKind> = AutomatonBuilder::new();
        builder.decision(3, vec![AltPath::epsilon()]);
        let err = builder.build().unwrap_err();
        assert!(matches!(err, AutomatonError::UnknownRule { .. }));
    }

    #[test]
    fn test_empty_decision_rejected() {
        let mut builder: AutomatonBuilder<TestKind> = AutomatonBuilder::new();
        let r = builder.rule("a", 1, TokenSet::new());
        builder.decision(r, Vec::new());
        let err = builder.build().unwrap_err();
        assert!(matches!(err, AutomatonError::EmptyDecision { .. }));
    }

    #[test]
    fn test_epsilon_path_viable_at_any_depth() {
        let path: AltPath<TestKind> = AltPath::epsilon();
        assert!(path.is_empty());
        assert!(path.step(0).is_none());
    }
}
