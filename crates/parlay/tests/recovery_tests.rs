//! Error recovery: single-token deletion and insertion, mismatch
//! reporting, and sync-point resynchronization.

use parlay::automaton::{AltPath, Automaton, AutomatonBuilder};
use parlay::error::RecognitionError;
use parlay::parser::Parser;
use parlay::render::RenderOptions;
use parlay::stream::BufferedTokenStream;
use parlay::token::{Token, TokenKind, TokenSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    X,
    Y,
    Z,
    Bang,
    Eof,
}

impl TokenKind for Kind {
    fn is_eof(self) -> bool {
        matches!(self, Self::Eof)
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::X => "'x'",
            Self::Y => "'y'",
            Self::Z => "'z'",
            Self::Bang => "'!'",
            Self::Eof => "<EOF>",
        }
    }
}

fn lex(input: &str) -> Vec<Token<Kind>> {
    input
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let kind = match c {
                'x' => Kind::X,
                'y' => Kind::Y,
                'z' => Kind::Z,
                '!' => Kind::Bang,
                other => panic!("unexpected input character {other:?}"),
            };
            Token::new(kind, c.to_string(), i).with_position(1, u32::try_from(i).unwrap())
        })
        .collect()
}

fn parser_for(automaton: Arc<Automaton<Kind>>, input: &str) -> Parser<Kind> {
    let stream = BufferedTokenStream::from_tokens(lex(input), Kind::Eof);
    Parser::new(automaton, stream)
}

fn messages(parser: &Parser<Kind>) -> Vec<String> {
    parser.diagnostics().iter().map(ToString::to_string).collect()
}

#[test]
fn extra_token_is_deleted() {
    // a : 'x' 'y' ;  input "xzy"
    let mut builder = AutomatonBuilder::new();
    let rule_a = builder.rule("a", 1, TokenSet::single(Kind::Eof));
    let automaton = Arc::new(builder.build().unwrap());

    let mut parser = parser_for(automaton, "xzy");
    parser.enter_rule(rule_a, 0);
    parser.match_token(Kind::X).unwrap();
    let matched = parser.match_token(Kind::Y).unwrap();
    parser.exit_rule();

    assert_eq!(matched.kind, Kind::Y);
    assert_eq!(parser.tree_string(RenderOptions::default()), "(a x z y)");
    assert_eq!(
        messages(&parser),
        vec!["line 1:1 extraneous input 'z' expecting 'y'"]
    );
    assert!(!parser.in_recovery());
}

#[test]
fn unviable_first_token_reports_mismatch() {
    // a : 'x' | 'y' ;  input "z"
    let mut builder = AutomatonBuilder::new();
    let rule_a = builder.rule("a", 2, TokenSet::single(Kind::Eof));
    let decision = builder.decision(
        rule_a,
        vec![
            AltPath::new([TokenSet::single(Kind::X)]),
            AltPath::new([TokenSet::single(Kind::Y)]),
        ],
    );
    let automaton = Arc::new(builder.build().unwrap());

    let mut parser = parser_for(automaton, "z");
    parser.enter_rule(rule_a, 0);
    let err = parser.predict(decision).unwrap_err();
    parser.exit_rule();

    assert!(matches!(err, RecognitionError::TokenMismatch { .. }));
    assert_eq!(parser.tree_string(RenderOptions::default()), "(a z)");
    assert_eq!(
        messages(&parser),
        vec!["line 1:0 mismatched input 'z' expecting {'x', 'y'}"]
    );
}

#[test]
fn deep_prediction_failure_reports_no_viable_alternative() {
    // a : 'x' 'y' | 'x' 'x' ;  input "xz"
    let mut builder = AutomatonBuilder::new();
    let rule_a = builder.rule("a", 2, TokenSet::single(Kind::Eof));
    let decision = builder.decision(
        rule_a,
        vec![
            AltPath::new([TokenSet::single(Kind::X), TokenSet::single(Kind::Y)]),
            AltPath::new([TokenSet::single(Kind::X), TokenSet::single(Kind::X)]),
        ],
    );
    let automaton = Arc::new(builder.build().unwrap());

    let mut parser = parser_for(automaton, "xz");
    parser.enter_rule(rule_a, 0);
    let err = parser.predict(decision).unwrap_err();
    parser.exit_rule();

    assert!(matches!(
        err,
        RecognitionError::NoViableAlternative { .. }
    ));
    // Both inspected tokens become error leaves.
    assert_eq!(parser.tree_string(RenderOptions::default()), "(a x z)");
    assert_eq!(
        messages(&parser),
        vec!["line 1:1 no viable alternative at input 'xz'"]
    );
}

#[test]
fn sync_discards_to_continuation_set() {
    // a : 'x' 'y'* '!' ;  input "xzyy!"
    let mut builder = AutomatonBuilder::new();
    let rule_a = builder.rule("a", 1, TokenSet::single(Kind::Eof));
    let automaton = Arc::new(builder.build().unwrap());
    let continuation: TokenSet<Kind> = [Kind::Y, Kind::Bang].into_iter().collect();

    let mut parser = parser_for(automaton, "xzyy!");
    parser.enter_rule(rule_a, 0);
    parser.match_token(Kind::X).unwrap();
    loop {
        if parser.sync(&continuation).is_err() {
            break;
        }
        if parser.lookahead(1).kind == Kind::Y {
            parser.match_token(Kind::Y).unwrap();
        } else {
            break;
        }
    }
    let _ = parser.match_token(Kind::Bang);
    parser.exit_rule();

    assert_eq!(
        parser.tree_string(RenderOptions::default()),
        "(a x z y y !)"
    );
    assert_eq!(
        messages(&parser),
        vec!["line 1:1 extraneous input 'z' expecting {'y', '!'}"]
    );
}

#[test]
fn missing_token_is_conjured() {
    // s : a 'z' ;  a : 'x' 'y' ;  input "xz"
    let mut builder = AutomatonBuilder::new();
    let rule_s = builder.rule("s", 1, TokenSet::single(Kind::Eof));
    let rule_a = builder.rule("a", 1, TokenSet::single(Kind::Z));
    let automaton = Arc::new(builder.build().unwrap());

    let mut parser = parser_for(automaton, "xz");
    parser.enter_rule(rule_s, 0);
    parser.enter_rule(rule_a, 0);
    parser.match_token(Kind::X).unwrap();
    let conjured = parser.match_token(Kind::Y).unwrap();
    parser.exit_rule();
    parser.match_token(Kind::Z).unwrap();
    parser.exit_rule();

    assert_eq!(conjured.kind, Kind::Y);
    assert_eq!(conjured.text, "<missing 'y'>");
    assert_eq!(
        parser.tree_string(RenderOptions::default()),
        "(s (a x <missing 'y'>) z)"
    );
    assert_eq!(messages(&parser), vec!["line 1:1 missing 'y' at 'z'"]);
}

#[test]
fn missing_token_at_end_of_stream() {
    // a : 'x' 'y' ;  with EOF in follow(a), input "x"
    let mut builder = AutomatonBuilder::new();
    let rule_a = builder.rule("a", 1, TokenSet::single(Kind::Eof));
    let automaton = Arc::new(builder.build().unwrap());

    let mut parser = parser_for(automaton, "x");
    parser.enter_rule(rule_a, 0);
    parser.match_token(Kind::X).unwrap();
    parser.match_token(Kind::Y).unwrap();
    parser.exit_rule();

    assert_eq!(
        parser.tree_string(RenderOptions::default()),
        "(a x <missing 'y'>)"
    );
    assert_eq!(messages(&parser), vec!["line 1:1 missing 'y' at <EOF>"]);
}

#[test]
fn mismatch_never_consumes_end_of_stream() {
    // a : 'x' 'y' ;  empty follow, input "x"
    let mut builder = AutomatonBuilder::new();
    let rule_a = builder.rule("a", 1, TokenSet::new());
    let automaton = Arc::new(builder.build().unwrap());

    let mut parser = parser_for(automaton, "x");
    parser.enter_rule(rule_a, 0);
    parser.match_token(Kind::X).unwrap();
    let err = parser.match_token(Kind::Y).unwrap_err();
    parser.exit_rule();

    assert!(matches!(err, RecognitionError::TokenMismatch { .. }));
    // The end-of-stream token never becomes an error leaf.
    assert_eq!(parser.tree_string(RenderOptions::default()), "(a x)");
    assert_eq!(
        messages(&parser),
        vec!["line 1:1 mismatched input <EOF> expecting 'y'"]
    );
}

#[test]
fn recovery_mode_suppresses_repeat_reports() {
    // input "zzy": the first 'z' is a reported mismatch; the second is
    // repaired by deletion without a second diagnostic
    let mut builder = AutomatonBuilder::new();
    let rule_a = builder.rule("a", 1, TokenSet::new());
    let automaton = Arc::new(builder.build().unwrap());

    let mut parser = parser_for(automaton, "zzy");
    parser.enter_rule(rule_a, 0);
    assert!(parser.match_token(Kind::Y).is_err());
    assert!(parser.in_recovery());
    // The repair succeeds silently and ends recovery mode.
    parser.match_token(Kind::Y).unwrap();
    assert!(!parser.in_recovery());
    parser.exit_rule();

    assert_eq!(
        messages(&parser),
        vec!["line 1:0 mismatched input 'z' expecting 'y'"]
    );
    assert_eq!(parser.tree_string(RenderOptions::default()), "(a z z y)");
}

#[test]
fn sync_exhausts_at_end_of_stream() {
    let mut builder = AutomatonBuilder::new();
    let rule_a = builder.rule("a", 1, TokenSet::new());
    let automaton = Arc::new(builder.build().unwrap());
    let continuation = TokenSet::single(Kind::Y);

    let mut parser = parser_for(automaton, "zz");
    parser.enter_rule(rule_a, 0);
    let err = parser.sync(&continuation).unwrap_err();
    parser.exit_rule();

    assert!(matches!(err, RecognitionError::RecoveryExhausted { .. }));
    // Everything up to the end of the stream was discarded, with a single
    // diagnostic for the first discarded token.
    assert_eq!(parser.tree_string(RenderOptions::default()), "(a z z)");
    assert_eq!(
        messages(&parser),
        vec!["line 1:0 extraneous input 'z' expecting 'y'"]
    );
}

#[test]
fn sync_is_a_no_op_on_acceptable_input() {
    let mut builder = AutomatonBuilder::new();
    let rule_a = builder.rule("a", 1, TokenSet::new());
    let automaton = Arc::new(builder.build().unwrap());

    let mut parser = parser_for(automaton, "y");
    parser.enter_rule(rule_a, 0);
    parser.sync(&TokenSet::single(Kind::Y)).unwrap();
    parser.match_token(Kind::Y).unwrap();
    parser.exit_rule();

    assert!(parser.diagnostics().is_empty());
    assert_eq!(parser.tree_string(RenderOptions::default()), "(a y)");
}

#[test]
fn diagnostics_arrive_in_stream_order() {
    // a : 'x' 'y' 'x' 'y' ;  input "xzyxzy"
    let mut builder = AutomatonBuilder::new();
    let rule_a = builder.rule("a", 1, TokenSet::new());
    let automaton = Arc::new(builder.build().unwrap());

    let mut parser = parser_for(automaton, "xzyxzy");
    parser.enter_rule(rule_a, 0);
    parser.match_token(Kind::X).unwrap();
    parser.match_token(Kind::Y).unwrap();
    parser.match_token(Kind::X).unwrap();
    parser.match_token(Kind::Y).unwrap();
    parser.exit_rule();

    assert_eq!(
        messages(&parser),
        vec![
            "line 1:1 extraneous input 'z' expecting 'y'",
            "line 1:4 extraneous input 'z' expecting 'y'",
        ]
    );
    assert_eq!(
        parser.tree_string(RenderOptions::default()),
        "(a x z y x z y)"
    );
}

#[test]
fn listener_receives_every_diagnostic() {
    use parlay::error::{Diagnostic, DiagnosticListener};
    use std::sync::mpsc;

    struct Channel(mpsc::Sender<String>);

    impl DiagnosticListener<Kind> for Channel {
        fn syntax_error(&mut self, diagnostic: &Diagnostic<Kind>) {
            self.0.send(diagnostic.to_string()).unwrap();
        }
    }

    let mut builder = AutomatonBuilder::new();
    let rule_a = builder.rule("a", 1, TokenSet::new());
    let automaton = Arc::new(builder.build().unwrap());

    let (tx, rx) = mpsc::channel();
    let mut parser = parser_for(automaton, "xzy");
    parser.add_listener(Box::new(Channel(tx)));
    parser.enter_rule(rule_a, 0);
    parser.match_token(Kind::X).unwrap();
    parser.match_token(Kind::Y).unwrap();
    parser.exit_rule();

    let received: Vec<String> = rx.try_iter().collect();
    assert_eq!(
        received,
        vec!["line 1:1 extraneous input 'z' expecting 'y'".to_string()]
    );
}
