//! Adaptive decision prediction.
//!
//! The predictor simulates every alternative of a decision against buffered
//! lookahead, eliminating alternatives step by step until one survives or
//! all are gone. The simulation consumes tokens only under a speculation
//! guard, so the stream position is restored on every exit path and no real
//! input is consumed; the caller matches tokens afterwards, guided by the
//! chosen alternative.

use crate::automaton::Automaton;
use crate::error::RecognitionError;
use crate::stream::{BufferedTokenStream, SpeculationGuard};
use crate::token::{TokenKind, TokenSet};
use compact_str::CompactString;
use smallvec::SmallVec;

/// Choose an alternative for `decision` by lookahead simulation.
///
/// Returns the 1-based alternative number. When several alternatives remain
/// viable after the lookahead is exhausted, the lowest-numbered one wins, so
/// grammar order resolves ambiguity deterministically. `max_lookahead`
/// bounds the simulation depth.
///
/// # Errors
///
/// [`RecognitionError::NoViableAlternative`] when every alternative is
/// eliminated; the error records the offending token, the depth reached,
/// and the union of the token sets still expected there.
///
/// # Panics
///
/// Panics if `decision` is not a decision of `automaton`.
pub fn adaptive_predict<K: TokenKind>(
    automaton: &Automaton<K>,
    decision: usize,
    stream: &mut BufferedTokenStream<K>,
    max_lookahead: usize,
) -> Result<u32, RecognitionError<K>> {
    let state = automaton
        .decision(decision)
        .expect("Internal error: prediction on an unknown decision index");
    let alts = state.alts();

    let mut viable: SmallVec<[usize; 8]> = (0..alts.len()).collect();
    let mut consumed = CompactString::default();
    let mut guard = SpeculationGuard::new(stream);
    let mut depth = 0usize;

    loop {
        // No surviving path reaches this depth: nothing left to discriminate.
        if depth >= max_lookahead || viable.iter().all(|&alt| alts[alt].len() <= depth) {
            break;
        }
        let token = guard.stream().consume();
        let survivors: SmallVec<[usize; 8]> = viable
            .iter()
            .copied()
            .filter(|&alt| match alts[alt].step(depth) {
                // An exhausted path accepts any continuation.
                None => true,
                Some(set) => set.contains(token.kind),
            })
            .collect();

        if survivors.is_empty() {
            let mut expected = TokenSet::new();
            for &alt in &viable {
                if let Some(set) = alts[alt].step(depth) {
                    expected.extend_from(set);
                }
            }
            consumed.push_str(&token.text);
            return Err(RecognitionError::NoViableAlternative {
                offending: token,
                decision,
                consumed,
                matched_depth: depth,
                expected,
            });
        }

        consumed.push_str(&token.text);
        let at_eof = token.is_eof();
        viable = survivors;
        if viable.len() == 1 || at_eof {
            break;
        }
        depth += 1;
    }

    // Ties resolve to the lowest alternative number; `viable` is kept in
    // ascending order by construction.
    Ok(u32::try_from(viable[0] + 1).unwrap_or(u32::MAX))
}
