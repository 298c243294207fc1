use std::collections::HashSet;

use crate::regex::MatchError;
use crate::regex::matcher::{Matcher, chars_fold_eq};
use crate::regex::parser::PatternAst;

pub type StateId = usize;

/// One node of the automaton. Transitions are kept in priority order:
/// the simulator explores the first transition first, which is how
/// greedy and lazy quantifiers differ. Construction adds at most two
/// transitions per state.
#[derive(Debug, Clone, Default)]
pub struct NfaState {
    pub transitions: Vec<(Matcher, StateId)>,
    pub accept: bool,
}

/// The compiled automaton: an arena of states referenced by index.
/// Immutable after construction; all traversal state lives in the
/// per-match simulation below.
#[derive(Debug, Clone, Default)]
pub struct Nfa {
    pub states: Vec<NfaState>,
    pub start: StateId,
    pub group_count: usize,
}

impl Nfa {
    fn new_state(&mut self) -> StateId {
        self.states.push(NfaState::default());
        self.states.len() - 1
    }

    fn add_transition(&mut self, from: StateId, matcher: Matcher, to: StateId) {
        self.states[from].transitions.push((matcher, to));
    }
}

/// Thompson construction from the parsed pattern.
pub(crate) fn build(ast: &PatternAst, group_count: usize) -> Nfa {
    let mut nfa = Nfa::default();
    let start = nfa.new_state();
    let accept = nfa.new_state();
    nfa.start = start;
    nfa.group_count = group_count;
    compile_into(&mut nfa, ast, start, accept);
    nfa.states[accept].accept = true;
    nfa
}

/// Compile `ast` as a fragment from state `from` to state `to`.
fn compile_into(nfa: &mut Nfa, ast: &PatternAst, from: StateId, to: StateId) {
    match ast {
        PatternAst::Empty => nfa.add_transition(from, Matcher::Epsilon, to),
        PatternAst::Single(matcher) => nfa.add_transition(from, matcher.clone(), to),

        PatternAst::Concat(items) => {
            let mut current = from;
            for (i, item) in items.iter().enumerate() {
                let next = if i + 1 == items.len() {
                    to
                } else {
                    nfa.new_state()
                };
                compile_into(nfa, item, current, next);
                current = next;
            }
            if items.is_empty() {
                nfa.add_transition(from, Matcher::Epsilon, to);
            }
        }

        PatternAst::Alternate(branches) => match branches.as_slice() {
            [] => nfa.add_transition(from, Matcher::Epsilon, to),
            [only] => compile_into(nfa, only, from, to),
            [first, rest @ ..] => {
                // Keep every state at two transitions: a chain of
                // binary choices.
                let first_start = nfa.new_state();
                let rest_start = nfa.new_state();
                nfa.add_transition(from, Matcher::Epsilon, first_start);
                nfa.add_transition(from, Matcher::Epsilon, rest_start);
                compile_into(nfa, first, first_start, to);
                let rest_ast = PatternAst::Alternate(rest.to_vec());
                compile_into(nfa, &rest_ast, rest_start, to);
            }
        },

        PatternAst::Group(n, inner) => {
            let body_start = nfa.new_state();
            let body_end = nfa.new_state();
            nfa.add_transition(from, Matcher::GroupStart(*n), body_start);
            compile_into(nfa, inner, body_start, body_end);
            nfa.add_transition(body_end, Matcher::GroupEnd(*n), to);
        }

        PatternAst::Repeat {
            inner,
            min,
            max,
            lazy,
        } => {
            // Required copies first.
            let mut current = from;
            for _ in 0..*min {
                let next = nfa.new_state();
                compile_into(nfa, inner, current, next);
                current = next;
            }

            match max {
                None => {
                    // Unbounded tail: a binary choice between one more
                    // body iteration and moving on.
                    let choice = nfa.new_state();
                    nfa.add_transition(current, Matcher::Epsilon, choice);
                    let body_start = nfa.new_state();
                    compile_into(nfa, inner, body_start, choice);
                    if *lazy {
                        nfa.add_transition(choice, Matcher::Epsilon, to);
                        nfa.add_transition(choice, Matcher::Epsilon, body_start);
                    } else {
                        nfa.add_transition(choice, Matcher::Epsilon, body_start);
                        nfa.add_transition(choice, Matcher::Epsilon, to);
                    }
                }
                Some(max) => {
                    // Bounded tail: each optional copy may be skipped,
                    // and skipping one skips the rest.
                    for _ in *min..*max {
                        let choice = nfa.new_state();
                        nfa.add_transition(current, Matcher::Epsilon, choice);
                        let body_start = nfa.new_state();
                        let body_end = nfa.new_state();
                        compile_into(nfa, inner, body_start, body_end);
                        if *lazy {
                            nfa.add_transition(choice, Matcher::Epsilon, to);
                            nfa.add_transition(choice, Matcher::Epsilon, body_start);
                        } else {
                            nfa.add_transition(choice, Matcher::Epsilon, body_start);
                            nfa.add_transition(choice, Matcher::Epsilon, to);
                        }
                        current = body_end;
                    }
                    nfa.add_transition(current, Matcher::Epsilon, to);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// One backtracking thread: a state, an input position, and the capture
/// offsets recorded so far (2 slots per group).
struct Thread {
    state: StateId,
    pos: usize,
    caps: Vec<Option<usize>>,
}

/// Simulate the automaton against `text` starting at `start_pos`,
/// using an explicit worklist instead of the call stack. Transition
/// priority order makes this a depth-first backtracking search, so the
/// first accept found honours greedy/lazy semantics. Each call owns all
/// of its traversal state; the automaton itself is only read.
///
/// `budget` is decremented per explored transition and shared across
/// attempts; exhausting it aborts the match instead of hanging.
pub(crate) fn simulate(
    nfa: &Nfa,
    text: &[char],
    start_pos: usize,
    ignore_case: bool,
    budget: &mut usize,
) -> Result<Option<(usize, Vec<Option<usize>>)>, MatchError> {
    let mut stack = vec![Thread {
        state: nfa.start,
        pos: start_pos,
        caps: vec![None; 2 * nfa.group_count],
    }];
    // Guard against epsilon cycles (and re-exploration of dead
    // configurations): each (state, position) pair is visited once.
    let mut visited: HashSet<(StateId, usize)> = HashSet::new();

    while let Some(thread) = stack.pop() {
        if *budget == 0 {
            return Err(MatchError::BudgetExhausted);
        }
        *budget -= 1;

        if !visited.insert((thread.state, thread.pos)) {
            continue;
        }

        let state = &nfa.states[thread.state];
        if state.accept {
            return Ok(Some((thread.pos, thread.caps)));
        }

        // Push in reverse so the first transition is explored first.
        for (matcher, target) in state.transitions.iter().rev() {
            match matcher {
                Matcher::GroupStart(n) => {
                    let mut caps = thread.caps.clone();
                    caps[2 * n] = Some(thread.pos);
                    stack.push(Thread {
                        state: *target,
                        pos: thread.pos,
                        caps,
                    });
                }
                Matcher::GroupEnd(n) => {
                    let mut caps = thread.caps.clone();
                    caps[2 * n + 1] = Some(thread.pos);
                    stack.push(Thread {
                        state: *target,
                        pos: thread.pos,
                        caps,
                    });
                }
                Matcher::Backref(n) => {
                    let (start, end) = match (thread.caps[2 * n], thread.caps[2 * n + 1]) {
                        (Some(s), Some(e)) if s <= e => (s, e),
                        // An unmatched group backreference matches the
                        // empty string.
                        _ => (thread.pos, thread.pos),
                    };
                    let length = end - start;
                    if backref_matches(text, thread.pos, start, length, ignore_case) {
                        stack.push(Thread {
                            state: *target,
                            pos: thread.pos + length,
                            caps: thread.caps.clone(),
                        });
                    }
                }
                m if m.is_epsilon() => {
                    if m.matches_position(text, thread.pos) {
                        stack.push(Thread {
                            state: *target,
                            pos: thread.pos,
                            caps: thread.caps.clone(),
                        });
                    }
                }
                m => {
                    if m.matches_char(text, thread.pos, ignore_case) {
                        stack.push(Thread {
                            state: *target,
                            pos: thread.pos + 1,
                            caps: thread.caps.clone(),
                        });
                    }
                }
            }
        }
    }

    Ok(None)
}

fn backref_matches(
    text: &[char],
    pos: usize,
    capture_start: usize,
    length: usize,
    ignore_case: bool,
) -> bool {
    if pos + length > text.len() {
        return false;
    }
    for i in 0..length {
        let a = text[pos + i];
        let b = text[capture_start + i];
        let equal = if ignore_case { chars_fold_eq(a, b) } else { a == b };
        if !equal {
            return false;
        }
    }
    true
}
