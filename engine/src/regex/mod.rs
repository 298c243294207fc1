//! Vim-style pattern matching over a Thompson-constructed NFA.
//!
//! `compile` turns a pattern string into an immutable automaton;
//! matching owns all transient traversal state, so one compiled
//! pattern can serve any number of match calls.

pub mod matcher;
pub mod nfa;

mod parser;

use std::fmt;

pub use nfa::{Nfa, NfaState, StateId};

/// Transition-step budget for one match/find call. Pathological
/// backtracking runs out of budget instead of hanging the caller.
pub const DEFAULT_BUDGET: usize = 250_000;

/// An invalid pattern. Compilation fails atomically: no partially
/// built automaton is ever observable.
#[derive(Debug, Clone, PartialEq)]
pub struct RegexCompileError {
    pub message: String,
    /// Character position in the pattern.
    pub position: usize,
}

impl fmt::Display for RegexCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "E383: Invalid pattern: {} (at {})",
            self.message, self.position
        )
    }
}

impl std::error::Error for RegexCompileError {}

/// A match attempt that was cut off, not a pattern failure. Callers
/// report this as "no match" plus a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchError {
    BudgetExhausted,
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::BudgetExhausted => {
                write!(f, "pattern match aborted: step budget exhausted")
            }
        }
    }
}

impl std::error::Error for MatchError {}

/// A successful match: character offsets into the text, plus the
/// capture-group spans (`\1`..`\9`, index 1-based into `group`).
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    pub start: usize,
    pub end: usize,
    groups: Vec<Option<(usize, usize)>>,
}

impl PatternMatch {
    /// The span of capture group `n` (1-based), if it matched.
    pub fn group(&self, n: usize) -> Option<(usize, usize)> {
        self.groups.get(n.checked_sub(1)?).copied().flatten()
    }
}

/// A compiled pattern: the automaton plus its resolved case mode.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    nfa: Nfa,
    ignore_case: bool,
}

/// Compile `pattern` (magic mode). `ignore_case` is the ambient case
/// mode (the 'ignorecase' option); an embedded `\c`/`\C` overrides it.
pub fn compile(pattern: &str, ignore_case: bool) -> Result<CompiledPattern, RegexCompileError> {
    let parsed = parser::parse(pattern)?;
    let ignore_case = parsed.case_override.unwrap_or(ignore_case);
    let nfa = nfa::build(&parsed.ast, parsed.group_count);
    tracing::debug!(
        pattern,
        ignore_case,
        states = nfa.states.len(),
        "compiled pattern"
    );
    Ok(CompiledPattern { nfa, ignore_case })
}

impl CompiledPattern {
    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Try to match at exactly `offset` (a character offset). An offset
    /// at or past the end of the text is no match, never a fault.
    pub fn match_at(&self, text: &str, offset: usize) -> Result<Option<PatternMatch>, MatchError> {
        let mut budget = DEFAULT_BUDGET;
        self.match_at_with_budget(text, offset, &mut budget)
    }

    pub fn match_at_with_budget(
        &self,
        text: &str,
        offset: usize,
        budget: &mut usize,
    ) -> Result<Option<PatternMatch>, MatchError> {
        let chars: Vec<char> = text.chars().collect();
        if offset >= chars.len() && !(offset == 0 && chars.is_empty()) {
            return Ok(None);
        }
        self.attempt(&chars, offset, budget)
    }

    /// Find the leftmost match starting at or after `offset`.
    pub fn find_from(&self, text: &str, offset: usize) -> Result<Option<PatternMatch>, MatchError> {
        let mut budget = DEFAULT_BUDGET;
        self.find_from_with_budget(text, offset, &mut budget)
    }

    pub fn find_from_with_budget(
        &self,
        text: &str,
        offset: usize,
        budget: &mut usize,
    ) -> Result<Option<PatternMatch>, MatchError> {
        let chars: Vec<char> = text.chars().collect();
        let mut at = offset;
        while at <= chars.len() {
            if let Some(found) = self.attempt(&chars, at, budget)? {
                return Ok(Some(found));
            }
            at += 1;
        }
        Ok(None)
    }

    fn attempt(
        &self,
        chars: &[char],
        offset: usize,
        budget: &mut usize,
    ) -> Result<Option<PatternMatch>, MatchError> {
        if offset > chars.len() {
            return Ok(None);
        }
        let outcome = nfa::simulate(&self.nfa, chars, offset, self.ignore_case, budget)?;
        Ok(outcome.map(|(end, caps)| {
            let groups = (0..self.nfa.group_count)
                .map(|g| match (caps[2 * g], caps[2 * g + 1]) {
                    (Some(s), Some(e)) => Some((s, e)),
                    _ => None,
                })
                .collect();
            PatternMatch {
                start: offset,
                end,
                groups,
            }
        }))
    }
}
