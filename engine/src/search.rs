use crate::editor::VimEditor;
use crate::error::EngineError;
use crate::regex::{self, CompiledPattern, PatternMatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Remembers the last search so "repeat last search" motions and
/// empty-pattern `:substitute` can reuse it.
#[derive(Debug, Clone)]
pub struct SearchState {
    pub last_pattern: Option<String>,
    pub last_direction: Direction,
}

impl Default for SearchState {
    fn default() -> Self {
        SearchState {
            last_pattern: None,
            last_direction: Direction::Forward,
        }
    }
}

impl SearchState {
    pub fn remember(&mut self, pattern: &str, direction: Direction) {
        self.last_pattern = Some(pattern.to_string());
        self.last_direction = direction;
    }

    /// The `count`-th next/previous occurrence of the last pattern from
    /// the caret, wrapping around the buffer. `Ok(None)` when there is
    /// no previous pattern or no occurrence at all.
    pub fn search_next(
        &self,
        editor: &dyn VimEditor,
        ignore_case: bool,
        count: usize,
        direction: Direction,
    ) -> Result<Option<PatternMatch>, EngineError> {
        let Some(pattern) = &self.last_pattern else {
            return Ok(None);
        };
        let compiled = regex::compile(pattern, ignore_case)?;

        let mut from = editor.caret_offset();
        let mut found = None;
        for _ in 0..count.max(1) {
            found = match direction {
                Direction::Forward => find_forward(&compiled, editor.text(), from)?,
                Direction::Backward => find_backward(&compiled, editor.text(), from)?,
            };
            match &found {
                Some(m) => from = m.start,
                None => return Ok(None),
            }
        }
        Ok(found)
    }
}

/// First match strictly after `from`, wrapping to the start.
pub fn find_forward(
    pattern: &CompiledPattern,
    text: &str,
    from: usize,
) -> Result<Option<PatternMatch>, EngineError> {
    if let Some(m) = pattern.find_from(text, from + 1)? {
        return Ok(Some(m));
    }
    Ok(pattern.find_from(text, 0)?)
}

/// Last match strictly before `from`, wrapping to the end.
pub fn find_backward(
    pattern: &CompiledPattern,
    text: &str,
    from: usize,
) -> Result<Option<PatternMatch>, EngineError> {
    let mut best: Option<PatternMatch> = None;
    let mut at = 0;
    while let Some(m) = pattern.find_from(text, at)? {
        if m.start >= from {
            break;
        }
        at = if m.end > m.start { m.end } else { m.start + 1 };
        best = Some(m);
    }
    if best.is_some() {
        return Ok(best);
    }
    // Wrap: the last match anywhere in the buffer.
    let mut at = from;
    let mut last = None;
    while let Some(m) = pattern.find_from(text, at)? {
        at = if m.end > m.start { m.end } else { m.start + 1 };
        last = Some(m);
    }
    Ok(last)
}
