use viml::command::{Address, RangeSpec};

use crate::Engine;
use crate::editor::VimEditor;
use crate::error::{CommandError, EngineError};
use crate::regex;
use crate::search;

/// A resolved line range, 1-based and inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn single(line: usize) -> Self {
        LineRange {
            start: line,
            end: line,
        }
    }
}

/// Resolve a parsed range against the buffer. `Ok(None)` when no range
/// was given — the command decides its own default. With more than two
/// addresses, the last two win, as in Vim. A `;` separator moves the
/// caret to its address before the next one resolves.
pub fn resolve_range(
    spec: &RangeSpec,
    editor: &mut dyn VimEditor,
    engine: &Engine,
) -> Result<Option<LineRange>, EngineError> {
    if spec.is_empty() {
        return Ok(None);
    }

    if spec
        .entries
        .iter()
        .any(|e| matches!(e.address, Address::WholeFile))
    {
        return Ok(Some(LineRange {
            start: 1,
            end: editor.line_count(),
        }));
    }

    let line_count = editor.line_count() as i64;
    let mut lines: Vec<usize> = Vec::with_capacity(spec.entries.len());

    for entry in &spec.entries {
        let base = resolve_address(&entry.address, editor, engine)? as i64;
        let line = base + entry.offset;
        if line < 1 || line > line_count {
            return Err(CommandError::InvalidRange.into());
        }
        let line = line as usize;
        if entry.moves_caret {
            let offset = editor.line_start_offset(line);
            editor.set_caret_offset(offset);
        }
        lines.push(line);
    }

    let end = *lines.last().expect("non-empty range");
    let start = if lines.len() >= 2 {
        lines[lines.len() - 2]
    } else {
        end
    };
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    Ok(Some(LineRange { start, end }))
}

fn resolve_address(
    address: &Address,
    editor: &mut dyn VimEditor,
    engine: &Engine,
) -> Result<usize, EngineError> {
    match address {
        Address::CurrentLine => Ok(editor.caret_line()),
        Address::LastLine => Ok(editor.line_count()),
        Address::Line(n) => Ok(*n),
        Address::WholeFile => Ok(1),
        // Mark storage belongs to the host; the engine only reports.
        Address::Mark(mark) => Err(CommandError::MarkNotSet(*mark).into()),
        Address::ForwardPattern(pattern) => {
            let compiled = regex::compile(pattern, engine.options.ignorecase)?;
            let from = editor.line_end_offset(editor.caret_line());
            let found = search::find_forward(&compiled, editor.text(), from)?
                .ok_or_else(|| CommandError::PatternNotFound(pattern.clone()))?;
            Ok(editor.line_of_offset(found.start))
        }
        Address::BackwardPattern(pattern) => {
            let compiled = regex::compile(pattern, engine.options.ignorecase)?;
            let from = editor.line_start_offset(editor.caret_line());
            let found = search::find_backward(&compiled, editor.text(), from)?
                .ok_or_else(|| CommandError::PatternNotFound(pattern.clone()))?;
            Ok(editor.line_of_offset(found.start))
        }
    }
}
