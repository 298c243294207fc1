use viml::ExCommand;
use viml::expression::Expr;

use crate::Engine;
use crate::commands::{Access, ArgumentFlag, BuiltinCommand, CommandFlags, RangeFlag};
use crate::editor::{LocationInfo, VimEditor};
use crate::error::{CommandError, EngineError};
use crate::evaluator::evaluate;
use crate::executor::{self, ExecutionResult};
use crate::range::{LineRange, resolve_range};
use crate::regex::{self, CompiledPattern, PatternMatch};
use crate::scope::VimContext;
use crate::search::Direction;

/// The builtin command table. Names are split into required prefix and
/// optional tail, so `:delc` reaches `delcommand` while `:d` stays
/// `delete`, as in Vim.
pub(crate) fn builtin_commands() -> Vec<BuiltinCommand> {
    vec![
        BuiltinCommand {
            required: "cal",
            optional: "l",
            flags: flags(RangeFlag::Optional, ArgumentFlag::Required, Access::ReadOnly),
            run: cmd_call,
        },
        BuiltinCommand {
            required: "comc",
            optional: "lear",
            flags: flags(RangeFlag::Forbidden, ArgumentFlag::Forbidden, Access::ReadOnly),
            run: cmd_comclear,
        },
        BuiltinCommand {
            required: "com",
            optional: "mand",
            flags: flags(RangeFlag::Forbidden, ArgumentFlag::Optional, Access::ReadOnly),
            run: cmd_command,
        },
        BuiltinCommand {
            required: "delc",
            optional: "ommand",
            flags: flags(RangeFlag::Forbidden, ArgumentFlag::Required, Access::ReadOnly),
            run: cmd_delcommand,
        },
        BuiltinCommand {
            required: "d",
            optional: "elete",
            flags: flags(RangeFlag::Optional, ArgumentFlag::Optional, Access::Write),
            run: cmd_delete,
        },
        BuiltinCommand {
            required: "ec",
            optional: "ho",
            flags: flags(RangeFlag::Forbidden, ArgumentFlag::Optional, Access::ReadOnly),
            run: cmd_echo,
        },
        BuiltinCommand {
            required: "exe",
            optional: "cute",
            flags: flags(RangeFlag::Forbidden, ArgumentFlag::Required, Access::ReadOnly),
            run: cmd_execute,
        },
        BuiltinCommand {
            required: "f",
            optional: "ile",
            flags: flags(RangeFlag::Forbidden, ArgumentFlag::Forbidden, Access::ReadOnly),
            run: cmd_file,
        },
        BuiltinCommand {
            required: "s",
            optional: "ubstitute",
            flags: flags(RangeFlag::Optional, ArgumentFlag::Required, Access::Write),
            run: cmd_substitute,
        },
    ]
}

fn flags(range: RangeFlag, argument: ArgumentFlag, access: Access) -> CommandFlags {
    CommandFlags {
        range,
        argument,
        access,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// A bare range (`:5`, `:$`, `:/pat/`) moves the caret to the start of
/// the last addressed line.
pub(crate) fn goto_line(
    cmd: &ExCommand,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    _vim: &mut VimContext,
    _depth: usize,
) -> Result<ExecutionResult, EngineError> {
    let range = resolve_range(&cmd.range, editor, engine)?
        .unwrap_or_else(|| LineRange::single(editor.caret_line()));
    let offset = editor.line_start_offset(range.end);
    editor.set_caret_offset(offset);
    Ok(ExecutionResult::Success)
}

fn cmd_call(
    cmd: &ExCommand,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    vim: &mut VimContext,
    depth: usize,
) -> Result<ExecutionResult, EngineError> {
    let expr = viml::parser::parse_expression(cmd.argument.trim(), 0)?;
    if !matches!(expr, Expr::Call { .. }) {
        return Err(CommandError::FunctionCallRequired.into());
    }
    evaluate(&expr, editor, engine, vim, depth)?;
    Ok(ExecutionResult::Success)
}

fn cmd_comclear(
    _cmd: &ExCommand,
    _editor: &mut dyn VimEditor,
    engine: &mut Engine,
    _vim: &mut VimContext,
    _depth: usize,
) -> Result<ExecutionResult, EngineError> {
    engine.commands.aliases.clear();
    Ok(ExecutionResult::Success)
}

fn cmd_command(
    cmd: &ExCommand,
    _editor: &mut dyn VimEditor,
    engine: &mut Engine,
    _vim: &mut VimContext,
    _depth: usize,
) -> Result<ExecutionResult, EngineError> {
    let argument = cmd.argument.trim();

    if argument.is_empty() {
        let listing: Vec<String> = engine
            .commands
            .aliases
            .entries()
            .into_iter()
            .map(|(name, replacement)| format!("{:<12} {}", name, replacement))
            .collect();
        for line in listing {
            engine.messages.show(line);
        }
        return Ok(ExecutionResult::Success);
    }

    match argument.split_once(char::is_whitespace) {
        Some((name, replacement)) => {
            engine
                .commands
                .aliases
                .define(name, replacement.trim_start(), cmd.bang)?;
            Ok(ExecutionResult::Success)
        }
        None => {
            // Name alone: show that alias.
            let existing = engine.commands.aliases.get(argument).map(str::to_string);
            match existing {
                Some(replacement) => {
                    let line = format!("{:<12} {}", argument, replacement);
                    engine.messages.show(line);
                    Ok(ExecutionResult::Success)
                }
                None => Err(CommandError::NoSuchUserCommand(argument.to_string()).into()),
            }
        }
    }
}

fn cmd_delcommand(
    cmd: &ExCommand,
    _editor: &mut dyn VimEditor,
    engine: &mut Engine,
    _vim: &mut VimContext,
    _depth: usize,
) -> Result<ExecutionResult, EngineError> {
    let name = cmd.argument.trim();
    engine.commands.aliases.remove(name)?;
    Ok(ExecutionResult::Success)
}

fn cmd_delete(
    cmd: &ExCommand,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    _vim: &mut VimContext,
    _depth: usize,
) -> Result<ExecutionResult, EngineError> {
    let range = resolve_range(&cmd.range, editor, engine)?
        .unwrap_or_else(|| LineRange::single(editor.caret_line()));

    let mut from = editor.line_start_offset(range.start);
    let mut to = editor.line_end_offset(range.end);
    if to < editor.char_count() {
        to += 1; // take the trailing newline with the lines
    } else if from > 0 {
        from -= 1; // deleting through the end removes the newline before
    }
    editor.replace_range(from..to, "");

    let line = range.start.min(editor.line_count());
    let offset = editor.line_start_offset(line.max(1));
    editor.set_caret_offset(offset);
    Ok(ExecutionResult::Success)
}

fn cmd_echo(
    cmd: &ExCommand,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    vim: &mut VimContext,
    depth: usize,
) -> Result<ExecutionResult, EngineError> {
    let exprs = viml::parser::parse_expression_list(&cmd.argument, 0)?;
    let mut parts = Vec::with_capacity(exprs.len());
    for expr in &exprs {
        parts.push(evaluate(expr, editor, engine, vim, depth)?.echo_string());
    }
    if !parts.is_empty() {
        engine.messages.show(parts.join(" "));
    }
    Ok(ExecutionResult::Success)
}

/// `:execute` evaluates its arguments, joins them with spaces, and
/// runs the result as script source in the *current* scope chain, so
/// control-flow signals propagate to the caller.
fn cmd_execute(
    cmd: &ExCommand,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    vim: &mut VimContext,
    depth: usize,
) -> Result<ExecutionResult, EngineError> {
    let exprs = viml::parser::parse_expression_list(&cmd.argument, 0)?;
    let mut parts = Vec::with_capacity(exprs.len());
    for expr in &exprs {
        parts.push(evaluate(expr, editor, engine, vim, depth)?.as_vim_string()?);
    }
    let source = parts.join(" ");

    let script = viml::parser::Parser::new(source, 0)
        .parse()
        .map_err(|mut errors| EngineError::Parse(errors.remove(0)))?;
    executor::run_units(&script.units, editor, engine, vim, depth + 1)
}

fn cmd_file(
    _cmd: &ExCommand,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    _vim: &mut VimContext,
    _depth: usize,
) -> Result<ExecutionResult, EngineError> {
    let info = LocationInfo::compute(editor.text(), editor.caret_offset());
    engine.messages.show(info.to_message());
    Ok(ExecutionResult::Success)
}

// ---------------------------------------------------------------------------
// :substitute
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SubstituteFlags {
    global: bool,
    /// `i` forces folding, `I` forces exact; unset defers to the option.
    case: Option<bool>,
    /// `e`: a missing match is not an error.
    suppress_not_found: bool,
}

fn cmd_substitute(
    cmd: &ExCommand,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    _vim: &mut VimContext,
    _depth: usize,
) -> Result<ExecutionResult, EngineError> {
    let (pattern, replacement, sub_flags) = parse_substitute_args(&cmd.argument)?;

    // An empty pattern reuses the last search pattern.
    let pattern = if pattern.is_empty() {
        engine
            .search
            .last_pattern
            .clone()
            .ok_or(CommandError::NoPreviousPattern)?
    } else {
        pattern
    };
    engine.search.remember(&pattern, Direction::Forward);

    let ignore_case = sub_flags.case.unwrap_or(engine.options.ignorecase);
    let compiled = regex::compile(&pattern, ignore_case)?;

    let range = resolve_range(&cmd.range, editor, engine)?
        .unwrap_or_else(|| LineRange::single(editor.caret_line()));

    let mut substitutions = 0usize;
    let mut last_changed = None;

    for line in range.start..=range.end {
        if line > editor.line_count() {
            break;
        }
        let original = editor.line_text(line);
        let (updated, count) = substitute_line(&compiled, &original, &replacement, sub_flags.global)?;
        if count > 0 {
            let from = editor.line_start_offset(line);
            let to = editor.line_end_offset(line);
            editor.replace_range(from..to, &updated);
            substitutions += count;
            last_changed = Some(line);
        }
    }

    match last_changed {
        Some(line) => {
            let offset = editor.line_start_offset(line);
            editor.set_caret_offset(offset);
            tracing::debug!(substitutions, "substitute finished");
            Ok(ExecutionResult::Success)
        }
        None if sub_flags.suppress_not_found => Ok(ExecutionResult::Success),
        None => Err(CommandError::PatternNotFound(pattern).into()),
    }
}

/// Split `/pat/rep/flags` on its (arbitrary, non-alphanumeric)
/// separator, honouring backslash escapes.
fn parse_substitute_args(
    argument: &str,
) -> Result<(String, String, SubstituteFlags), EngineError> {
    let mut chars = argument.chars();
    let separator = chars.next().ok_or(CommandError::ArgumentRequired)?;
    if separator.is_alphanumeric() || separator == '\\' || separator == '"' || separator == ' ' {
        return Err(CommandError::TrailingCharacters.into());
    }

    let rest: Vec<char> = chars.collect();
    let (pattern, after_pattern) = scan_until_separator(&rest, 0, separator);
    let (replacement, after_replacement) = scan_until_separator(&rest, after_pattern, separator);

    let mut sub_flags = SubstituteFlags::default();
    for c in rest[after_replacement..].iter() {
        match c {
            'g' => sub_flags.global = true,
            'i' => sub_flags.case = Some(true),
            'I' => sub_flags.case = Some(false),
            'e' => sub_flags.suppress_not_found = true,
            ' ' | '\t' => {}
            _ => return Err(CommandError::TrailingCharacters.into()),
        }
    }

    Ok((pattern, replacement, sub_flags))
}

/// Collect text until an unescaped separator (consumed) or the end.
/// Returns the collected text and the next scan position.
fn scan_until_separator(chars: &[char], mut at: usize, separator: char) -> (String, usize) {
    let mut out = String::new();
    while at < chars.len() {
        let c = chars[at];
        if c == separator {
            at += 1;
            return (out, at);
        }
        if c == '\\' && at + 1 < chars.len() && chars[at + 1] == separator {
            out.push(separator);
            at += 2;
            continue;
        }
        out.push(c);
        at += 1;
    }
    (out, at)
}

/// Apply the pattern to one line. Returns the updated line and how
/// many substitutions were made.
fn substitute_line(
    compiled: &CompiledPattern,
    line: &str,
    replacement: &str,
    global: bool,
) -> Result<(String, usize), EngineError> {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::new();
    let mut at = 0usize;
    let mut count = 0usize;

    while at <= chars.len() {
        let Some(found) = compiled.find_from(line, at)? else {
            break;
        };
        out.extend(&chars[at..found.start]);
        out.push_str(&expand_replacement(replacement, &chars, &found));
        count += 1;

        // Always make progress, even on an empty match.
        at = if found.end > found.start {
            found.end
        } else {
            if found.start < chars.len() {
                out.push(chars[found.start]);
            }
            found.start + 1
        };

        if !global {
            break;
        }
    }

    out.extend(&chars[at.min(chars.len())..]);
    Ok((out, count))
}

/// `&` inserts the whole match, `\1`..`\9` a capture group, `\&` and
/// `\\` their literal characters.
fn expand_replacement(replacement: &str, line: &[char], found: &PatternMatch) -> String {
    let mut out = String::new();
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '&' => out.extend(&line[found.start..found.end]),
            '\\' => match chars.next() {
                Some('&') => out.push('&'),
                Some('\\') => out.push('\\'),
                Some(d @ '1'..='9') => {
                    let n = d.to_digit(10).expect("digit") as usize;
                    if let Some((start, end)) = found.group(n) {
                        out.extend(&line[start..end]);
                    }
                }
                Some('0') => out.extend(&line[found.start..found.end]),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}
