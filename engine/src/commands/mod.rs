//! Command dispatch: name lookup (aliases first, then builtin
//! abbreviations), flag validation, then the handler. The dispatcher
//! itself has no side effects beyond lookup and validation.

pub mod alias;

mod handlers;

use viml::ExCommand;

use crate::Engine;
use crate::editor::VimEditor;
use crate::error::{CommandError, EngineError, EvalError};
use crate::evaluator::MAX_DEPTH;
use crate::executor::ExecutionResult;
use crate::scope::VimContext;

pub use alias::AliasTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFlag {
    Forbidden,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentFlag {
    Forbidden,
    Optional,
    Required,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    Write,
}

/// Requirements a handler declares; validated before it runs.
#[derive(Debug, Clone, Copy)]
pub struct CommandFlags {
    pub range: RangeFlag,
    pub argument: ArgumentFlag,
    pub access: Access,
}

pub type CommandFn = fn(
    &ExCommand,
    &mut dyn VimEditor,
    &mut Engine,
    &mut VimContext,
    usize,
) -> Result<ExecutionResult, EngineError>;

/// One builtin: its name split into the required prefix and optional
/// tail (Vim's abbreviation rule), its flags, and its handler.
#[derive(Clone, Copy)]
pub struct BuiltinCommand {
    pub required: &'static str,
    pub optional: &'static str,
    pub flags: CommandFlags,
    pub run: CommandFn,
}

impl BuiltinCommand {
    /// `name` matches when it extends the required prefix and stays a
    /// prefix of the full name.
    fn matches(&self, name: &str) -> bool {
        if !name.starts_with(self.required) {
            return false;
        }
        let tail = &name[self.required.len()..];
        self.optional.starts_with(tail)
    }
}

pub struct CommandRegistry {
    builtins: Vec<BuiltinCommand>,
    pub aliases: AliasTable,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        CommandRegistry {
            builtins: handlers::builtin_commands(),
            aliases: AliasTable::default(),
        }
    }
}

impl CommandRegistry {
    pub fn find(&self, name: &str) -> Option<BuiltinCommand> {
        self.builtins.iter().find(|b| b.matches(name)).copied()
    }
}

/// Resolve and run one parsed command.
pub fn dispatch(
    cmd: &ExCommand,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    vim: &mut VimContext,
    depth: usize,
) -> Result<ExecutionResult, EngineError> {
    if depth > MAX_DEPTH {
        return Err(EvalError::FunctionCallDepth.into());
    }
    tracing::debug!(name = %cmd.name, "dispatching command");

    // User-defined commands are uppercase and take precedence.
    if cmd.name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        let replacement = engine
            .commands
            .aliases
            .resolve(&cmd.name)?
            .map(str::to_string);
        let Some(replacement) = replacement else {
            return Err(CommandError::NotAnEditorCommand(cmd.name.clone()).into());
        };
        let mut line = replacement;
        if cmd.has_argument() {
            line.push(' ');
            line.push_str(&cmd.argument);
        }
        let expanded = viml::parser::parse_command_line(&line, 0)?;
        return dispatch(&expanded, editor, engine, vim, depth + 1);
    }

    // A bare range is a caret motion.
    if cmd.name.is_empty() {
        if cmd.range.is_empty() {
            return Ok(ExecutionResult::Success);
        }
        return handlers::goto_line(cmd, editor, engine, vim, depth);
    }

    let Some(builtin) = engine.commands.find(&cmd.name) else {
        return Err(CommandError::NotAnEditorCommand(cmd.name.clone()).into());
    };
    validate_flags(&builtin.flags, cmd, editor)?;
    (builtin.run)(cmd, editor, engine, vim, depth)
}

fn validate_flags(
    flags: &CommandFlags,
    cmd: &ExCommand,
    editor: &dyn VimEditor,
) -> Result<(), CommandError> {
    if flags.range == RangeFlag::Forbidden && !cmd.range.is_empty() {
        return Err(CommandError::NoRangeAllowed);
    }
    match flags.argument {
        ArgumentFlag::Required if !cmd.has_argument() => {
            return Err(CommandError::ArgumentRequired);
        }
        ArgumentFlag::Forbidden if cmd.has_argument() => {
            return Err(CommandError::TrailingCharacters);
        }
        _ => {}
    }
    if flags.access == Access::Write && !editor.is_writable() {
        return Err(CommandError::ReadOnly);
    }
    Ok(())
}
