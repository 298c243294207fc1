//! The execution engine: value model, scope chain, expression
//! evaluator, command dispatcher, and the pattern engine, tied together
//! by an explicit [`Engine`] context — there are no global singletons.

pub mod commands;
pub mod editor;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod functions;
pub mod messages;
pub mod operators;
pub mod range;
pub mod regex;
pub mod scope;
pub mod search;
pub mod value;

use std::collections::HashMap;

use crate::commands::CommandRegistry;
use crate::functions::FunctionRegistry;
use crate::operators::OperatorRegistry;
use crate::scope::FunctionDef;
use crate::search::SearchState;

pub use crate::editor::{BufferEditor, LocationInfo, VimEditor};
pub use crate::error::{CommandError, EngineError, EvalError};
pub use crate::executor::ExecutionResult;
pub use crate::messages::{MessageLog, MessageSink};
pub use crate::scope::VimContext;
pub use crate::value::VimValue;

/// Option values the engine consults (comparisons, pattern matching).
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub ignorecase: bool,
}

/// The engine context: global variables, the registries, options,
/// search state, and the message log, assembled once and passed to
/// every entry point. Mutation of the shared tables goes through the
/// dispatcher/evaluator APIs.
pub struct Engine {
    pub variables: HashMap<String, VimValue>,
    pub functions: HashMap<String, FunctionDef>,
    pub builtins: FunctionRegistry,
    pub operators: OperatorRegistry,
    pub commands: CommandRegistry,
    pub options: Options,
    pub search: SearchState,
    pub messages: MessageLog,
}

impl Default for Engine {
    fn default() -> Self {
        Engine {
            variables: HashMap::new(),
            functions: HashMap::new(),
            builtins: FunctionRegistry::default(),
            operators: OperatorRegistry::default(),
            commands: CommandRegistry::default(),
            options: Options::default(),
            search: SearchState::default(),
            messages: MessageLog::default(),
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Engine::default()
    }

    /// Parse and run script source (a full script or one Ex line).
    /// Parse failures and runtime failures both surface as status
    /// messages plus `ExecutionResult::Error`; nothing panics through
    /// this boundary.
    pub fn execute(&mut self, source: &str, editor: &mut dyn VimEditor) -> ExecutionResult {
        let parser = viml::parser::Parser::new(source.to_string(), 0);
        match parser.parse() {
            Ok(script) => executor::execute_script(&script, editor, self),
            Err(errors) => {
                for error in errors {
                    self.messages.show(EngineError::Parse(error).to_string());
                }
                ExecutionResult::Error
            }
        }
    }

    /// Run an already-parsed script.
    pub fn execute_script(
        &mut self,
        script: &viml::Script,
        editor: &mut dyn VimEditor,
    ) -> ExecutionResult {
        executor::execute_script(script, editor, self)
    }

    /// Evaluate a standalone expression (e.g. an `<expr>` mapping) in
    /// a fresh scope chain over the global scope.
    pub fn evaluate(
        &mut self,
        source: &str,
        editor: &mut dyn VimEditor,
    ) -> Result<VimValue, EngineError> {
        let expr = viml::parser::parse_expression(source, 0)?;
        let mut vim = VimContext::new();
        evaluator::evaluate(&expr, editor, self, &mut vim, 0)
    }
}
