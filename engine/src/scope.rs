use std::collections::HashMap;

use viml::script::Statement;
use viml::{ScopePrefix, VarName};

use crate::error::EvalError;
use crate::value::VimValue;

/// A user-defined function: parameter names and body statements.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Statement>,
}

/// The `s:` namespace of one script execution. Created fresh for every
/// run of a parsed script, so sourcing the same text twice never shares
/// state.
#[derive(Debug, Default)]
pub struct ScriptScope {
    pub variables: HashMap<String, VimValue>,
    pub functions: HashMap<String, FunctionDef>,
}

/// The `l:`/`a:` namespaces of one function call. Pushed on call,
/// popped on return.
#[derive(Debug, Default)]
pub struct FunctionScope {
    pub locals: HashMap<String, VimValue>,
    pub args: HashMap<String, VimValue>,
}

/// The scope chain of one script execution: the script scope plus a
/// stack of function frames. The global scope lives on the `Engine`.
#[derive(Debug, Default)]
pub struct VimContext {
    pub script: ScriptScope,
    pub frames: Vec<FunctionScope>,
}

impl VimContext {
    pub fn new() -> Self {
        VimContext::default()
    }

    /// Resolve a variable. An explicit scope prefix pins the lookup to
    /// that one scope; otherwise the chain is walked innermost-first:
    /// function-local, then script-local, then global.
    pub fn lookup(
        &self,
        globals: &HashMap<String, VimValue>,
        name: &VarName,
    ) -> Option<VimValue> {
        match name.scope {
            Some(ScopePrefix::Global) => globals.get(&name.name).cloned(),
            Some(ScopePrefix::Script) => self.script.variables.get(&name.name).cloned(),
            Some(ScopePrefix::FunctionLocal) => self
                .frames
                .last()
                .and_then(|f| f.locals.get(&name.name))
                .cloned(),
            Some(ScopePrefix::Argument) => self
                .frames
                .last()
                .and_then(|f| f.args.get(&name.name))
                .cloned(),
            Some(ScopePrefix::Vim) => None,
            None => {
                if let Some(frame) = self.frames.last() {
                    if let Some(value) = frame.locals.get(&name.name) {
                        return Some(value.clone());
                    }
                    if let Some(value) = frame.args.get(&name.name) {
                        return Some(value.clone());
                    }
                }
                if let Some(value) = self.script.variables.get(&name.name) {
                    return Some(value.clone());
                }
                globals.get(&name.name).cloned()
            }
        }
    }

    /// Assign a variable. An explicit prefix pins the target scope;
    /// otherwise the innermost scope receives the binding.
    pub fn assign(
        &mut self,
        globals: &mut HashMap<String, VimValue>,
        name: &VarName,
        value: VimValue,
    ) -> Result<(), EvalError> {
        match name.scope {
            Some(ScopePrefix::Global) => {
                globals.insert(name.name.clone(), value);
                Ok(())
            }
            Some(ScopePrefix::Script) => {
                self.script.variables.insert(name.name.clone(), value);
                Ok(())
            }
            Some(ScopePrefix::FunctionLocal) => match self.frames.last_mut() {
                Some(frame) => {
                    frame.locals.insert(name.name.clone(), value);
                    Ok(())
                }
                None => Err(EvalError::UndefinedVariable(name.display_name())),
            },
            Some(ScopePrefix::Argument) | Some(ScopePrefix::Vim) => {
                // `a:` and `v:` variables are read-only bindings.
                Err(EvalError::UndefinedVariable(name.display_name()))
            }
            None => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.locals.insert(name.name.clone(), value);
                } else {
                    self.script.variables.insert(name.name.clone(), value);
                }
                Ok(())
            }
        }
    }

    /// Remove a variable, searching the chain the way `lookup` does.
    /// Missing variables are an error (`:unlet` without `!`).
    pub fn unlet(
        &mut self,
        globals: &mut HashMap<String, VimValue>,
        name: &VarName,
    ) -> Result<(), EvalError> {
        let removed = match name.scope {
            Some(ScopePrefix::Global) => globals.remove(&name.name).is_some(),
            Some(ScopePrefix::Script) => self.script.variables.remove(&name.name).is_some(),
            Some(ScopePrefix::FunctionLocal) => self
                .frames
                .last_mut()
                .and_then(|f| f.locals.remove(&name.name))
                .is_some(),
            Some(ScopePrefix::Argument) | Some(ScopePrefix::Vim) => false,
            None => {
                if let Some(frame) = self.frames.last_mut() {
                    if frame.locals.remove(&name.name).is_some() {
                        return Ok(());
                    }
                }
                if self.script.variables.remove(&name.name).is_some() {
                    return Ok(());
                }
                globals.remove(&name.name).is_some()
            }
        };
        if removed {
            Ok(())
        } else {
            Err(EvalError::NoSuchVariable(name.display_name()))
        }
    }

    /// Find a callable: script-local functions shadow global ones; an
    /// explicit `s:` prefix looks only in the script scope.
    pub fn lookup_function(
        &self,
        global_functions: &HashMap<String, FunctionDef>,
        name: &VarName,
    ) -> Option<FunctionDef> {
        match name.scope {
            Some(ScopePrefix::Script) => self.script.functions.get(&name.name).cloned(),
            None => self
                .script
                .functions
                .get(&name.name)
                .or_else(|| global_functions.get(&name.name))
                .cloned(),
            _ => None,
        }
    }
}
