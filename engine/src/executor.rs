use viml::expression::BinaryOp;
use viml::script::{LetOp, LetTarget, Script, Statement};
use viml::{ScopePrefix, VarName};

use crate::Engine;
use crate::commands;
use crate::editor::VimEditor;
use crate::error::{EngineError, EvalError};
use crate::evaluator::evaluate;
use crate::operators::CaseFold;
use crate::regex;
use crate::scope::{FunctionDef, VimContext};
use crate::value::VimValue;

/// The outcome of one executable unit: success, a reported error, or a
/// control-flow signal consumed by an enclosing loop, function call, or
/// script boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Success,
    Error,
    Break,
    Continue,
    Return(VimValue),
    Finish,
}

/// Run a parsed script against the editor. A fresh script scope is
/// created here, so two runs of the same source never share `s:`
/// state. Failures inside statements are caught at this boundary: the
/// message goes to the message log and the result is `Error`.
pub fn execute_script(
    script: &Script,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
) -> ExecutionResult {
    let mut vim = VimContext::new();
    tracing::debug!(units = script.units.len(), "executing script");

    match run_units(&script.units, editor, engine, &mut vim, 0) {
        Ok(ExecutionResult::Break) => {
            engine.messages.show(EvalError::BreakWithoutLoop.to_string());
            ExecutionResult::Error
        }
        Ok(ExecutionResult::Continue) => {
            engine
                .messages
                .show(EvalError::ContinueWithoutLoop.to_string());
            ExecutionResult::Error
        }
        Ok(ExecutionResult::Return(_)) => {
            engine
                .messages
                .show(EvalError::ReturnOutsideFunction.to_string());
            ExecutionResult::Error
        }
        Ok(ExecutionResult::Finish) => ExecutionResult::Success,
        Ok(other) => other,
        Err(error) => {
            engine.messages.show(error.to_string());
            ExecutionResult::Error
        }
    }
}

/// Execute units in source order, stopping at the first unit whose
/// result is not `Success` and returning that result.
pub fn run_units(
    units: &[Statement],
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    vim: &mut VimContext,
    depth: usize,
) -> Result<ExecutionResult, EngineError> {
    let mut latest = ExecutionResult::Success;
    for unit in units {
        if latest != ExecutionResult::Success {
            break;
        }
        latest = execute_statement(unit, editor, engine, vim, depth)?;
    }
    Ok(latest)
}

fn execute_statement(
    statement: &Statement,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    vim: &mut VimContext,
    depth: usize,
) -> Result<ExecutionResult, EngineError> {
    match statement {
        Statement::Command(cmd) => commands::dispatch(cmd, editor, engine, vim, depth),

        Statement::Expression(expr, _) => {
            evaluate(expr, editor, engine, vim, depth)?;
            Ok(ExecutionResult::Success)
        }

        Statement::Let {
            target, op, value, ..
        } => execute_let(target, *op, value, editor, engine, vim, depth),

        Statement::Unlet { targets, .. } => {
            for target in targets {
                vim.unlet(&mut engine.variables, target)?;
            }
            Ok(ExecutionResult::Success)
        }

        Statement::If { branches } => {
            for (condition, body) in branches {
                let taken = match condition {
                    Some(expr) => evaluate(expr, editor, engine, vim, depth)?.is_truthy()?,
                    None => true,
                };
                if taken {
                    return run_units(body, editor, engine, vim, depth);
                }
            }
            Ok(ExecutionResult::Success)
        }

        Statement::While { condition, body } => {
            loop {
                let cond = evaluate(condition, editor, engine, vim, depth)?;
                if !cond.is_truthy()? {
                    break;
                }
                match run_units(body, editor, engine, vim, depth)? {
                    ExecutionResult::Success | ExecutionResult::Continue => {}
                    ExecutionResult::Break => break,
                    other => return Ok(other),
                }
            }
            Ok(ExecutionResult::Success)
        }

        Statement::For {
            variable,
            iterable,
            body,
        } => {
            let value = evaluate(iterable, editor, engine, vim, depth)?;
            let items = match &value {
                VimValue::List(items) => items.borrow().clone(),
                other => return Err(EvalError::ListRequired(other.type_name()).into()),
            };
            for item in items {
                vim.assign(&mut engine.variables, variable, item)?;
                match run_units(body, editor, engine, vim, depth)? {
                    ExecutionResult::Success | ExecutionResult::Continue => {}
                    ExecutionResult::Break => break,
                    other => return Ok(other),
                }
            }
            Ok(ExecutionResult::Success)
        }

        Statement::Try {
            body,
            catches,
            finally,
        } => {
            let mut outcome = run_units(body, editor, engine, vim, depth);

            if let Err(error) = outcome {
                let message = error.to_string();
                outcome = Err(error);
                for (pattern, handler) in catches {
                    if catch_matches(pattern.as_deref(), &message) {
                        outcome = run_units(handler, editor, engine, vim, depth);
                        break;
                    }
                }
            }

            if let Some(cleanup) = finally {
                let cleanup_result = run_units(cleanup, editor, engine, vim, depth)?;
                if cleanup_result != ExecutionResult::Success {
                    return Ok(cleanup_result);
                }
            }

            outcome
        }

        Statement::Function {
            name,
            params,
            bang,
            body,
            ..
        } => {
            let def = FunctionDef {
                name: name.display_name(),
                params: params.clone(),
                body: body.clone(),
            };
            let table = if name.scope == Some(ScopePrefix::Script) {
                &mut vim.script.functions
            } else {
                &mut engine.functions
            };
            if table.contains_key(&name.name) && !bang {
                return Err(EvalError::FunctionExists(name.display_name()).into());
            }
            table.insert(name.name.clone(), def);
            Ok(ExecutionResult::Success)
        }

        Statement::Return(value) => {
            let result = match value {
                Some(expr) => evaluate(expr, editor, engine, vim, depth)?,
                None => VimValue::Int(0),
            };
            Ok(ExecutionResult::Return(result))
        }

        Statement::Break => Ok(ExecutionResult::Break),
        Statement::Continue => Ok(ExecutionResult::Continue),
        Statement::Finish => Ok(ExecutionResult::Finish),
    }
}

/// A catch clause with no pattern takes everything; otherwise the
/// pattern is matched against the error message with the engine's own
/// pattern engine.
fn catch_matches(pattern: Option<&str>, message: &str) -> bool {
    match pattern {
        None => true,
        Some(p) => regex::compile(p, false)
            .ok()
            .and_then(|compiled| compiled.find_from(message, 0).ok())
            .flatten()
            .is_some(),
    }
}

fn execute_let(
    target: &LetTarget,
    op: LetOp,
    value_expr: &viml::Expr,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    vim: &mut VimContext,
    depth: usize,
) -> Result<ExecutionResult, EngineError> {
    let value = evaluate(value_expr, editor, engine, vim, depth)?;

    let combined = match let_binop(op) {
        None => value,
        Some(binop) => {
            let current = read_let_target(target, editor, engine, vim, depth)?;
            match engine.operators.eval(binop, CaseFold::Sensitive, &current, &value) {
                Some(result) => result?,
                None => {
                    return Err(EvalError::CannotCompare(
                        current.type_name(),
                        value.type_name(),
                    )
                    .into());
                }
            }
        }
    };

    write_let_target(target, combined, editor, engine, vim, depth)?;
    Ok(ExecutionResult::Success)
}

fn let_binop(op: LetOp) -> Option<BinaryOp> {
    match op {
        LetOp::Assign => None,
        LetOp::Add => Some(BinaryOp::Add),
        LetOp::Subtract => Some(BinaryOp::Subtract),
        LetOp::Concat => Some(BinaryOp::Concat),
    }
}

fn lookup_or_undefined(
    engine: &Engine,
    vim: &VimContext,
    name: &VarName,
) -> Result<VimValue, EngineError> {
    vim.lookup(&engine.variables, name)
        .ok_or_else(|| EvalError::UndefinedVariable(name.display_name()).into())
}

fn read_let_target(
    target: &LetTarget,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    vim: &mut VimContext,
    depth: usize,
) -> Result<VimValue, EngineError> {
    match target {
        LetTarget::Var(name) => lookup_or_undefined(engine, vim, name),
        LetTarget::Index { name, index } => {
            let container = lookup_or_undefined(engine, vim, name)?;
            let key = evaluate(index, editor, engine, vim, depth)?;
            match &container {
                VimValue::List(items) => {
                    let items = items.borrow();
                    let raw = key.as_number()?;
                    let resolved = if raw < 0 { raw + items.len() as i64 } else { raw };
                    if resolved >= 0 && (resolved as usize) < items.len() {
                        Ok(items[resolved as usize].clone())
                    } else {
                        Err(EvalError::ListIndexOutOfRange(raw).into())
                    }
                }
                VimValue::Dict(entries) => {
                    let key = key.as_vim_string()?;
                    entries
                        .borrow()
                        .get(&key)
                        .cloned()
                        .ok_or_else(|| EvalError::KeyNotPresent(key).into())
                }
                other => Err(EvalError::CannotIndex(other.type_name()).into()),
            }
        }
    }
}

fn write_let_target(
    target: &LetTarget,
    value: VimValue,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    vim: &mut VimContext,
    depth: usize,
) -> Result<(), EngineError> {
    match target {
        LetTarget::Var(name) => {
            vim.assign(&mut engine.variables, name, value)?;
            Ok(())
        }
        LetTarget::Index { name, index } => {
            let container = lookup_or_undefined(engine, vim, name)?;
            let key = evaluate(index, editor, engine, vim, depth)?;
            match &container {
                VimValue::List(items) => {
                    let mut items = items.borrow_mut();
                    let raw = key.as_number()?;
                    let resolved = if raw < 0 { raw + items.len() as i64 } else { raw };
                    if resolved >= 0 && (resolved as usize) < items.len() {
                        items[resolved as usize] = value;
                        Ok(())
                    } else {
                        Err(EvalError::ListIndexOutOfRange(raw).into())
                    }
                }
                VimValue::Dict(entries) => {
                    let key = key.as_vim_string()?;
                    entries.borrow_mut().insert(key, value);
                    Ok(())
                }
                other => Err(EvalError::CannotIndex(other.type_name()).into()),
            }
        }
    }
}
