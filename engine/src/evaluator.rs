use viml::expression::{BinaryOp, CaseMode, Expr, UnaryOp};
use viml::VarName;

use crate::Engine;
use crate::editor::VimEditor;
use crate::error::{EngineError, EvalError};
use crate::executor::{self, ExecutionResult};
use crate::operators::CaseFold;
use crate::scope::{FunctionDef, FunctionScope, VimContext};
use crate::value::VimValue;

pub const MAX_DEPTH: usize = 128;

/// Evaluate an expression AST node against the scope chain.
pub fn evaluate(
    expr: &Expr,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    vim: &mut VimContext,
    depth: usize,
) -> Result<VimValue, EngineError> {
    if depth > MAX_DEPTH {
        return Err(EvalError::FunctionCallDepth.into());
    }

    match expr {
        // --- Literals ---
        Expr::Number(n) => Ok(VimValue::Int(*n)),
        Expr::Float(x) => Ok(VimValue::Float(*x)),
        Expr::Str(s) => Ok(VimValue::Str(s.clone())),

        Expr::List(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(evaluate(item, editor, engine, vim, depth + 1)?);
            }
            Ok(VimValue::list(values))
        }

        Expr::Dict(entries) => {
            let mut map = std::collections::BTreeMap::new();
            for (key_expr, value_expr) in entries {
                let key = evaluate(key_expr, editor, engine, vim, depth + 1)?
                    .as_vim_string()
                    .map_err(EngineError::from)?;
                let value = evaluate(value_expr, editor, engine, vim, depth + 1)?;
                map.insert(key, value);
            }
            Ok(VimValue::dict(map))
        }

        // --- References ---
        Expr::Var(name) => vim
            .lookup(&engine.variables, name)
            .ok_or_else(|| EvalError::UndefinedVariable(name.display_name()).into()),

        Expr::Register(c) => {
            // Only the search register has engine-side contents; the
            // others belong to the host.
            let contents = match c {
                '/' => engine.search.last_pattern.clone().unwrap_or_default(),
                _ => String::new(),
            };
            Ok(VimValue::Str(contents))
        }

        Expr::OptionRef(name) => match name.as_str() {
            "ignorecase" | "ic" => Ok(VimValue::Int(engine.options.ignorecase as i64)),
            other => Err(EvalError::UnknownOption(other.to_string()).into()),
        },

        Expr::Env(name) => Ok(VimValue::Str(std::env::var(name).unwrap_or_default())),

        // --- Postfix ---
        Expr::Index { base, index } => {
            let container = evaluate(base, editor, engine, vim, depth + 1)?;
            let key = evaluate(index, editor, engine, vim, depth + 1)?;
            index_value(&container, &key).map_err(EngineError::from)
        }

        Expr::Slice { base, from, to } => {
            let container = evaluate(base, editor, engine, vim, depth + 1)?;
            let from = match from {
                Some(e) => Some(evaluate(e, editor, engine, vim, depth + 1)?.as_number()?),
                None => None,
            };
            let to = match to {
                Some(e) => Some(evaluate(e, editor, engine, vim, depth + 1)?.as_number()?),
                None => None,
            };
            slice_value(&container, from, to).map_err(EngineError::from)
        }

        Expr::Call { name, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(evaluate(arg, editor, engine, vim, depth + 1)?);
            }
            call_function(name, values, editor, engine, vim, depth)
        }

        // --- Operations ---
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, editor, engine, vim, depth + 1)?;
            match op {
                UnaryOp::Negate => match value {
                    VimValue::Float(x) => Ok(VimValue::Float(-x)),
                    other => Ok(VimValue::Int(-other.as_number()?)),
                },
                UnaryOp::Not => Ok(VimValue::Int(!value.is_truthy()? as i64)),
                UnaryOp::Plus => match value {
                    VimValue::Float(x) => Ok(VimValue::Float(x)),
                    other => Ok(VimValue::Int(other.as_number()?)),
                },
            }
        }

        Expr::Binary {
            op,
            case,
            left,
            right,
        } => {
            // Logical operators short-circuit and never reach the table.
            if *op == BinaryOp::And {
                let l = evaluate(left, editor, engine, vim, depth + 1)?;
                if !l.is_truthy()? {
                    return Ok(VimValue::Int(0));
                }
                let r = evaluate(right, editor, engine, vim, depth + 1)?;
                return Ok(VimValue::Int(r.is_truthy()? as i64));
            }
            if *op == BinaryOp::Or {
                let l = evaluate(left, editor, engine, vim, depth + 1)?;
                if l.is_truthy()? {
                    return Ok(VimValue::Int(1));
                }
                let r = evaluate(right, editor, engine, vim, depth + 1)?;
                return Ok(VimValue::Int(r.is_truthy()? as i64));
            }

            let l = evaluate(left, editor, engine, vim, depth + 1)?;
            let r = evaluate(right, editor, engine, vim, depth + 1)?;
            let fold = resolve_case(*case, engine.options.ignorecase);
            match engine.operators.eval(*op, fold, &l, &r) {
                Some(result) => result.map_err(EngineError::from),
                None => Err(EvalError::CannotCompare(l.type_name(), r.type_name()).into()),
            }
        }

        Expr::Ternary {
            condition,
            then_branch,
            else_branch,
        } => {
            let cond = evaluate(condition, editor, engine, vim, depth + 1)?;
            if cond.is_truthy()? {
                evaluate(then_branch, editor, engine, vim, depth + 1)
            } else {
                evaluate(else_branch, editor, engine, vim, depth + 1)
            }
        }
    }
}

/// Resolve a bare comparison against the 'ignorecase' option.
pub fn resolve_case(case: CaseMode, ignorecase: bool) -> CaseFold {
    match case {
        CaseMode::MatchCase => CaseFold::Sensitive,
        CaseMode::IgnoreCase => CaseFold::Ignore,
        CaseMode::Option => {
            if ignorecase {
                CaseFold::Ignore
            } else {
                CaseFold::Sensitive
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Indexing & slicing
// ---------------------------------------------------------------------------

fn index_value(container: &VimValue, key: &VimValue) -> Result<VimValue, EvalError> {
    match container {
        VimValue::List(items) => {
            let items = items.borrow();
            let index = key.as_number()?;
            let resolved = resolve_index(index, items.len())
                .ok_or(EvalError::ListIndexOutOfRange(index))?;
            Ok(items[resolved].clone())
        }
        VimValue::Dict(entries) => {
            let key = key.as_vim_string()?;
            entries
                .borrow()
                .get(&key)
                .cloned()
                .ok_or(EvalError::KeyNotPresent(key))
        }
        VimValue::Str(s) => {
            let index = key.as_number()?;
            if index < 0 {
                return Ok(VimValue::Str(String::new()));
            }
            Ok(VimValue::Str(
                s.chars()
                    .nth(index as usize)
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
            ))
        }
        other => Err(EvalError::CannotIndex(other.type_name())),
    }
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        index + len as i64
    } else {
        index
    };
    if resolved >= 0 && (resolved as usize) < len {
        Some(resolved as usize)
    } else {
        None
    }
}

/// Vim slices are inclusive at both ends; out-of-range bounds clamp
/// rather than fail.
fn slice_value(
    container: &VimValue,
    from: Option<i64>,
    to: Option<i64>,
) -> Result<VimValue, EvalError> {
    match container {
        VimValue::List(items) => {
            let items = items.borrow();
            let (start, end) = slice_bounds(from, to, items.len());
            Ok(VimValue::list(items[start..end].to_vec()))
        }
        VimValue::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = slice_bounds(from, to, chars.len());
            Ok(VimValue::Str(chars[start..end].iter().collect()))
        }
        other => Err(EvalError::CannotIndex(other.type_name())),
    }
}

fn slice_bounds(from: Option<i64>, to: Option<i64>, len: usize) -> (usize, usize) {
    let len = len as i64;
    let start = from.unwrap_or(0);
    let start = if start < 0 { start + len } else { start }.clamp(0, len);
    let end = to.unwrap_or(len - 1);
    let end = if end < 0 { end + len } else { end };
    let end = (end + 1).clamp(start, len);
    (start as usize, end as usize)
}

// ---------------------------------------------------------------------------
// Function calls
// ---------------------------------------------------------------------------

pub(crate) fn call_function(
    name: &VarName,
    args: Vec<VimValue>,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    vim: &mut VimContext,
    depth: usize,
) -> Result<VimValue, EngineError> {
    if name.scope.is_none() {
        if let Some(builtin) = engine.builtins.lookup(&name.name).copied() {
            if args.len() < builtin.min_args {
                return Err(EvalError::NotEnoughArguments(name.name.clone()).into());
            }
            if args.len() > builtin.max_args {
                return Err(EvalError::TooManyArguments(name.name.clone()).into());
            }
            return (builtin.run)(&args, editor, engine);
        }
    }

    let Some(def) = vim.lookup_function(&engine.functions, name) else {
        // A variable holding a funcref is callable through its name.
        if let Some(VimValue::FuncRef(target)) = vim.lookup(&engine.variables, name) {
            let target = VarName::new(None, target, name.span.clone());
            return call_function(&target, args, editor, engine, vim, depth + 1);
        }
        return Err(EvalError::UndefinedFunction(name.display_name()).into());
    };
    call_user_function(&def, args, editor, engine, vim, depth)
}

pub(crate) fn call_user_function(
    def: &FunctionDef,
    args: Vec<VimValue>,
    editor: &mut dyn VimEditor,
    engine: &mut Engine,
    vim: &mut VimContext,
    depth: usize,
) -> Result<VimValue, EngineError> {
    if depth > MAX_DEPTH {
        return Err(EvalError::FunctionCallDepth.into());
    }
    if args.len() > def.params.len() {
        return Err(EvalError::TooManyArguments(def.name.clone()).into());
    }
    if args.len() < def.params.len() {
        return Err(EvalError::NotEnoughArguments(def.name.clone()).into());
    }

    let mut frame = FunctionScope::default();
    for (param, value) in def.params.iter().zip(args) {
        frame.args.insert(param.clone(), value);
    }

    vim.frames.push(frame);
    let outcome = executor::run_units(&def.body, editor, engine, vim, depth + 1);
    vim.frames.pop();

    match outcome? {
        ExecutionResult::Return(value) => Ok(value),
        ExecutionResult::Break => Err(EvalError::BreakWithoutLoop.into()),
        ExecutionResult::Continue => Err(EvalError::ContinueWithoutLoop.into()),
        _ => Ok(VimValue::Int(0)),
    }
}
