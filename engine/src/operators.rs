//! Binary operator registry — maps (operator, case fold) → handler.
//!
//! Handlers are stateless fn pointers shared by every evaluation;
//! `&&`/`||` short-circuit in the evaluator and never reach the table.

use std::collections::HashMap;
use std::cmp::Ordering;

use viml::BinaryOp;

use crate::error::EvalError;
use crate::regex;
use crate::value::VimValue;

/// The case mode after the evaluator resolves a bare operator against
/// the 'ignorecase' option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseFold {
    Sensitive,
    Ignore,
}

pub type BinaryFn = fn(&VimValue, &VimValue) -> Result<VimValue, EvalError>;

pub struct OperatorRegistry {
    ops: HashMap<(BinaryOp, CaseFold), BinaryFn>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self {
            ops: HashMap::new(),
        }
    }

    pub fn register(&mut self, op: BinaryOp, fold: CaseFold, f: BinaryFn) {
        self.ops.insert((op, fold), f);
    }

    /// Register one handler for both case modes (case-blind operators).
    pub fn register_both(&mut self, op: BinaryOp, f: BinaryFn) {
        self.register(op, CaseFold::Sensitive, f);
        self.register(op, CaseFold::Ignore, f);
    }

    /// Evaluate `l op r`. Returns `None` if no handler is registered —
    /// the caller reports that as an evaluation error.
    pub fn eval(
        &self,
        op: BinaryOp,
        fold: CaseFold,
        l: &VimValue,
        r: &VimValue,
    ) -> Option<Result<VimValue, EvalError>> {
        self.ops.get(&(op, fold)).map(|f| f(l, r))
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        let mut r = Self::new();
        register_arithmetic(&mut r);
        register_comparisons(&mut r);
        register_equality(&mut r);
        register_identity(&mut r);
        register_matching(&mut r);
        r
    }
}

// ─── arithmetic ──────────────────────────────────────────────────────────────

fn register_arithmetic(r: &mut OperatorRegistry) {
    use BinaryOp::*;
    r.register_both(Add, |l, r| {
        // `+` concatenates lists; everything else is numeric.
        if let (VimValue::List(a), VimValue::List(b)) = (l, r) {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            return Ok(VimValue::list(items));
        }
        numeric_binop(l, r, |a, b| a + b, |a, b| a + b)
    });
    r.register_both(Subtract, |l, r| {
        numeric_binop(l, r, |a, b| a - b, |a, b| a - b)
    });
    r.register_both(Multiply, |l, r| {
        numeric_binop(l, r, |a, b| a * b, |a, b| a * b)
    });
    r.register_both(Divide, |l, r| {
        if is_float_pair(l, r) {
            // Float division by zero follows IEEE (inf/nan), as Vim does.
            return Ok(VimValue::Float(l.as_float()? / r.as_float()?));
        }
        let b = r.as_number()?;
        if b == 0 {
            return Err(EvalError::DivisionByZero);
        }
        Ok(VimValue::Int(l.as_number()? / b))
    });
    r.register_both(Modulo, |l, r| {
        let b = r.as_number()?;
        if b == 0 {
            return Err(EvalError::DivisionByZero);
        }
        Ok(VimValue::Int(l.as_number()? % b))
    });
    r.register_both(Concat, |l, r| {
        Ok(VimValue::Str(format!(
            "{}{}",
            l.as_vim_string()?,
            r.as_vim_string()?
        )))
    });
}

fn is_float_pair(l: &VimValue, r: &VimValue) -> bool {
    matches!(l, VimValue::Float(_)) || matches!(r, VimValue::Float(_))
}

fn numeric_binop(
    l: &VimValue,
    r: &VimValue,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<VimValue, EvalError> {
    if is_float_pair(l, r) {
        Ok(VimValue::Float(float_op(l.as_float()?, r.as_float()?)))
    } else {
        Ok(VimValue::Int(int_op(l.as_number()?, r.as_number()?)))
    }
}

// ─── relational comparisons ──────────────────────────────────────────────────

fn register_comparisons(r: &mut OperatorRegistry) {
    use BinaryOp::*;
    use CaseFold::{Ignore, Sensitive};
    r.register(Greater, Sensitive, |l, r| cmp_to_int(l, r, Sensitive, Ordering::is_gt));
    r.register(Greater, Ignore, |l, r| cmp_to_int(l, r, Ignore, Ordering::is_gt));
    r.register(GreaterEqual, Sensitive, |l, r| cmp_to_int(l, r, Sensitive, Ordering::is_ge));
    r.register(GreaterEqual, Ignore, |l, r| cmp_to_int(l, r, Ignore, Ordering::is_ge));
    r.register(Less, Sensitive, |l, r| cmp_to_int(l, r, Sensitive, Ordering::is_lt));
    r.register(Less, Ignore, |l, r| cmp_to_int(l, r, Ignore, Ordering::is_lt));
    r.register(LessEqual, Sensitive, |l, r| cmp_to_int(l, r, Sensitive, Ordering::is_le));
    r.register(LessEqual, Ignore, |l, r| cmp_to_int(l, r, Ignore, Ordering::is_le));
}

fn cmp_to_int(
    l: &VimValue,
    r: &VimValue,
    fold: CaseFold,
    test: impl Fn(Ordering) -> bool,
) -> Result<VimValue, EvalError> {
    Ok(VimValue::Int(test(vim_compare(l, r, fold)?) as i64))
}

/// Ordering rule: two strings compare textually (folded or not);
/// anything numeric compares numerically with string coercion;
/// containers have no ordering.
fn vim_compare(l: &VimValue, r: &VimValue, fold: CaseFold) -> Result<Ordering, EvalError> {
    match (l, r) {
        (VimValue::Str(a), VimValue::Str(b)) => Ok(match fold {
            CaseFold::Sensitive => a.cmp(b),
            CaseFold::Ignore => a.to_lowercase().cmp(&b.to_lowercase()),
        }),
        _ if is_float_pair(l, r) => {
            let a = l.as_float()?;
            let b = r.as_float()?;
            Ok(a.partial_cmp(&b).unwrap_or(Ordering::Equal))
        }
        (VimValue::List(_), _)
        | (_, VimValue::List(_))
        | (VimValue::Dict(_), _)
        | (_, VimValue::Dict(_))
        | (VimValue::FuncRef(_), _)
        | (_, VimValue::FuncRef(_)) => {
            Err(EvalError::CannotCompare(l.type_name(), r.type_name()))
        }
        _ => Ok(l.as_number()?.cmp(&r.as_number()?)),
    }
}

// ─── equality ────────────────────────────────────────────────────────────────

fn register_equality(r: &mut OperatorRegistry) {
    use BinaryOp::*;
    r.register(Equal, CaseFold::Sensitive, |l, r| {
        Ok(VimValue::Int(vim_equals(l, r, false) as i64))
    });
    r.register(Equal, CaseFold::Ignore, |l, r| {
        Ok(VimValue::Int(vim_equals(l, r, true) as i64))
    });
    r.register(NotEqual, CaseFold::Sensitive, |l, r| {
        Ok(VimValue::Int(!vim_equals(l, r, false) as i64))
    });
    r.register(NotEqual, CaseFold::Ignore, |l, r| {
        Ok(VimValue::Int(!vim_equals(l, r, true) as i64))
    });
}

/// Coercing equality: strings fold per the case mode, numbers compare
/// across Int/Float/String, containers compare recursively. Mismatched
/// kinds are simply unequal — never an error.
pub fn vim_equals(l: &VimValue, r: &VimValue, ignore_case: bool) -> bool {
    match (l, r) {
        (VimValue::Str(a), VimValue::Str(b)) => {
            if ignore_case {
                a.to_lowercase() == b.to_lowercase()
            } else {
                a == b
            }
        }
        (VimValue::List(a), VimValue::List(b)) => {
            let a = a.borrow();
            let b = b.borrow();
            a.len() == b.len()
                && a.iter().zip(b.iter()).all(|(x, y)| vim_equals(x, y, ignore_case))
        }
        (VimValue::Dict(a), VimValue::Dict(b)) => {
            let a = a.borrow();
            let b = b.borrow();
            a.len() == b.len()
                && a.iter().all(|(k, v)| {
                    b.get(k).is_some_and(|other| vim_equals(v, other, ignore_case))
                })
        }
        (VimValue::FuncRef(a), VimValue::FuncRef(b)) => a == b,
        (VimValue::List(_), _) | (_, VimValue::List(_)) => false,
        (VimValue::Dict(_), _) | (_, VimValue::Dict(_)) => false,
        (VimValue::FuncRef(_), _) | (_, VimValue::FuncRef(_)) => false,
        _ => match (l.as_number(), r.as_number(), is_float_pair(l, r)) {
            (_, _, true) => match (l.as_float(), r.as_float()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            },
            (Ok(a), Ok(b), false) => a == b,
            _ => false,
        },
    }
}

// ─── identity (`is` / `isnot`) ───────────────────────────────────────────────

fn register_identity(r: &mut OperatorRegistry) {
    use BinaryOp::*;
    r.register(Is, CaseFold::Sensitive, |l, r| {
        Ok(VimValue::Int(vim_is(l, r, false) as i64))
    });
    r.register(Is, CaseFold::Ignore, |l, r| {
        Ok(VimValue::Int(vim_is(l, r, true) as i64))
    });
    r.register(IsNot, CaseFold::Sensitive, |l, r| {
        Ok(VimValue::Int(!vim_is(l, r, false) as i64))
    });
    r.register(IsNot, CaseFold::Ignore, |l, r| {
        Ok(VimValue::Int(!vim_is(l, r, true) as i64))
    });
}

/// `is`/`isnot`: containers compare by instance. Strings compare
/// textually, folded under the ignore-case variants. Everything else
/// falls back to strict (type tag + value) equality regardless of the
/// case mode — that fallback is Vim's defined behavior for non-string
/// operands, not an accident.
fn vim_is(l: &VimValue, r: &VimValue, ignore_case: bool) -> bool {
    match (l, r) {
        (VimValue::List(_), VimValue::List(_)) | (VimValue::Dict(_), VimValue::Dict(_)) => {
            l.same_instance(r)
        }
        (VimValue::Str(a), VimValue::Str(b)) => {
            if ignore_case {
                a.to_lowercase() == b.to_lowercase()
            } else {
                a == b
            }
        }
        _ => l == r,
    }
}

// ─── pattern matching (`=~` / `!~`) ──────────────────────────────────────────

fn register_matching(r: &mut OperatorRegistry) {
    use BinaryOp::*;
    r.register(Matches, CaseFold::Sensitive, |l, r| {
        Ok(VimValue::Int(matches_pattern(l, r, false)? as i64))
    });
    r.register(Matches, CaseFold::Ignore, |l, r| {
        Ok(VimValue::Int(matches_pattern(l, r, true)? as i64))
    });
    r.register(NotMatches, CaseFold::Sensitive, |l, r| {
        Ok(VimValue::Int(!matches_pattern(l, r, false)? as i64))
    });
    r.register(NotMatches, CaseFold::Ignore, |l, r| {
        Ok(VimValue::Int(!matches_pattern(l, r, true)? as i64))
    });
}

fn matches_pattern(
    l: &VimValue,
    r: &VimValue,
    ignore_case: bool,
) -> Result<bool, EvalError> {
    let text = l.as_vim_string()?;
    let pattern = r.as_vim_string()?;
    let compiled = regex::compile(&pattern, ignore_case)
        .map_err(|e| EvalError::InvalidPattern(e.message))?;
    // A budget overrun is reported as "no match" here; the pattern was
    // valid, it just cost too much.
    match compiled.find_from(&text, 0) {
        Ok(found) => Ok(found.is_some()),
        Err(_) => Ok(false),
    }
}
