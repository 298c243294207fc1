use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::EvalError;

/// A runtime value. Lists and dictionaries have reference semantics:
/// cloning the value aliases the underlying container, as in Vim.
#[derive(Debug, Clone)]
pub enum VimValue {
    Int(i64),
    Float(f64),
    Str(String),
    List(Rc<RefCell<Vec<VimValue>>>),
    Dict(Rc<RefCell<BTreeMap<String, VimValue>>>),
    FuncRef(String),
}

impl VimValue {
    pub fn list(items: Vec<VimValue>) -> Self {
        VimValue::List(Rc::new(RefCell::new(items)))
    }

    pub fn dict(entries: BTreeMap<String, VimValue>) -> Self {
        VimValue::Dict(Rc::new(RefCell::new(entries)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            VimValue::Int(_) => "Number",
            VimValue::Float(_) => "Float",
            VimValue::Str(_) => "String",
            VimValue::List(_) => "List",
            VimValue::Dict(_) => "Dictionary",
            VimValue::FuncRef(_) => "Funcref",
        }
    }

    /// The code returned by `type()`.
    pub fn type_code(&self) -> i64 {
        match self {
            VimValue::Int(_) => 0,
            VimValue::Str(_) => 1,
            VimValue::FuncRef(_) => 2,
            VimValue::List(_) => 3,
            VimValue::Dict(_) => 4,
            VimValue::Float(_) => 5,
        }
    }

    /// Coerce to a Number. Strings use their longest leading numeric
    /// prefix; containers, floats and funcrefs are errors, never panics.
    pub fn as_number(&self) -> Result<i64, EvalError> {
        match self {
            VimValue::Int(n) => Ok(*n),
            VimValue::Str(s) => Ok(str_to_number(s)),
            other => Err(EvalError::NumberRequired(other.type_name())),
        }
    }

    /// Coerce to a Float for mixed arithmetic. Strings go through the
    /// Number coercion first, matching Vim.
    pub fn as_float(&self) -> Result<f64, EvalError> {
        match self {
            VimValue::Float(x) => Ok(*x),
            other => Ok(other.as_number()? as f64),
        }
    }

    /// Coerce to a String, as `.` concatenation does.
    pub fn as_vim_string(&self) -> Result<String, EvalError> {
        match self {
            VimValue::Int(n) => Ok(n.to_string()),
            VimValue::Str(s) => Ok(s.clone()),
            other => Err(EvalError::StringRequired(other.type_name())),
        }
    }

    pub fn is_truthy(&self) -> Result<bool, EvalError> {
        Ok(self.as_number()? != 0)
    }

    /// True when both values alias the same container. Non-container
    /// values are never "the same instance".
    pub fn same_instance(&self, other: &VimValue) -> bool {
        match (self, other) {
            (VimValue::List(a), VimValue::List(b)) => Rc::ptr_eq(a, b),
            (VimValue::Dict(a), VimValue::Dict(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The text `:echo` displays: strings bare at top level, quoted
    /// inside containers.
    pub fn echo_string(&self) -> String {
        match self {
            VimValue::Str(s) => s.clone(),
            other => other.quoted_string(),
        }
    }

    /// The text `string()` produces (strings single-quoted).
    pub fn quoted_string(&self) -> String {
        match self {
            VimValue::Int(n) => n.to_string(),
            VimValue::Float(x) => format_float(*x),
            VimValue::Str(s) => format!("'{}'", s.replace('\'', "''")),
            VimValue::List(items) => {
                let inner: Vec<String> =
                    items.borrow().iter().map(|v| v.quoted_string()).collect();
                format!("[{}]", inner.join(", "))
            }
            VimValue::Dict(entries) => {
                let inner: Vec<String> = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("'{}': {}", k, v.quoted_string()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            VimValue::FuncRef(name) => format!("function('{}')", name),
        }
    }
}

impl fmt::Display for VimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.echo_string())
    }
}

/// Strict structural equality: same type tag and equal contents, no
/// numeric or string coercion. Containers compare by value here; the
/// `is`/`isnot` operators compare container identity separately.
impl PartialEq for VimValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (VimValue::Int(a), VimValue::Int(b)) => a == b,
            (VimValue::Float(a), VimValue::Float(b)) => a == b,
            (VimValue::Str(a), VimValue::Str(b)) => a == b,
            (VimValue::List(a), VimValue::List(b)) => *a.borrow() == *b.borrow(),
            (VimValue::Dict(a), VimValue::Dict(b)) => *a.borrow() == *b.borrow(),
            (VimValue::FuncRef(a), VimValue::FuncRef(b)) => a == b,
            _ => false,
        }
    }
}

/// Vim's implicit string-to-number rule: optional sign, then the
/// longest leading decimal (or `0x` hexadecimal) run; anything else
/// is 0.
pub fn str_to_number(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let value = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        let run: String = hex.chars().take_while(|c| c.is_ascii_hexdigit()).collect();
        i64::from_str_radix(&run, 16).unwrap_or(0)
    } else {
        let run: String = digits.chars().take_while(|c| c.is_ascii_digit()).collect();
        run.parse::<i64>().unwrap_or(0)
    };

    if negative { -value } else { value }
}

/// Floats always print with a decimal point (or exponent), so they
/// stay distinguishable from Numbers.
pub fn format_float(x: f64) -> String {
    let text = format!("{}", x);
    if text.contains('.') || text.contains('e') || text.contains("inf") || text.contains("NaN") {
        text
    } else {
        format!("{}.0", text)
    }
}
