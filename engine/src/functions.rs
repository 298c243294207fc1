//! Builtin function registry — name → arity-checked handler.

use std::collections::HashMap;

use crate::Engine;
use crate::editor::{LocationInfo, VimEditor};
use crate::error::{EngineError, EvalError};
use crate::regex;
use crate::value::{VimValue, str_to_number};

pub type BuiltinFn =
    fn(&[VimValue], &mut dyn VimEditor, &mut Engine) -> Result<VimValue, EngineError>;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    pub run: BuiltinFn,
}

pub struct FunctionRegistry {
    map: HashMap<&'static str, Builtin>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        FunctionRegistry {
            map: HashMap::new(),
        }
    }

    fn register(&mut self, name: &'static str, min_args: usize, max_args: usize, run: BuiltinFn) {
        self.map.insert(
            name,
            Builtin {
                name,
                min_args,
                max_args,
                run,
            },
        );
    }

    pub fn lookup(&self, name: &str) -> Option<&Builtin> {
        self.map.get(name)
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut r = Self::new();
        r.register("abs", 1, 1, builtin_abs);
        r.register("add", 2, 2, builtin_add);
        r.register("col", 1, 1, builtin_col);
        r.register("empty", 1, 1, builtin_empty);
        r.register("function", 1, 1, builtin_function);
        r.register("get", 2, 3, builtin_get);
        r.register("has_key", 2, 2, builtin_has_key);
        r.register("join", 1, 2, builtin_join);
        r.register("len", 1, 1, builtin_len);
        r.register("line", 1, 1, builtin_line);
        r.register("match", 2, 3, builtin_match);
        r.register("matchstr", 2, 3, builtin_matchstr);
        r.register("printf", 1, 9, builtin_printf);
        r.register("split", 1, 2, builtin_split);
        r.register("string", 1, 1, builtin_string);
        r.register("str2nr", 1, 2, builtin_str2nr);
        r.register("tolower", 1, 1, builtin_tolower);
        r.register("toupper", 1, 1, builtin_toupper);
        r.register("type", 1, 1, builtin_type);
        r.register("wordcount", 0, 0, builtin_wordcount);
        r
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn builtin_abs(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    match &args[0] {
        VimValue::Float(x) => Ok(VimValue::Float(x.abs())),
        other => Ok(VimValue::Int(other.as_number()?.abs())),
    }
}

fn builtin_add(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    match &args[0] {
        VimValue::List(items) => {
            items.borrow_mut().push(args[1].clone());
            Ok(args[0].clone())
        }
        other => Err(EvalError::ListRequired(other.type_name()).into()),
    }
}

fn builtin_col(
    args: &[VimValue],
    editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    match args[0].as_vim_string()?.as_str() {
        "." => {
            let line = editor.caret_line();
            let column = editor.caret_offset() - editor.line_start_offset(line) + 1;
            Ok(VimValue::Int(column as i64))
        }
        _ => Ok(VimValue::Int(0)),
    }
}

fn builtin_empty(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    let empty = match &args[0] {
        VimValue::Int(n) => *n == 0,
        VimValue::Float(x) => *x == 0.0,
        VimValue::Str(s) => s.is_empty(),
        VimValue::List(items) => items.borrow().is_empty(),
        VimValue::Dict(entries) => entries.borrow().is_empty(),
        VimValue::FuncRef(_) => false,
    };
    Ok(VimValue::Int(empty as i64))
}

fn builtin_function(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    Ok(VimValue::FuncRef(args[0].as_vim_string()?))
}

fn builtin_get(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    let fallback = args.get(2).cloned().unwrap_or(VimValue::Int(0));
    match &args[0] {
        VimValue::List(items) => {
            let items = items.borrow();
            let index = args[1].as_number()?;
            let resolved = if index < 0 {
                index + items.len() as i64
            } else {
                index
            };
            if resolved >= 0 && (resolved as usize) < items.len() {
                Ok(items[resolved as usize].clone())
            } else {
                Ok(fallback)
            }
        }
        VimValue::Dict(entries) => {
            let key = args[1].as_vim_string()?;
            Ok(entries.borrow().get(&key).cloned().unwrap_or(fallback))
        }
        other => Err(EvalError::ListRequired(other.type_name()).into()),
    }
}

fn builtin_has_key(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    match &args[0] {
        VimValue::Dict(entries) => {
            let key = args[1].as_vim_string()?;
            Ok(VimValue::Int(entries.borrow().contains_key(&key) as i64))
        }
        other => Err(EvalError::DictRequired(other.type_name()).into()),
    }
}

fn builtin_join(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    let separator = match args.get(1) {
        Some(sep) => sep.as_vim_string()?,
        None => " ".to_string(),
    };
    match &args[0] {
        VimValue::List(items) => {
            let parts: Vec<String> = items.borrow().iter().map(|v| v.echo_string()).collect();
            Ok(VimValue::Str(parts.join(&separator)))
        }
        other => Err(EvalError::ListRequired(other.type_name()).into()),
    }
}

fn builtin_len(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    let length = match &args[0] {
        VimValue::Int(n) => n.to_string().chars().count(),
        VimValue::Str(s) => s.chars().count(),
        VimValue::List(items) => items.borrow().len(),
        VimValue::Dict(entries) => entries.borrow().len(),
        other => return Err(EvalError::StringRequired(other.type_name()).into()),
    };
    Ok(VimValue::Int(length as i64))
}

fn builtin_line(
    args: &[VimValue],
    editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    match args[0].as_vim_string()?.as_str() {
        "." => Ok(VimValue::Int(editor.caret_line() as i64)),
        "$" => Ok(VimValue::Int(editor.line_count() as i64)),
        _ => Ok(VimValue::Int(0)),
    }
}

fn builtin_match(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    let (_, found) = find_match(args, engine)?;
    Ok(VimValue::Int(
        found.map(|m| m.start as i64).unwrap_or(-1),
    ))
}

fn builtin_matchstr(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    let (text, found) = find_match(args, engine)?;
    let matched = match found {
        Some(m) => text.chars().skip(m.start).take(m.end - m.start).collect(),
        None => String::new(),
    };
    Ok(VimValue::Str(matched))
}

fn find_match(
    args: &[VimValue],
    engine: &mut Engine,
) -> Result<(String, Option<regex::PatternMatch>), EngineError> {
    let text = args[0].as_vim_string()?;
    let pattern = args[1].as_vim_string()?;
    let start = match args.get(2) {
        Some(v) => v.as_number()?.max(0) as usize,
        None => 0,
    };
    let compiled = regex::compile(&pattern, engine.options.ignorecase)?;
    let found = compiled.find_from(&text, start)?;
    Ok((text, found))
}

fn builtin_printf(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    let format = args[0].as_vim_string()?;
    let mut out = String::new();
    let mut next_arg = 1;
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('s') => {
                let arg = args
                    .get(next_arg)
                    .ok_or_else(|| EvalError::NotEnoughArguments("printf".to_string()))?;
                out.push_str(&arg.echo_string());
                next_arg += 1;
            }
            Some('d') => {
                let arg = args
                    .get(next_arg)
                    .ok_or_else(|| EvalError::NotEnoughArguments("printf".to_string()))?;
                out.push_str(&arg.as_number()?.to_string());
                next_arg += 1;
            }
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    Ok(VimValue::Str(out))
}

fn builtin_split(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    let text = args[0].as_vim_string()?;

    let pieces: Vec<VimValue> = match args.get(1) {
        None => text
            .split_whitespace()
            .map(|s| VimValue::Str(s.to_string()))
            .collect(),
        Some(pattern) => {
            let pattern = pattern.as_vim_string()?;
            let compiled = regex::compile(&pattern, engine.options.ignorecase)?;
            let chars: Vec<char> = text.chars().collect();
            let mut pieces = Vec::new();
            let mut at = 0;
            while at <= chars.len() {
                match compiled.find_from(&text, at)? {
                    Some(m) if m.end > m.start => {
                        let piece: String = chars[at..m.start].iter().collect();
                        if !piece.is_empty() {
                            pieces.push(VimValue::Str(piece));
                        }
                        at = m.end;
                    }
                    _ => {
                        let piece: String = chars[at..].iter().collect();
                        if !piece.is_empty() {
                            pieces.push(VimValue::Str(piece));
                        }
                        break;
                    }
                }
            }
            pieces
        }
    };
    Ok(VimValue::list(pieces))
}

fn builtin_string(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    Ok(VimValue::Str(args[0].quoted_string()))
}

fn builtin_str2nr(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    let text = args[0].as_vim_string()?;
    let base = match args.get(1) {
        Some(v) => v.as_number()?,
        None => 10,
    };
    let value = match base {
        16 => {
            let t = text.trim();
            let t = t
                .strip_prefix("0x")
                .or_else(|| t.strip_prefix("0X"))
                .unwrap_or(t);
            i64::from_str_radix(t, 16).unwrap_or(0)
        }
        _ => str_to_number(&text),
    };
    Ok(VimValue::Int(value))
}

fn builtin_tolower(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    Ok(VimValue::Str(args[0].as_vim_string()?.to_lowercase()))
}

fn builtin_toupper(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    Ok(VimValue::Str(args[0].as_vim_string()?.to_uppercase()))
}

fn builtin_type(
    args: &[VimValue],
    _editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    Ok(VimValue::Int(args[0].type_code()))
}

/// Word/character counts for the buffer and the caret position, a pure
/// function of text content and caret offset.
fn builtin_wordcount(
    _args: &[VimValue],
    editor: &mut dyn VimEditor,
    _engine: &mut Engine,
) -> Result<VimValue, EngineError> {
    let info = LocationInfo::compute(editor.text(), editor.caret_offset());
    let mut map = std::collections::BTreeMap::new();
    map.insert("words".to_string(), VimValue::Int(info.word_total as i64));
    map.insert(
        "chars".to_string(),
        VimValue::Int(info.character_total as i64),
    );
    map.insert("cursor_words".to_string(), VimValue::Int(info.word as i64));
    map.insert(
        "cursor_chars".to_string(),
        VimValue::Int(info.character as i64),
    );
    Ok(VimValue::dict(map))
}
