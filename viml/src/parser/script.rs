use std::ops::Range;

use crate::expression::Expr;
use crate::parser::command::parse_command_line;
use crate::parser::error::ParseError;
use crate::parser::expression::{
    ExprParser, Token, make_var_name, parse_expression_at, tokenize,
};
use crate::script::{LetOp, LetTarget, Script, Statement};

/// Parse full script source into a `Script`. Every statement-level
/// failure is recorded and parsing continues with the next statement,
/// so all errors are reported in one pass.
pub(crate) fn parse_script(source: &str, file_id: usize) -> Result<Script, Vec<ParseError>> {
    let lines = split_logical_lines(source);
    let mut parser = ScriptParser {
        lines,
        pos: 0,
        file_id,
        errors: Vec::new(),
    };
    let (units, _) = parser.parse_until(&[]);
    if parser.errors.is_empty() {
        Ok(Script {
            units,
            source_id: file_id,
        })
    } else {
        Err(parser.errors)
    }
}

// ---------------------------------------------------------------------------
// Logical lines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct LogicalLine {
    text: String,
    span: Range<usize>,
}

/// Split source into logical lines: blank lines and `"` comment lines
/// are dropped, and a line whose first non-blank character is `\` is
/// joined onto the previous line.
fn split_logical_lines(source: &str) -> Vec<LogicalLine> {
    let mut lines = Vec::new();
    let mut pending: Option<LogicalLine> = None;
    let mut offset = 0usize;

    for raw in source.split_inclusive('\n') {
        let start = offset;
        offset += raw.len();

        let line = raw.trim_end_matches(['\n', '\r']);
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some(rest) = trimmed.strip_prefix('\\') {
            if let Some(p) = pending.as_mut() {
                p.text.push_str(rest);
                p.span.end = start + line.len();
                continue;
            }
            // A continuation with nothing to continue: keep the tail as
            // its own line so the statement parser can report it.
        }

        if let Some(p) = pending.take() {
            lines.push(p);
        }

        if trimmed.is_empty() || trimmed.starts_with('"') {
            continue;
        }

        pending = Some(LogicalLine {
            text: trimmed.to_string(),
            span: start + indent..start + line.len(),
        });
    }

    if let Some(p) = pending.take() {
        lines.push(p);
    }
    lines
}

// ---------------------------------------------------------------------------
// Statement parser
// ---------------------------------------------------------------------------

/// A block terminator line (`endif`, `catch /pat/`, ...): the keyword,
/// the rest of the line, and the rest's offset in the file.
struct Terminator {
    word: String,
    rest: String,
    rest_base: usize,
}

struct ScriptParser {
    lines: Vec<LogicalLine>,
    pos: usize,
    file_id: usize,
    errors: Vec<ParseError>,
}

impl ScriptParser {
    /// Parse statements until one of `terminators` is seen or the input
    /// ends. Returns the statements and the terminator that stopped us.
    fn parse_until(&mut self, terminators: &[&str]) -> (Vec<Statement>, Option<Terminator>) {
        let mut units = Vec::new();

        while self.pos < self.lines.len() {
            let line = self.lines[self.pos].clone();
            self.pos += 1;

            // Leading colons are allowed on any statement.
            let mut text = line.text.as_str();
            let mut base = line.span.start;
            while let Some(stripped) = text.strip_prefix(':') {
                text = stripped;
                base += 1;
            }
            if text.trim().is_empty() {
                continue;
            }

            let (word, rest, rest_base) = split_keyword(text, base);

            if terminators.contains(&word) {
                return (
                    units,
                    Some(Terminator {
                        word: word.to_string(),
                        rest: rest.to_string(),
                        rest_base,
                    }),
                );
            }

            match word {
                "let" => {
                    if let Some(stmt) = self.parse_let(rest, rest_base, line.span.clone()) {
                        units.push(stmt);
                    }
                }
                "unlet" => {
                    if let Some(stmt) = self.parse_unlet(rest, rest_base, line.span.clone()) {
                        units.push(stmt);
                    }
                }
                "if" => {
                    let stmt = self.parse_if(rest, rest_base);
                    units.push(stmt);
                }
                "while" => {
                    let condition = self.expression_or_zero(rest, rest_base);
                    let (body, term) = self.parse_until(&["endwhile"]);
                    if term.is_none() {
                        self.missing(line.span.clone(), "missing :endwhile");
                    }
                    units.push(Statement::While { condition, body });
                }
                "for" => {
                    if let Some(stmt) = self.parse_for(rest, rest_base, line.span.clone()) {
                        units.push(stmt);
                    }
                }
                "try" => {
                    units.push(self.parse_try(line.span.clone()));
                }
                "function" => {
                    if let Some(stmt) = self.parse_function(rest, rest_base, line.span.clone()) {
                        units.push(stmt);
                    }
                }
                "return" => {
                    let value = if rest.trim().is_empty() {
                        None
                    } else {
                        match parse_expression_at(rest.trim_start(), rest_base, self.file_id) {
                            Ok(expr) => Some(expr),
                            Err(e) => {
                                self.errors.push(e);
                                None
                            }
                        }
                    };
                    units.push(Statement::Return(value));
                }
                "break" => units.push(Statement::Break),
                "continue" => units.push(Statement::Continue),
                "finish" => units.push(Statement::Finish),
                "elseif" | "else" | "endif" | "endwhile" | "endfor" | "endtry" | "catch"
                | "finally" | "endfunction" => {
                    self.errors.push(ParseError::at_token(
                        format!("`:{}` without a matching opening statement", word),
                        word,
                        line.span.clone(),
                        self.file_id,
                    ));
                }
                _ => {
                    // Everything else is an Ex command line, or failing
                    // that, a bare expression statement.
                    match parse_command_line(text, base, self.file_id) {
                        Ok(cmd) if cmd.name.is_empty() && cmd.range.is_empty() => {
                            match parse_expression_at(text, base, self.file_id) {
                                Ok(expr) => {
                                    units.push(Statement::Expression(expr, line.span.clone()));
                                }
                                Err(e) => self.errors.push(e),
                            }
                        }
                        Ok(cmd) => units.push(Statement::Command(cmd)),
                        Err(e) => self.errors.push(e),
                    }
                }
            }
        }

        (units, None)
    }

    fn missing(&mut self, span: Range<usize>, message: &str) {
        self.errors
            .push(ParseError::error(message, span, self.file_id));
    }

    /// Parse an expression, or record the error and fall back to `0` so
    /// the surrounding block structure stays intact.
    fn expression_or_zero(&mut self, source: &str, base: usize) -> Expr {
        match parse_expression_at(source.trim_start(), base, self.file_id) {
            Ok(expr) => expr,
            Err(e) => {
                self.errors.push(e);
                Expr::Number(0)
            }
        }
    }

    fn parse_let(&mut self, rest: &str, base: usize, span: Range<usize>) -> Option<Statement> {
        let result = (|| {
            let tokens = tokenize(rest, base, self.file_id)?;
            let mut p = ExprParser::new(tokens, span.clone(), self.file_id);
            let name = p.expect_var_name()?;
            let target = if p.peek() == Some(&Token::LBracket) {
                p.advance();
                let index = p.parse_expr(0)?;
                p.expect(&Token::RBracket)?;
                LetTarget::Index { name, index }
            } else {
                LetTarget::Var(name)
            };
            let op = match p.advance() {
                Some((Token::Assign, _)) => LetOp::Assign,
                Some((Token::PlusAssign, _)) => LetOp::Add,
                Some((Token::MinusAssign, _)) => LetOp::Subtract,
                Some((Token::DotAssign, _)) => LetOp::Concat,
                _ => return Err(ParseError::error(
                    "expected `=`, `+=`, `-=` or `.=` after :let target",
                    span.clone(),
                    self.file_id,
                )),
            };
            let value = p.parse_expr(0)?;
            if !p.at_end() {
                return Err(p.error("unexpected tokens after :let value"));
            }
            Ok(Statement::Let {
                target,
                op,
                value,
                span: span.clone(),
            })
        })();
        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    fn parse_unlet(&mut self, rest: &str, base: usize, span: Range<usize>) -> Option<Statement> {
        let result = (|| {
            let tokens = tokenize(rest, base, self.file_id)?;
            let mut p = ExprParser::new(tokens, span.clone(), self.file_id);
            let mut targets = Vec::new();
            while !p.at_end() {
                targets.push(p.expect_var_name()?);
            }
            if targets.is_empty() {
                return Err(ParseError::error(
                    "argument required for :unlet",
                    span.clone(),
                    self.file_id,
                ));
            }
            Ok(Statement::Unlet {
                targets,
                span: span.clone(),
            })
        })();
        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    fn parse_if(&mut self, cond_src: &str, base: usize) -> Statement {
        let mut branches: Vec<(Option<Expr>, Vec<Statement>)> = Vec::new();
        let mut condition = Some(self.expression_or_zero(cond_src, base));

        loop {
            let (body, term) = self.parse_until(&["elseif", "else", "endif"]);
            match term {
                Some(t) if t.word == "elseif" => {
                    branches.push((condition.take(), body));
                    condition = Some(self.expression_or_zero(&t.rest, t.rest_base));
                }
                Some(t) if t.word == "else" => {
                    branches.push((condition.take(), body));
                    let (else_body, term) = self.parse_until(&["endif"]);
                    branches.push((None, else_body));
                    if term.is_none() {
                        self.missing(0..0, "missing :endif");
                    }
                    break;
                }
                Some(_) => {
                    branches.push((condition.take(), body));
                    break;
                }
                None => {
                    self.missing(0..0, "missing :endif");
                    branches.push((condition.take(), body));
                    break;
                }
            }
        }

        Statement::If { branches }
    }

    fn parse_for(&mut self, rest: &str, base: usize, span: Range<usize>) -> Option<Statement> {
        let header = (|| {
            let tokens = tokenize(rest, base, self.file_id)?;
            let mut p = ExprParser::new(tokens, span.clone(), self.file_id);
            let variable = p.expect_var_name()?;
            match p.advance() {
                Some((Token::Ident(word), _)) if word == "in" => {}
                _ => {
                    return Err(ParseError::error(
                        "expected `in` after :for variable",
                        span.clone(),
                        self.file_id,
                    ));
                }
            }
            let iterable = p.parse_expr(0)?;
            if !p.at_end() {
                return Err(p.error("unexpected tokens after :for expression"));
            }
            Ok((variable, iterable))
        })();

        let (body, term) = self.parse_until(&["endfor"]);
        if term.is_none() {
            self.missing(span.clone(), "missing :endfor");
        }

        match header {
            Ok((variable, iterable)) => Some(Statement::For {
                variable,
                iterable,
                body,
            }),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    fn parse_try(&mut self, span: Range<usize>) -> Statement {
        let (body, mut term) = self.parse_until(&["catch", "finally", "endtry"]);
        let mut catches = Vec::new();
        let mut finally = None;

        loop {
            match term {
                Some(t) if t.word == "catch" => {
                    let pattern = parse_catch_pattern(&t.rest);
                    let (catch_body, next) = self.parse_until(&["catch", "finally", "endtry"]);
                    catches.push((pattern, catch_body));
                    term = next;
                }
                Some(t) if t.word == "finally" => {
                    let (finally_body, next) = self.parse_until(&["endtry"]);
                    finally = Some(finally_body);
                    if next.is_none() {
                        self.missing(span.clone(), "missing :endtry");
                    }
                    break;
                }
                Some(_) => break,
                None => {
                    self.missing(span.clone(), "missing :endtry");
                    break;
                }
            }
        }

        Statement::Try {
            body,
            catches,
            finally,
        }
    }

    fn parse_function(
        &mut self,
        rest: &str,
        base: usize,
        span: Range<usize>,
    ) -> Option<Statement> {
        let (bang, rest, base) = match rest.strip_prefix('!') {
            Some(stripped) => (true, stripped, base + 1),
            None => (false, rest, base),
        };
        let rest = rest.trim_start();

        let header = (|| {
            let open = rest.find('(').ok_or_else(|| {
                ParseError::error(
                    "expected `(` after function name",
                    span.clone(),
                    self.file_id,
                )
            })?;
            let close = rest.rfind(')').filter(|&c| c > open).ok_or_else(|| {
                ParseError::error("missing `)` in function header", span.clone(), self.file_id)
            })?;

            let name_text = rest[..open].trim();
            if name_text.is_empty() {
                return Err(ParseError::error(
                    "expected function name",
                    span.clone(),
                    self.file_id,
                ));
            }
            let name = make_var_name(name_text.to_string(), base..base + open);

            let params: Vec<String> = rest[open + 1..close]
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            // Trailing modifiers (`abort`, `range`, ...) are accepted
            // and have no effect in this engine.
            Ok((name, params))
        })();

        let (body, term) = self.parse_until(&["endfunction"]);
        if term.is_none() {
            self.missing(span.clone(), "missing :endfunction");
        }

        match header {
            Ok((name, params)) => Some(Statement::Function {
                name,
                params,
                bang,
                body,
                span,
            }),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }
}

/// Split a statement line into its leading keyword (alphabetic run) and
/// the remainder. Returns (keyword, rest, rest byte offset).
fn split_keyword(text: &str, base: usize) -> (&str, &str, usize) {
    let end = text
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(text.len());
    let (word, rest) = text.split_at(end);
    (word, rest, base + end)
}

/// A catch pattern: `catch /E484/` keeps `E484`; bare text is used
/// verbatim; an empty rest means "catch everything".
fn parse_catch_pattern(rest: &str) -> Option<String> {
    let trimmed = rest.trim();
    if trimmed.is_empty() {
        return None;
    }
    let inner = trimmed
        .strip_prefix('/')
        .and_then(|s| s.strip_suffix('/'))
        .unwrap_or(trimmed);
    Some(inner.to_string())
}
