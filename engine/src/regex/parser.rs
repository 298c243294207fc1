use crate::regex::RegexCompileError;
use crate::regex::matcher::{CharClass, Matcher};

/// Parsed pattern tree, compiled into the automaton afterwards. Counted
/// repeats expand during automaton construction, which is why parsing
/// and building are separate passes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PatternAst {
    Empty,
    Single(Matcher),
    Concat(Vec<PatternAst>),
    Alternate(Vec<PatternAst>),
    Group(usize, Box<PatternAst>),
    Repeat {
        inner: Box<PatternAst>,
        min: usize,
        max: Option<usize>,
        lazy: bool,
    },
}

pub(crate) struct ParsedPattern {
    pub ast: PatternAst,
    pub group_count: usize,
    /// Set when the pattern embeds `\c` (true) or `\C` (false).
    pub case_override: Option<bool>,
}

/// Parse a pattern in magic mode. Never touches shared state: an
/// invalid pattern returns an error and nothing else.
pub(crate) fn parse(pattern: &str) -> Result<ParsedPattern, RegexCompileError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut parser = PatternParser {
        chars,
        pos: 0,
        group_count: 0,
        case_override: None,
    };
    let ast = parser.parse_alternation()?;
    if parser.pos < parser.chars.len() {
        // Only an unmatched `\)` can stop the top-level parse early.
        return Err(parser.error("unmatched \\)"));
    }
    Ok(ParsedPattern {
        ast,
        group_count: parser.group_count,
        case_override: parser.case_override,
    })
}

struct PatternParser {
    chars: Vec<char>,
    pos: usize,
    group_count: usize,
    case_override: Option<bool>,
}

impl PatternParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn error(&self, message: impl Into<String>) -> RegexCompileError {
        RegexCompileError {
            message: message.into(),
            position: self.pos,
        }
    }

    /// True when the upcoming input ends the current branch.
    fn at_branch_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some('\\') => matches!(self.peek2(), Some('|') | Some(')')),
            _ => false,
        }
    }

    fn parse_alternation(&mut self) -> Result<PatternAst, RegexCompileError> {
        let mut branches = vec![self.parse_branch()?];
        while self.peek() == Some('\\') && self.peek2() == Some('|') {
            self.pos += 2;
            branches.push(self.parse_branch()?);
        }
        if branches.len() == 1 {
            Ok(branches.pop().expect("one branch"))
        } else {
            Ok(PatternAst::Alternate(branches))
        }
    }

    fn parse_branch(&mut self) -> Result<PatternAst, RegexCompileError> {
        let mut pieces: Vec<PatternAst> = Vec::new();

        while !self.at_branch_end() {
            let piece_index = pieces.len();
            let Some(atom) = self.parse_atom(piece_index)? else {
                continue; // case flag, contributes nothing
            };

            let atom = match self.parse_quantifier(&atom)? {
                Some(repeat) => repeat,
                None => atom,
            };
            pieces.push(atom);
        }

        match pieces.len() {
            0 => Ok(PatternAst::Empty),
            1 => Ok(pieces.pop().expect("one piece")),
            _ => Ok(PatternAst::Concat(pieces)),
        }
    }

    /// Parse one atom. Returns None for the zero-width case flags,
    /// which only set parser state.
    fn parse_atom(&mut self, piece_index: usize) -> Result<Option<PatternAst>, RegexCompileError> {
        let c = self.peek().ok_or_else(|| self.error("expected atom"))?;

        match c {
            '.' => {
                self.pos += 1;
                Ok(Some(PatternAst::Single(Matcher::AnyChar)))
            }
            '*' => {
                // `*` with nothing to repeat is a literal star.
                self.pos += 1;
                Ok(Some(PatternAst::Single(Matcher::Char('*'))))
            }
            '^' => {
                self.pos += 1;
                if piece_index == 0 {
                    Ok(Some(PatternAst::Single(Matcher::StartOfLine)))
                } else {
                    Ok(Some(PatternAst::Single(Matcher::Char('^'))))
                }
            }
            '$' => {
                self.pos += 1;
                if self.at_branch_end() {
                    Ok(Some(PatternAst::Single(Matcher::EndOfLine)))
                } else {
                    Ok(Some(PatternAst::Single(Matcher::Char('$'))))
                }
            }
            '[' => {
                self.pos += 1;
                Ok(Some(self.parse_collection()?))
            }
            '\\' => {
                let next = self
                    .peek2()
                    .ok_or_else(|| self.error("trailing backslash"))?;
                self.pos += 2;
                match next {
                    'd' => Ok(Some(PatternAst::Single(Matcher::Class(CharClass::Digit)))),
                    'D' => Ok(Some(PatternAst::Single(Matcher::Class(CharClass::NotDigit)))),
                    'w' => Ok(Some(PatternAst::Single(Matcher::Class(CharClass::Word)))),
                    'W' => Ok(Some(PatternAst::Single(Matcher::Class(CharClass::NotWord)))),
                    's' => Ok(Some(PatternAst::Single(Matcher::Class(CharClass::Space)))),
                    'S' => Ok(Some(PatternAst::Single(Matcher::Class(CharClass::NotSpace)))),
                    'a' => Ok(Some(PatternAst::Single(Matcher::Class(CharClass::Alpha)))),
                    'l' => Ok(Some(PatternAst::Single(Matcher::Class(CharClass::Lower)))),
                    'u' => Ok(Some(PatternAst::Single(Matcher::Class(CharClass::Upper)))),
                    'x' => Ok(Some(PatternAst::Single(Matcher::Class(CharClass::Hex)))),
                    '<' => Ok(Some(PatternAst::Single(Matcher::WordStart))),
                    '>' => Ok(Some(PatternAst::Single(Matcher::WordEnd))),
                    'c' => {
                        self.case_override = Some(true);
                        Ok(None)
                    }
                    'C' => {
                        self.case_override = Some(false);
                        Ok(None)
                    }
                    '(' => {
                        self.group_count += 1;
                        let n = self.group_count;
                        if n > 9 {
                            return Err(self.error("more than 9 capture groups"));
                        }
                        let inner = self.parse_alternation()?;
                        if !(self.peek() == Some('\\') && self.peek2() == Some(')')) {
                            return Err(self.error("unmatched \\("));
                        }
                        self.pos += 2;
                        Ok(Some(PatternAst::Group(n, Box::new(inner))))
                    }
                    '1'..='9' => {
                        let n = next.to_digit(10).expect("digit") as usize;
                        Ok(Some(PatternAst::Single(Matcher::Backref(n))))
                    }
                    '+' | '=' | '?' | '{' => {
                        Err(self.error(format!("\\{} follows nothing", next)))
                    }
                    // Escaped literal (`\.`, `\*`, `\/`, `\\`, ...).
                    other => Ok(Some(PatternAst::Single(Matcher::Char(other)))),
                }
            }
            other => {
                self.pos += 1;
                Ok(Some(PatternAst::Single(Matcher::Char(other))))
            }
        }
    }

    /// `[...]` bracket collection with ranges and negation.
    fn parse_collection(&mut self) -> Result<PatternAst, RegexCompileError> {
        let negated = if self.peek() == Some('^') {
            self.pos += 1;
            true
        } else {
            false
        };

        let mut chars = Vec::new();
        let mut ranges = Vec::new();
        let mut first = true;

        loop {
            let Some(c) = self.peek() else {
                return Err(self.error("unmatched ["));
            };
            // `]` as the very first item is a literal.
            if c == ']' && !first {
                self.pos += 1;
                break;
            }
            first = false;

            let lo = if c == '\\' {
                let escaped = self
                    .peek2()
                    .ok_or_else(|| self.error("trailing backslash in []"))?;
                self.pos += 2;
                escaped
            } else {
                self.pos += 1;
                c
            };

            // A range needs something after the dash; `[a-]` keeps the
            // dash literal.
            if self.peek() == Some('-') && self.peek2().is_some_and(|c| c != ']') {
                self.pos += 1;
                let hi = self.peek().expect("checked above");
                self.pos += 1;
                if hi < lo {
                    return Err(self.error(format!("reverse range {}-{}", lo, hi)));
                }
                ranges.push((lo, hi));
            } else {
                chars.push(lo);
            }
        }

        Ok(PatternAst::Single(Matcher::Collection {
            negated,
            chars,
            ranges,
        }))
    }

    /// A quantifier following `atom`, if any.
    fn parse_quantifier(
        &mut self,
        atom: &PatternAst,
    ) -> Result<Option<PatternAst>, RegexCompileError> {
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                Ok(Some(repeat(atom, 0, None, false)))
            }
            Some('\\') => match self.peek2() {
                Some('+') => {
                    self.pos += 2;
                    Ok(Some(repeat(atom, 1, None, false)))
                }
                Some('=') | Some('?') => {
                    self.pos += 2;
                    Ok(Some(repeat(atom, 0, Some(1), false)))
                }
                Some('{') => {
                    self.pos += 2;
                    Ok(Some(self.parse_counted(atom)?))
                }
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    /// `\{n,m}` and friends; a leading `-` makes the repeat lazy. The
    /// closing brace may be `}` or `\}`.
    fn parse_counted(&mut self, atom: &PatternAst) -> Result<PatternAst, RegexCompileError> {
        let lazy = if self.peek() == Some('-') {
            self.pos += 1;
            true
        } else {
            false
        };

        let min = self.scan_count();
        let max = if self.peek() == Some(',') {
            self.pos += 1;
            self.scan_count()
        } else {
            // `\{n}` means exactly n; a bare `\{}` or `\{-}` is unbounded.
            min
        };

        match self.peek() {
            Some('}') => self.pos += 1,
            Some('\\') if self.peek2() == Some('}') => self.pos += 2,
            _ => return Err(self.error("missing } in \\{...}")),
        }

        if let (Some(lo), Some(hi)) = (min, max) {
            if hi < lo {
                return Err(self.error(format!("reverse repeat range {},{}", lo, hi)));
            }
        }

        Ok(repeat(atom, min.unwrap_or(0), max, lazy))
    }

    fn scan_count(&mut self) -> Option<usize> {
        let mut n: Option<usize> = None;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            n = Some(n.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
            self.pos += 1;
        }
        n
    }
}

fn repeat(atom: &PatternAst, min: usize, max: Option<usize>, lazy: bool) -> PatternAst {
    PatternAst::Repeat {
        inner: Box::new(atom.clone()),
        min,
        max,
        lazy,
    }
}
