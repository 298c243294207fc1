use std::ops::Range;

use crate::command::{Address, ExCommand, RangeEntry, RangeSpec};
use crate::parser::error::ParseError;

/// Parse one Ex command line into its range, name, bang, and argument
/// tail. `base` is the byte offset of the line within the source file.
pub(crate) fn parse_command_line(
    line: &str,
    base: usize,
    file_id: usize,
) -> Result<ExCommand, ParseError> {
    let chars: Vec<char> = line.chars().collect();
    let mut scanner = Scanner {
        chars,
        pos: 0,
        base,
        file_id,
    };

    // Leading colons are allowed and ignored (`:echo`, `::5`).
    while scanner.peek() == Some(':') {
        scanner.advance();
    }
    scanner.skip_blanks();

    let range = scanner.parse_range()?;
    scanner.skip_blanks();

    let mut name = String::new();
    while let Some(c) = scanner.peek() {
        if c.is_ascii_alphabetic() {
            name.push(c);
            scanner.advance();
        } else {
            break;
        }
    }

    let bang = if scanner.peek() == Some('!') {
        scanner.advance();
        true
    } else {
        false
    };

    // The argument is everything that follows. One blank separates it
    // from the name; pattern-style arguments (`s/a/b/`) attach directly.
    if scanner.peek() == Some(' ') || scanner.peek() == Some('\t') {
        scanner.skip_blanks();
    }
    let argument: String = scanner.chars[scanner.pos..].iter().collect();

    let span: Range<usize> = base..base + line.len();
    Ok(ExCommand {
        range,
        name,
        bang,
        argument,
        span,
    })
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    base: usize,
    file_id: usize,
}

impl Scanner {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.advance();
        }
    }

    fn span_here(&self) -> Range<usize> {
        let at = self.base + self.pos;
        at..at + 1
    }

    fn parse_range(&mut self) -> Result<RangeSpec, ParseError> {
        let mut entries = Vec::new();

        loop {
            self.skip_blanks();
            let address = self.parse_address()?;
            let offset = self.parse_offsets();

            match (address, offset) {
                (None, 0)
                    if entries.is_empty()
                        && !matches!(self.peek(), Some(',') | Some(';')) =>
                {
                    return Ok(RangeSpec { entries });
                }
                (None, 0) => {
                    // A trailing separator addresses the current line.
                    entries.push(RangeEntry::new(Address::CurrentLine));
                }
                (address, offset) => {
                    // A bare offset (`+2`) is relative to the caret line.
                    let mut entry = RangeEntry::new(address.unwrap_or(Address::CurrentLine));
                    entry.offset = offset;
                    entries.push(entry);
                }
            }

            self.skip_blanks();
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some(';') => {
                    self.advance();
                    if let Some(last) = entries.last_mut() {
                        last.moves_caret = true;
                    }
                }
                _ => break,
            }
        }

        Ok(RangeSpec { entries })
    }

    fn parse_address(&mut self) -> Result<Option<Address>, ParseError> {
        match self.peek() {
            Some('%') => {
                self.advance();
                Ok(Some(Address::WholeFile))
            }
            Some('.') => {
                self.advance();
                Ok(Some(Address::CurrentLine))
            }
            Some('$') => {
                self.advance();
                Ok(Some(Address::LastLine))
            }
            Some(c) if c.is_ascii_digit() => {
                let mut n = 0usize;
                while let Some(d) = self.peek() {
                    let Some(digit) = d.to_digit(10) else { break };
                    n = n.saturating_mul(10).saturating_add(digit as usize);
                    self.advance();
                }
                Ok(Some(Address::Line(n)))
            }
            Some('\'') => {
                self.advance();
                match self.advance() {
                    Some(mark) => Ok(Some(Address::Mark(mark))),
                    None => Err(ParseError::error(
                        "expected mark name after '",
                        self.span_here(),
                        self.file_id,
                    )),
                }
            }
            Some('/') => {
                self.advance();
                Ok(Some(Address::ForwardPattern(self.scan_pattern('/'))))
            }
            Some('?') => {
                self.advance();
                Ok(Some(Address::BackwardPattern(self.scan_pattern('?'))))
            }
            _ => Ok(None),
        }
    }

    /// Scan pattern text up to an unescaped closing delimiter or end of
    /// line. The closing delimiter is consumed.
    fn scan_pattern(&mut self, delimiter: char) -> String {
        let mut pattern = String::new();
        while let Some(c) = self.peek() {
            if c == delimiter {
                self.advance();
                break;
            }
            if c == '\\' {
                self.advance();
                match self.peek() {
                    Some(next) if next == delimiter => {
                        pattern.push(next);
                        self.advance();
                    }
                    Some(next) => {
                        pattern.push('\\');
                        pattern.push(next);
                        self.advance();
                    }
                    None => pattern.push('\\'),
                }
            } else {
                pattern.push(c);
                self.advance();
            }
        }
        pattern
    }

    /// `+n` / `-n` chains after an address. A bare sign counts as 1.
    fn parse_offsets(&mut self) -> i64 {
        let mut total = 0i64;
        loop {
            let sign = match self.peek() {
                Some('+') => 1,
                Some('-') => -1,
                _ => break,
            };
            self.advance();
            let mut n = 0i64;
            let mut saw_digit = false;
            while let Some(d) = self.peek() {
                let Some(digit) = d.to_digit(10) else { break };
                saw_digit = true;
                n = n.saturating_mul(10).saturating_add(digit as i64);
                self.advance();
            }
            total += sign * if saw_digit { n } else { 1 };
        }
        total
    }
}
