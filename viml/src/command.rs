use std::fmt;
use std::ops::Range;

/// One parsed Ex command line: range, name, bang, raw argument tail.
/// Produced by the parser from a single logical line and consumed once
/// by the dispatcher; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ExCommand {
    pub range: RangeSpec,
    pub name: String,
    pub bang: bool,
    pub argument: String,
    pub span: Range<usize>,
}

impl ExCommand {
    pub fn has_argument(&self) -> bool {
        !self.argument.trim().is_empty()
    }
}

impl fmt::Display for ExCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.range, self.name)?;
        if self.bang {
            write!(f, "!")?;
        }
        if !self.argument.is_empty() {
            // Pattern-style arguments (e.g. `s/a/b/`) attach directly.
            if self.argument.starts_with(|c: char| c.is_ascii_alphanumeric()) {
                write!(f, " ")?;
            }
            write!(f, "{}", self.argument)?;
        }
        Ok(())
    }
}

/// The line range prefixing an Ex command. Empty means "no range given";
/// what that defaults to is up to the individual command.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangeSpec {
    pub entries: Vec<RangeEntry>,
}

impl RangeSpec {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                // The separator is recorded on the *previous* entry.
                write!(f, "{}", if self.entries[i - 1].moves_caret { ";" } else { "," })?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// One address in a range, with its `+n`/`-n` offset.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeEntry {
    pub address: Address,
    pub offset: i64,
    /// True when this entry was followed by `;`, which moves the caret
    /// to the resolved line before the next address is resolved.
    pub moves_caret: bool,
}

impl RangeEntry {
    pub fn new(address: Address) -> Self {
        RangeEntry {
            address,
            offset: 0,
            moves_caret: false,
        }
    }
}

impl fmt::Display for RangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)?;
        if self.offset > 0 {
            write!(f, "+{}", self.offset)?;
        } else if self.offset < 0 {
            write!(f, "{}", self.offset)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Address {
    /// `.` — the caret line.
    CurrentLine,
    /// `$` — the last line of the buffer.
    LastLine,
    /// `%` — every line (equivalent to `1,$`).
    WholeFile,
    /// An absolute 1-based line number.
    Line(usize),
    /// `'x` — the line of mark x.
    Mark(char),
    /// `/pat/` — the next line matching the pattern.
    ForwardPattern(String),
    /// `?pat?` — the previous line matching the pattern.
    BackwardPattern(String),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::CurrentLine => write!(f, "."),
            Address::LastLine => write!(f, "$"),
            Address::WholeFile => write!(f, "%"),
            Address::Line(n) => write!(f, "{}", n),
            Address::Mark(c) => write!(f, "'{}", c),
            Address::ForwardPattern(p) => write!(f, "/{}/", p),
            Address::BackwardPattern(p) => write!(f, "?{}?", p),
        }
    }
}
