/// Named character classes (`\d`, `\w`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Digit,
    NotDigit,
    Word,
    NotWord,
    Space,
    NotSpace,
    Alpha,
    Lower,
    Upper,
    Hex,
}

impl CharClass {
    pub fn matches(&self, c: char) -> bool {
        match self {
            CharClass::Digit => c.is_ascii_digit(),
            CharClass::NotDigit => !c.is_ascii_digit(),
            CharClass::Word => is_word_char(c),
            CharClass::NotWord => !is_word_char(c),
            CharClass::Space => c == ' ' || c == '\t',
            CharClass::NotSpace => !(c == ' ' || c == '\t'),
            CharClass::Alpha => c.is_ascii_alphabetic(),
            CharClass::Lower => c.is_ascii_lowercase(),
            CharClass::Upper => c.is_ascii_uppercase(),
            CharClass::Hex => c.is_ascii_hexdigit(),
        }
    }
}

pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// The guard on one automaton transition. Epsilon guards consume no
/// input; character guards consume exactly one character and must be
/// index-bounded (an attempt at or past the end of the text is false,
/// never out of bounds). Backreferences consume the captured text and
/// are handled by the simulator.
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    Char(char),
    AnyChar,
    Class(CharClass),
    Collection {
        negated: bool,
        chars: Vec<char>,
        ranges: Vec<(char, char)>,
    },
    Epsilon,
    /// `^` — start of text or just after a newline.
    StartOfLine,
    /// `$` — end of text or just before a newline.
    EndOfLine,
    /// `\<` — boundary before a word character.
    WordStart,
    /// `\>` — boundary after a word character.
    WordEnd,
    /// Capture marks: record the current position, consume nothing.
    GroupStart(usize),
    GroupEnd(usize),
    Backref(usize),
}

impl Matcher {
    /// True for guards that consume no input character.
    pub fn is_epsilon(&self) -> bool {
        !matches!(
            self,
            Matcher::Char(_)
                | Matcher::AnyChar
                | Matcher::Class(_)
                | Matcher::Collection { .. }
                | Matcher::Backref(_)
        )
    }

    /// Test a consuming guard against the character at `index`.
    pub fn matches_char(&self, text: &[char], index: usize, ignore_case: bool) -> bool {
        if index >= text.len() {
            return false;
        }
        let c = text[index];
        match self {
            Matcher::Char(expected) => {
                if ignore_case {
                    chars_fold_eq(c, *expected)
                } else {
                    c == *expected
                }
            }
            Matcher::AnyChar => c != '\n',
            Matcher::Class(class) => class.matches(c),
            Matcher::Collection {
                negated,
                chars,
                ranges,
            } => {
                let mut hit = chars.iter().any(|&x| {
                    if ignore_case {
                        chars_fold_eq(c, x)
                    } else {
                        c == x
                    }
                });
                if !hit {
                    hit = ranges.iter().any(|&(lo, hi)| {
                        if ignore_case {
                            let folded = c.to_ascii_lowercase();
                            (lo..=hi).contains(&c)
                                || (lo.to_ascii_lowercase()..=hi.to_ascii_lowercase())
                                    .contains(&folded)
                        } else {
                            (lo..=hi).contains(&c)
                        }
                    });
                }
                hit != *negated
            }
            _ => false,
        }
    }

    /// Test a zero-width guard at `index`.
    pub fn matches_position(&self, text: &[char], index: usize) -> bool {
        match self {
            Matcher::Epsilon | Matcher::GroupStart(_) | Matcher::GroupEnd(_) => true,
            Matcher::StartOfLine => index == 0 || text[index - 1] == '\n',
            Matcher::EndOfLine => index == text.len() || text[index] == '\n',
            Matcher::WordStart => {
                index < text.len()
                    && is_word_char(text[index])
                    && (index == 0 || !is_word_char(text[index - 1]))
            }
            Matcher::WordEnd => {
                index > 0
                    && is_word_char(text[index - 1])
                    && (index == text.len() || !is_word_char(text[index]))
            }
            _ => false,
        }
    }
}

pub fn chars_fold_eq(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
