use std::ops::Range;

/// The host editing surface, reduced to what the engine needs: text
/// access, a caret, and range-based mutation. All offsets are absolute
/// character offsets; lines are 1-based. The line-geometry helpers are
/// derived from `text()` so hosts only implement the four primitives.
pub trait VimEditor {
    fn text(&self) -> &str;
    fn caret_offset(&self) -> usize;
    fn set_caret_offset(&mut self, offset: usize);
    /// Replace `[start, end)` (character offsets) with `replacement`.
    fn replace_range(&mut self, range: Range<usize>, replacement: &str);

    /// A read-only buffer rejects write-access commands.
    fn is_writable(&self) -> bool {
        true
    }

    fn char_count(&self) -> usize {
        self.text().chars().count()
    }

    /// Number of lines; a trailing newline opens one more (empty) line.
    fn line_count(&self) -> usize {
        self.text().split('\n').count()
    }

    /// 1-based line containing the given character offset.
    fn line_of_offset(&self, offset: usize) -> usize {
        let mut line = 1;
        for (i, c) in self.text().chars().enumerate() {
            if i >= offset {
                break;
            }
            if c == '\n' {
                line += 1;
            }
        }
        line
    }

    /// Character offset of the first character of a 1-based line.
    fn line_start_offset(&self, line: usize) -> usize {
        if line <= 1 {
            return 0;
        }
        let mut remaining = line - 1;
        for (i, c) in self.text().chars().enumerate() {
            if c == '\n' {
                remaining -= 1;
                if remaining == 0 {
                    return i + 1;
                }
            }
        }
        self.char_count()
    }

    /// Character offset just past the last character of a line (the
    /// position of its newline, or end of text).
    fn line_end_offset(&self, line: usize) -> usize {
        let start = self.line_start_offset(line);
        let tail: usize = self
            .text()
            .chars()
            .skip(start)
            .take_while(|&c| c != '\n')
            .count();
        start + tail
    }

    fn line_text(&self, line: usize) -> String {
        let start = self.line_start_offset(line);
        let end = self.line_end_offset(line);
        self.text().chars().skip(start).take(end - start).collect()
    }

    fn caret_line(&self) -> usize {
        self.line_of_offset(self.caret_offset())
    }
}

/// In-memory buffer used by the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct BufferEditor {
    text: String,
    caret: usize,
    writable: bool,
}

impl BufferEditor {
    pub fn new(text: impl Into<String>) -> Self {
        BufferEditor {
            text: text.into(),
            caret: 0,
            writable: true,
        }
    }

    pub fn read_only(text: impl Into<String>) -> Self {
        BufferEditor {
            text: text.into(),
            caret: 0,
            writable: false,
        }
    }

    /// Translate a character offset to a byte offset.
    fn byte_offset(&self, char_offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_offset)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }
}

impl VimEditor for BufferEditor {
    fn text(&self) -> &str {
        &self.text
    }

    fn caret_offset(&self) -> usize {
        self.caret
    }

    fn set_caret_offset(&mut self, offset: usize) {
        self.caret = offset.min(self.char_count());
    }

    fn replace_range(&mut self, range: Range<usize>, replacement: &str) {
        let start = self.byte_offset(range.start);
        let end = self.byte_offset(range.end);
        self.text.replace_range(start..end, replacement);
        let len = self.char_count();
        if self.caret > len {
            self.caret = len;
        }
    }

    fn is_writable(&self) -> bool {
        self.writable
    }
}

// ---------------------------------------------------------------------------
// Position info
// ---------------------------------------------------------------------------

/// The caret-position summary (`Col c of w; Line l of n; ...`),
/// computed purely from text content and caret offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationInfo {
    pub column: usize,
    pub line_length: usize,
    pub line: usize,
    pub line_total: usize,
    pub word: usize,
    pub word_total: usize,
    pub character: usize,
    pub character_total: usize,
}

impl LocationInfo {
    pub fn compute(text: &str, caret: usize) -> LocationInfo {
        let chars: Vec<char> = text.chars().collect();
        let caret = caret.min(chars.len());

        let mut line = 1;
        let mut line_start = 0;
        for (i, &c) in chars.iter().enumerate().take(caret) {
            if c == '\n' {
                line += 1;
                line_start = i + 1;
            }
        }
        let line_length = chars[line_start..]
            .iter()
            .take_while(|&&c| c != '\n')
            .count();

        let (word, word_total) = count_words(&chars, caret);

        LocationInfo {
            column: caret - line_start + 1,
            line_length,
            line,
            line_total: text.split('\n').count(),
            word: word.max(1),
            word_total,
            character: caret + 1,
            character_total: chars.len(),
        }
    }

    pub fn to_message(&self) -> String {
        format!(
            "Col {} of {}; Line {} of {}; Word {} of {}; Character {} of {}",
            self.column,
            self.line_length,
            self.line,
            self.line_total,
            self.word,
            self.word_total,
            self.character,
            self.character_total
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CharKind {
    Blank,
    Keyword,
    Other,
}

fn char_kind(c: char) -> CharKind {
    if c.is_whitespace() {
        CharKind::Blank
    } else if c.is_alphanumeric() || c == '_' {
        CharKind::Keyword
    } else {
        CharKind::Other
    }
}

/// Word segmentation as the word motions see it: maximal runs of
/// keyword characters and runs of other non-blank characters each
/// count as one word. Returns (index of word at/before `caret`, total).
fn count_words(chars: &[char], caret: usize) -> (usize, usize) {
    let mut total = 0;
    let mut at_caret = 0;
    let mut previous = CharKind::Blank;

    for (i, &c) in chars.iter().enumerate() {
        let kind = char_kind(c);
        if kind != CharKind::Blank && kind != previous {
            total += 1;
        }
        if i <= caret {
            at_caret = total;
        }
        previous = kind;
    }

    (at_caret, total)
}
