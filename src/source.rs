//! Read-only view of an original template.
//!
//! [`ProcessedSource`] pairs the raw template bytes with a line index so
//! byte ranges can be converted to line/column coordinates cheaply. All
//! offsets in this crate are byte offsets; lines are 1-indexed and columns
//! 0-indexed, matching the host analyzer's diagnostic convention.

use std::fmt;

/// A half-open byte range `[begin, end)`.
///
/// Empty ranges (`begin == end`) are valid and denote an insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Range {
    pub begin: usize,
    pub end: usize,
}

impl Range {
    /// Create a range. `begin` must not exceed `end`.
    pub fn new(begin: usize, end: usize) -> Self {
        debug_assert!(begin <= end, "invalid range: [{begin}, {end})");
        Self { begin, end }
    }

    /// An empty range at `pos`.
    pub fn empty(pos: usize) -> Self {
        Self {
            begin: pos,
            end: pos,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Whether `other` lies entirely within this range.
    ///
    /// An empty `other` at this range's end point is considered contained,
    /// so insertion points at a boundary still resolve.
    pub fn contains(&self, other: Range) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

/// The original template plus its line index.
#[derive(Debug, Clone)]
pub struct ProcessedSource {
    name: String,
    text: String,
    /// Byte offset of the first character of each line.
    line_starts: Vec<usize>,
}

impl ProcessedSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            name: name.into(),
            text,
            line_starts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The bytes covered by `range`. Panics on out-of-bounds ranges, which
    /// indicate a bug in the caller, not bad input.
    pub fn slice(&self, range: Range) -> &str {
        &self.text[range.begin..range.end]
    }

    /// Number of lines. A trailing newline does not open a new line unless
    /// bytes follow it.
    pub fn line_count(&self) -> usize {
        if self.line_starts.last() == Some(&self.text.len()) && self.text.len() > 0 {
            self.line_starts.len() - 1
        } else {
            self.line_starts.len()
        }
    }

    /// 0-indexed line number containing `byte`. A byte at or past the end
    /// of the buffer maps to the last line.
    pub fn line_index_of(&self, byte: usize) -> usize {
        match self.line_starts.binary_search(&byte) {
            Ok(line) => line,
            Err(insert) => insert - 1,
        }
    }

    /// Byte offset of the start of the 0-indexed `line`.
    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts[line]
    }

    /// The 0-indexed line's content, without its terminating newline.
    pub fn line(&self, line: usize) -> &str {
        let begin = self.line_starts[line];
        let end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        let end = end.max(begin);
        self.text[begin..end].trim_end_matches('\r')
    }

    /// (1-indexed line, 0-indexed byte column) of `byte`.
    pub fn line_col(&self, byte: usize) -> (usize, usize) {
        let line = self.line_index_of(byte.min(self.text.len()));
        (line + 1, byte.min(self.text.len()) - self.line_starts[line])
    }

    /// The line containing `byte`, stripped of surrounding whitespace.
    pub fn stripped_line_at(&self, byte: usize) -> &str {
        self.line(self.line_index_of(byte.min(self.text.len()))).trim()
    }
}

/// Length of the run of spaces and tabs at the start of `line`.
pub fn leading_whitespace_len(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ' || *b == b'\t').count()
}
