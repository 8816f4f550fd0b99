//! Named source units with character-exact offsets.
//!
//! All offsets in this crate count Unicode scalar values, not bytes and
//! not UTF-16 code units, so an astral-plane codepoint such as U+1F600
//! occupies exactly one offset step.

/// Half-open character range into a [`SourceUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub start: usize,
    pub length: usize,
}

impl SourceSpan {
    #[must_use]
    pub const fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Offset one past the last character covered by the span.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.length
    }
}

/// A named compilation unit with decoded text and a line table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    name: String,
    chars: Vec<char>,
    line_starts: Vec<usize>,
}

impl SourceUnit {
    #[must_use]
    pub fn new(name: impl Into<String>, text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut line_starts = vec![0];
        for (i, &ch) in chars.iter().enumerate() {
            if ch == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            name: name.into(),
            chars,
            line_starts,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of characters in the unit.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.chars.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Character at a given offset, or `None` past the end.
    #[must_use]
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.chars.get(offset).copied()
    }

    /// The exact source text covered by a span.
    #[must_use]
    pub fn slice(&self, span: SourceSpan) -> String {
        self.chars[span.start..span.end().min(self.chars.len())]
            .iter()
            .collect()
    }

    /// Resolve an offset to 1-based `(line, column)`.
    ///
    /// Offsets at or past the end of the unit resolve to the position
    /// just after the final character, so end-of-input errors still
    /// point somewhere printable.
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.chars.len());
        let line = self.line_starts.partition_point(|&s| s <= offset) - 1;
        (line + 1, offset - self.line_starts[line] + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_lookup() {
        let src = SourceUnit::new("test", "ab\ncd\n\ne");
        assert_eq!(src.line_col(0), (1, 1));
        assert_eq!(src.line_col(1), (1, 2));
        assert_eq!(src.line_col(2), (1, 3));
        assert_eq!(src.line_col(3), (2, 1));
        assert_eq!(src.line_col(6), (3, 1));
        assert_eq!(src.line_col(7), (4, 1));
    }

    #[test]
    fn line_col_past_end() {
        let src = SourceUnit::new("test", "ab");
        assert_eq!(src.line_col(99), (1, 3));
    }

    #[test]
    fn astral_codepoints_count_once() {
        let src = SourceUnit::new("test", "a\u{1F600}b");
        assert_eq!(src.len(), 3);
        assert_eq!(src.char_at(1), Some('\u{1F600}'));
        assert_eq!(src.slice(SourceSpan::new(1, 2)), "\u{1F600}b");
    }

    #[test]
    fn slice_clamps_to_end() {
        let src = SourceUnit::new("test", "abc");
        assert_eq!(src.slice(SourceSpan::new(1, 10)), "bc");
    }
}
