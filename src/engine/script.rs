//! Source text and rule table for one parse.

use super::registry::RuleTable;

/// A line/character position. `line` is 1-based; `column` is the 0-based byte
/// offset from the start of that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Read-only source text plus the merged rule table used to parse it.
#[derive(Debug, Clone)]
pub struct Script {
    source: String,
    /// Byte offset of the first character of every line.
    line_starts: Vec<usize>,
    rules: RuleTable,
}

impl Script {
    pub fn new(source: impl Into<String>, rules: RuleTable) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.bytes().enumerate().filter(|&(_, b)| b == b'\n').map(|(i, _)| i + 1))
            .collect();
        Self { source, line_starts, rules }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    /// Length of the source in bytes (the end-of-input position).
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn byte_at(&self, point: usize) -> Option<u8> {
        self.source.as_bytes().get(point).copied()
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Line/character position of byte offset `point`.
    ///
    /// ```text
    /// "ab\ncd"   point 4 ('d') -> line 2, column 1
    /// ```
    pub fn position(&self, point: usize) -> Position {
        let line = self.line_starts.partition_point(|&start| start <= point);
        let column = point - self.line_starts[line - 1];
        Position { line, column }
    }

    /// Source text between two byte offsets, or `""` when the range does not
    /// fall on character boundaries.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        self.source.get(start..end).unwrap_or("")
    }
}
