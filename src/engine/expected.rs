//! Positional "expected one of" diagnostics.
//!
//! Every node keeps its own `ExpectedSet`: a map from line, then character,
//! to the distinct names of the rules that would have allowed progress there.
//! Sets are merged upwards when a subtree is discarded or inspected, and the
//! furthest recorded position of the root's aggregate becomes the
//! human-readable `SyntaxError`.
//!
//! ```text
//! line 1 ─┬─ char 0 -> {STATEMENT, COMMENT}
//!         └─ char 7 -> {"=", STATEMENT_END}
//! line 3 ─── char 2 -> {EXPRESSION}
//! ```

use super::script::Position;
use indexmap::IndexSet;
use std::borrow::Cow;
use std::collections::BTreeMap;

type Names = IndexSet<Cow<'static, str>>;

/// Line → character → insertion-ordered distinct names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedSet {
    lines: BTreeMap<usize, BTreeMap<usize, Names>>,
}

impl ExpectedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` at `position`; duplicates are ignored.
    pub fn insert(&mut self, position: Position, name: impl Into<Cow<'static, str>>) {
        self.lines.entry(position.line).or_default().entry(position.column).or_default().insert(name.into());
    }

    /// Add every entry of `other`, keeping existing order first.
    pub fn merge(&mut self, other: &ExpectedSet) {
        for (&line, columns) in &other.lines {
            let target = self.lines.entry(line).or_default();
            for (&column, names) in columns {
                target.entry(column).or_default().extend(names.iter().cloned());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Names recorded at exactly `line`/`column`.
    pub fn at(&self, line: usize, column: usize) -> Vec<&str> {
        self.lines
            .get(&line)
            .and_then(|columns| columns.get(&column))
            .map(|names| names.iter().map(|n| n.as_ref()).collect())
            .unwrap_or_default()
    }

    /// All positions in source order with their names.
    pub fn iter(&self) -> impl Iterator<Item = (Position, Vec<&str>)> + '_ {
        self.lines.iter().flat_map(|(&line, columns)| {
            columns
                .iter()
                .map(move |(&column, names)| (Position { line, column }, names.iter().map(|n| n.as_ref()).collect()))
        })
    }

    /// The furthest position that has diagnostics, with its names.
    pub fn furthest(&self) -> Option<(Position, Vec<&str>)> {
        let (&line, columns) = self.lines.last_key_value()?;
        let (&column, names) = columns.last_key_value()?;
        Some((Position { line, column }, names.iter().map(|n| n.as_ref()).collect()))
    }

    /// Render the furthest diagnostic as a syntax error.
    pub fn to_syntax_error(&self) -> Option<SyntaxError> {
        let (position, names) = self.furthest()?;
        Some(SyntaxError {
            line: position.line,
            column: position.column,
            expected: names.into_iter().map(str::to_string).collect(),
        })
    }
}

/// A rendered parse failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected one of {{{}}} at line {}, column {}", .expected.join(", "), .line, .column)]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub expected: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize, column: usize) -> Position {
        Position { line, column }
    }

    #[test]
    fn names_are_distinct_and_ordered() {
        let mut set = ExpectedSet::new();
        set.insert(at(1, 0), "B");
        set.insert(at(1, 0), "A");
        set.insert(at(1, 0), "B");
        assert_eq!(set.at(1, 0), vec!["B", "A"]);
        assert!(set.at(2, 0).is_empty());
    }

    #[test]
    fn merge_keys_by_line_and_character() {
        let mut left = ExpectedSet::new();
        left.insert(at(1, 4), "X");
        let mut right = ExpectedSet::new();
        right.insert(at(1, 4), "Y");
        right.insert(at(1, 4), "X");
        right.insert(at(2, 0), "Z");

        left.merge(&right);

        assert_eq!(left.at(1, 4), vec!["X", "Y"]);
        assert_eq!(left.at(2, 0), vec!["Z"]);
        assert_eq!(left.iter().count(), 2);
    }

    #[test]
    fn syntax_error_uses_the_furthest_position() {
        let mut set = ExpectedSet::new();
        set.insert(at(1, 9), "EARLY");
        set.insert(at(2, 3), "EXPRESSION");
        set.insert(at(2, 3), Cow::Owned("\";\"".to_string()));

        let err = set.to_syntax_error().unwrap();
        assert_eq!((err.line, err.column), (2, 3));
        assert_eq!(err.to_string(), "expected one of {EXPRESSION, \";\"} at line 2, column 3");
        assert!(ExpectedSet::new().to_syntax_error().is_none());
    }
}
