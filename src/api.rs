use crate::engine;
use crate::{ExpectedSet, NodeId, NodeRef, ParseTree, Position, Result, RunMetrics, Script, SyntaxError, Walker};

/// Default recursion limit for [`Options::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options that affect evaluation and tree shaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Maximum rule nesting before evaluation stops with
    /// [`crate::Error::GrammarTooDeep`].
    pub max_depth: usize,
    /// Collapse transient wrapper nodes after evaluation.
    pub normalize: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH, normalize: true }
    }
}

/// Result from [`parse`] and [`parse_with`].
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The parse tree, normalized unless [`Options::normalize`] was off.
    pub tree: ParseTree,
    /// Root validity: the root and every descendant matched.
    pub valid: bool,
    /// Diagnostics aggregated over the raw tree.
    pub expected: ExpectedSet,
    /// Counters and timings for the run.
    pub metrics: RunMetrics,
    /// Position of the furthest cursor reached.
    pub(crate) end: Position,
}

impl ParseResult {
    pub fn root(&self) -> NodeRef<'_> {
        self.tree.root_node()
    }

    /// The lexeme the root consumed.
    pub fn value(&self) -> String {
        self.tree.value(self.tree.root())
    }

    /// Position of the furthest cursor reached.
    pub fn end(&self) -> Position {
        self.end
    }

    /// The human-readable failure for an invalid root, built from the
    /// furthest expected position. A failure that left no diagnostics is
    /// reported where matching stopped, with an empty expected list.
    pub fn syntax_error(&self) -> Option<SyntaxError> {
        if self.valid {
            return None;
        }
        let fallback = || SyntaxError { line: self.end.line, column: self.end.column, expected: Vec::new() };
        Some(self.expected.to_syntax_error().unwrap_or_else(fallback))
    }

    /// Hand the tree to a [`Walker`] for `language`.
    pub fn into_walker(self, language: &'static str) -> Walker {
        Walker::new(self.tree, language)
    }

    /// Every reachable node in depth-first order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.tree.descendants(self.tree.root())
    }
}

/// Run `rule` over `script` with default [`Options`].
///
/// # Example
/// ```
/// use rulewalk::{parse, rules::demo};
///
/// let script = demo::language().script("$x = 1 + 2;");
/// let out = parse(&script, "SCRIPT").unwrap();
/// assert!(out.valid);
/// assert_eq!(out.value(), "$x = 1 + 2;");
/// ```
pub fn parse(script: &Script, rule: &'static str) -> Result<ParseResult> {
    parse_with(script, rule, &Options::default())
}

/// Run `rule` over `script` with the provided `options`.
pub fn parse_with(script: &Script, rule: &'static str, options: &Options) -> Result<ParseResult> {
    engine::Parser::new(script).with_options(options.clone()).run(rule)
}
