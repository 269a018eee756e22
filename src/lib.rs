//! Backtracking grammar-execution engine.
//!
//! Grammars are tables of named production functions ([`Grammar`]). Parsing a
//! [`Script`] evaluates a root rule recursively against a cursor, building a
//! raw parse tree; ambiguous alternatives are ranked by weight, failed matches
//! leave positional diagnostics behind, and the finished tree is normalized and
//! handed to a [`Walker`] that drives a [`Compiler`] callback in post-order.
//!
//! ```text
//! Script ── Parser::evaluate ──> raw ParseTree ── normalize ──> ParseTree ── Walker ──> Compiler::trigger
//!              │                       │
//!              └─ Matcher combinators  └─ ExpectedSet (diagnostics)
//! ```

use std::borrow::Cow;

#[macro_use]
mod macros;
mod api;
pub mod engine;
pub mod rules;

pub use api::{DEFAULT_MAX_DEPTH, Options, ParseResult, parse, parse_with};
pub use engine::{
    Compiler, Evaluation, ExpectedSet, Matcher, NodeData, NodeFlags, NodeId, NodeRef, NormalizeStats, ParseTree,
    Parser, Position, RuleEntry, RuleSet, RuleTable, RunMetrics, Script, SyntaxError, Tier, Walker,
};
pub use engine::{alternation, literal, many, named_grammar, optional, reference, sequence};

// --- Core types ---------------------------------------------------------------

/// A production rule body. It receives the node being matched and reports
/// whether the node matched at the node's current position.
pub type Grammar = fn(&mut Matcher<'_, '_>) -> bool;

/// A composable match step used inside [`Matcher::sequence`] and
/// [`Matcher::alternation`] lists. Built with [`reference`], [`named_grammar`],
/// [`literal`] and friends.
pub type Combinator = Box<dyn Fn(&mut Matcher<'_, '_>) -> bool>;

/// Public name given to literal matches once the tree is normalized.
pub const TERMINAL: &str = "TERMINAL";

/// Name of the primitive that matches a literal wrapper's syntax text.
pub const LITERAL: &str = "LITERAL";

/// Name of the empty-match primitive. It always succeeds and weighs nothing.
pub const BLANK: &str = "BLANK";

/// Engine failures that are not ordinary non-matches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The rule name is absent from every registry tier.
    #[error("grammar rule `{rule}` is not registered")]
    RuleNotFound { rule: String },

    /// Rule nesting exceeded the configured recursion limit.
    #[error("grammar too deep: recursion limit of {limit} exceeded while evaluating `{rule}`")]
    GrammarTooDeep { limit: usize, rule: &'static str },
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A named rule set describing one parsed language.
///
/// `name` is the language identifier forwarded to [`Compiler::trigger`];
/// `rules` is the parser-specific registry tier.
#[derive(Debug, Clone)]
pub struct Language {
    pub name: &'static str,
    pub rules: RuleSet,
}

impl Language {
    pub fn new(name: &'static str, rules: RuleSet) -> Self {
        Self { name, rules }
    }

    /// Wrap `source` in a [`Script`] resolving rules through the built-in
    /// primitives and this language's rules (no per-script overrides).
    pub fn script(&self, source: impl Into<String>) -> Script {
        Script::new(source, RuleTable::for_language(self))
    }

    /// Like [`Language::script`], with a per-script override tier on top.
    pub fn script_with_overrides(&self, source: impl Into<String>, overrides: &RuleSet) -> Script {
        Script::new(source, RuleTable::new(overrides, rules::primitives::rule_set(), &self.rules))
    }
}

/// Display form used in expected-sets for literal text.
pub(crate) fn quoted(text: &str) -> Cow<'static, str> {
    Cow::Owned(format!("{text:?}"))
}
