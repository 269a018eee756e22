//! Parser façade.
//!
//! A `Parser` borrows a [`Script`] and runs one root rule over it:
//!
//! ```text
//! evaluate(rule)  root node ── Session::evaluate ──> raw tree + validity
//! run(rule)       evaluate ── expected-set (raw tree) ── normalize ──> ParseResult
//! ```
//!
//! The expected-set is collected before normalization: splicing wrapper nodes
//! away would otherwise drop the diagnostics they recorded.
//!
//! ## Debugging
//!
//! Setting `RULEWALK_DEBUG=1` prints a one-line summary per run in addition to
//! the per-node traces emitted by the matcher.

use super::debug_enabled;
use super::matcher::Session;
use super::metrics::RunMetrics;
use super::node::ParseTree;
use super::script::Script;
use crate::{Options, ParseResult, Result};
use std::time::Instant;

/// Raw outcome of evaluating a root rule: the un-normalized tree.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub tree: ParseTree,
    /// Root validity (the root and every descendant matched).
    pub valid: bool,
    pub metrics: RunMetrics,
}

/// Runs root rules against a script.
///
/// Usage: `Parser::new(&script).with_options(options).run("SCRIPT")`.
#[derive(Debug, Clone)]
pub struct Parser<'s> {
    script: &'s Script,
    options: Options,
}

impl<'s> Parser<'s> {
    pub fn new(script: &'s Script) -> Self {
        Self { script, options: Options::default() }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn script(&self) -> &'s Script {
        self.script
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Evaluate `rule` at position 0 and return the raw tree.
    ///
    /// A failed match is not an error; inspect `Evaluation::valid` and the
    /// tree's expected-set. The only error is the recursion guard firing.
    pub fn evaluate(&self, rule: &'static str) -> Result<Evaluation> {
        let start = Instant::now();
        let mut session = Session::new(self.script, rule, self.options.max_depth);
        let root = session.tree.root();
        session.evaluate(root);

        if let Some(fault) = session.fault.take() {
            if debug_enabled() {
                eprintln!("[parse] rule=\"{}\" fault=\"{}\"", rule, fault);
            }
            return Err(fault);
        }

        let tree = session.tree;
        let mut metrics = session.metrics;
        let valid = tree.is_valid(root);
        metrics.evaluate = start.elapsed();
        metrics.total = metrics.evaluate;

        if debug_enabled() {
            eprintln!(
                "[parse] rule=\"{}\" valid={} end={} nodes={} evaluations={} deepest={}",
                rule,
                valid,
                tree.end(root),
                metrics.nodes_created,
                metrics.evaluations,
                metrics.deepest
            );
        }

        Ok(Evaluation { tree, valid, metrics })
    }

    /// Evaluate `rule`, gather diagnostics, and normalize the tree (unless
    /// disabled in [`Options`]).
    pub fn run(&self, rule: &'static str) -> Result<ParseResult> {
        let start = Instant::now();
        let Evaluation { mut tree, valid, mut metrics } = self.evaluate(rule)?;

        let root = tree.root();
        let expected = tree.expected(root);
        let end = self.script.position(tree.end(root));

        if self.options.normalize {
            let normalize_start = Instant::now();
            metrics.normalized = tree.normalize();
            metrics.normalize = normalize_start.elapsed();
        }
        metrics.total = start.elapsed();

        Ok(ParseResult { tree, valid, expected, metrics, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Grammar, Matcher, RuleSet, RuleTable, literal, named_grammar, reference};

    fn root(m: &mut Matcher<'_, '_>) -> bool {
        m.sequence(&[named_grammar("CHOICE", "PAIR | X"), reference("EOF")])
    }

    fn choice(m: &mut Matcher<'_, '_>) -> bool {
        m.alternation(&[reference("PAIR"), reference("X")])
    }

    fn pair(m: &mut Matcher<'_, '_>) -> bool {
        m.sequence(&[literal("a"), literal("b")])
    }

    fn x(m: &mut Matcher<'_, '_>) -> bool {
        m.try_char(b'x')
    }

    fn script(source: &str) -> Script {
        let rules: [(&'static str, Grammar); 4] = [("ROOT", root), ("CHOICE", choice), ("PAIR", pair), ("X", x)];
        let rules: RuleSet = rules.into_iter().collect();
        Script::new(source, RuleTable::new(&RuleSet::new(), crate::rules::primitives::rule_set(), &rules))
    }

    #[test]
    fn run_normalizes_unless_disabled() {
        let script = script("ab");

        let result = Parser::new(&script).run("ROOT").unwrap();
        assert!(result.valid);
        assert!(!result.tree.has_transient());
        assert_eq!(result.metrics.normalized.spliced, 1);
        assert_eq!(result.metrics.normalized.terminals, 2);

        let options = Options { normalize: false, ..Options::default() };
        let raw = Parser::new(&script).with_options(options).run("ROOT").unwrap();
        assert!(raw.tree.has_transient());
        assert_eq!(raw.metrics.normalized, Default::default());
    }

    #[test]
    fn diagnostics_recorded_on_wrappers_survive_normalization() {
        let script = script("ac");
        let result = Parser::new(&script).run("ROOT").unwrap();

        assert!(!result.valid);
        assert!(!result.tree.has_transient());
        assert_eq!(result.expected.at(1, 1), vec!["\"b\""]);
    }

    #[test]
    fn evaluation_counts_work() {
        let script = script("ab");
        let run = Parser::new(&script).evaluate("ROOT").unwrap();

        // ROOT, CHOICE wrapper, PAIR, two literals, X, EOF.
        assert_eq!(run.metrics.nodes_created, 7);
        assert_eq!(run.metrics.evaluations, 7);
        assert_eq!(run.metrics.deepest, 4);
        assert!(run.metrics.unresolved.is_empty());
    }
}
