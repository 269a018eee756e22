//! Node evaluation and the combinators rule authors compose.
//!
//! A grammar function receives a [`Matcher`]: a handle on the node being
//! matched, its cursor, and the shared evaluation session. Every sub-match is
//! created through [`Matcher::reference`], [`Matcher::named_grammar`] or
//! [`Matcher::literal`] (or their boxed [`Combinator`] forms), which allocate
//! a child node, evaluate it, and move the cursor on success.
//!
//! ## Cursor discipline
//!
//! ```text
//! sequence    [A][B][C]        C fails -> cursor back to entry, false
//! alternation |A| |B| |C|      every candidate starts at entry;
//!                              heaviest success wins, ties keep the earliest
//! repeat      [A][A][A]x       failed last attempt rolled back
//! ```
//!
//! The cursor only moves forward while matching succeeds; every failing
//! branch restores it to the value it had on entry.
//!
//! ## Diagnostics
//!
//! A failed `reference` records the rule name in the invoking node's
//! `ExpectedSet` at the cursor position, unless the invoking node is a
//! transient wrapper. A failed `literal` records its quoted text the same way.
//! Alternations that fail completely pull the diagnostics of every candidate
//! subtree into the node itself.
//!
//! ## Recursion guard
//!
//! Each evaluation increments a depth counter. Past `Options::max_depth` the
//! session latches `Error::GrammarTooDeep`; from then on every evaluation
//! fails immediately and the parser reports the fault instead of a result.

use super::debug_enabled;
use super::expected::ExpectedSet;
use super::metrics::RunMetrics;
use super::node::{NodeData, NodeFlags, NodeId, ParseTree};
use super::script::Script;
use crate::{BLANK, Combinator, Error, LITERAL};
use regex::Regex;
use std::borrow::Cow;

/// Shared state for one evaluation run.
pub(crate) struct Session<'s> {
    pub(crate) script: &'s Script,
    pub(crate) tree: ParseTree,
    pub(crate) metrics: RunMetrics,
    pub(crate) fault: Option<Error>,
    max_depth: usize,
    depth: usize,
}

impl<'s> Session<'s> {
    /// Start a session whose tree holds a single root node bound to `root`.
    pub(crate) fn new(script: &'s Script, root: &'static str, max_depth: usize) -> Self {
        let grammar = script.rules().resolve(root).ok();
        let tree = ParseTree::new(NodeData::new(root, None, 0, grammar, NodeFlags::empty(), None));
        let metrics = RunMetrics { nodes_created: 1, ..RunMetrics::default() };
        Session { script, tree, metrics, fault: None, max_depth, depth: 0 }
    }

    /// Run `node`'s grammar at the node's cursor and record the outcome.
    ///
    /// A node whose name resolved in no registry tier is reported once per run
    /// on stderr and treated as an ordinary non-match.
    pub(crate) fn evaluate(&mut self, node: NodeId) -> bool {
        if self.fault.is_some() {
            return false;
        }

        let name = self.tree[node].name;
        if self.depth >= self.max_depth {
            if debug_enabled() {
                eprintln!("[eval:too_deep] rule=\"{}\" limit={}", name, self.max_depth);
            }
            self.fault = Some(Error::GrammarTooDeep { limit: self.max_depth, rule: name });
            return false;
        }

        let Some(grammar) = self.tree[node].grammar else {
            if !self.metrics.unresolved.contains(&name) {
                let at = self.script.position(self.tree[node].start);
                eprintln!(
                    "[grammar:unresolved] rule=\"{}\" line={} column={} (treated as no match)",
                    name, at.line, at.column
                );
                self.metrics.unresolved.push(name);
            }
            return false;
        };

        self.metrics.evaluations += 1;
        self.depth += 1;
        self.metrics.deepest = self.metrics.deepest.max(self.depth);
        if debug_enabled() {
            eprintln!("[eval:enter] rule=\"{}\" at={} depth={}", name, self.tree[node].start, self.depth);
        }

        let matched = grammar(&mut Matcher { session: self, node }) && self.fault.is_none();

        self.depth -= 1;
        self.tree[node].flags.set(NodeFlags::MATCHED, matched);
        if debug_enabled() {
            let data = &self.tree[node];
            eprintln!("[eval:exit] rule=\"{}\" matched={} span={}..{}", name, matched, data.start, data.point);
        }
        matched
    }
}

/// How a child node is invoked.
#[derive(Clone, Copy)]
enum Invocation {
    Reference,
    Named(&'static str),
    Literal(&'static str),
}

/// One successful or failed alternation candidate.
struct Candidate {
    matched: bool,
    point: usize,
    subtree: Vec<NodeId>,
}

/// The node under evaluation, as seen by its grammar function.
pub struct Matcher<'a, 's> {
    session: &'a mut Session<'s>,
    node: NodeId,
}

impl<'a, 's> Matcher<'a, 's> {
    fn script(&self) -> &'s Script {
        self.session.script
    }

    fn data(&self) -> &NodeData {
        &self.session.tree[self.node]
    }

    fn data_mut(&mut self) -> &mut NodeData {
        &mut self.session.tree[self.node]
    }

    // --- Node state ----------------------------------------------------------

    pub fn id(&self) -> NodeId {
        self.node
    }

    pub fn name(&self) -> &'static str {
        self.data().name
    }

    /// Syntax description attached by [`named_grammar`] or [`literal`].
    pub fn syntax(&self) -> Option<&'static str> {
        self.data().syntax
    }

    pub fn is_transient(&self) -> bool {
        self.data().is_transient()
    }

    /// Current cursor (byte offset into the source).
    pub fn point(&self) -> usize {
        self.data().point
    }

    fn set_point(&mut self, point: usize) {
        self.data_mut().point = point;
    }

    /// Advance the cursor by `amount` bytes without recording a literal.
    pub fn seek(&mut self, amount: usize) {
        let point = (self.point() + amount).min(self.script().len());
        self.set_point(point);
    }

    // --- Source access -------------------------------------------------------

    pub fn source(&self) -> &'s str {
        self.script().source()
    }

    /// Source text from the cursor to the end of input.
    pub fn remaining(&self) -> &'s str {
        self.script().source().get(self.point()..).unwrap_or("")
    }

    pub fn at_end(&self) -> bool {
        self.point() >= self.script().len()
    }

    /// Byte at `offset` past the cursor.
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.script().byte_at(self.point() + offset)
    }

    pub fn char_is(&self, byte: u8) -> bool {
        self.byte_at(0) == Some(byte)
    }

    pub fn char_is_at(&self, byte: u8, offset: usize) -> bool {
        self.byte_at(offset) == Some(byte)
    }

    pub fn char_in(&self, bytes: &[u8]) -> bool {
        self.byte_at(0).is_some_and(|b| bytes.contains(&b))
    }

    pub fn char_code_range(&self, low: u8, high: u8) -> bool {
        self.byte_at(0).is_some_and(|b| (low..=high).contains(&b))
    }

    // --- Terminals -----------------------------------------------------------
    //
    // Terminal helpers record what they consume as this node's literal. The
    // byte-oriented helpers are meant for ASCII; use `try_string` or
    // `try_regex` for anything else.

    pub fn try_char(&mut self, byte: u8) -> bool {
        if !self.char_is(byte) {
            return false;
        }
        self.take(1);
        true
    }

    pub fn try_char_range(&mut self, low: u8, high: u8) -> bool {
        if !self.char_code_range(low, high) {
            return false;
        }
        self.take(1);
        true
    }

    pub fn try_string(&mut self, text: &str) -> bool {
        if !self.remaining().starts_with(text) {
            return false;
        }
        self.take(text.len());
        true
    }

    /// Match `pattern` at the cursor. Patterns should be anchored with `^`;
    /// a match that does not begin at the cursor is rejected.
    pub fn try_regex(&mut self, pattern: &Regex) -> bool {
        match pattern.find(self.remaining()) {
            Some(found) if found.start() == 0 => {
                self.take(found.end());
                true
            }
            _ => false,
        }
    }

    /// Consume bytes while `accept` holds; returns how many were consumed.
    pub fn take_while(&mut self, accept: impl Fn(u8) -> bool) -> usize {
        let len = self.remaining().bytes().take_while(|&b| accept(b)).count();
        self.take(len);
        len
    }

    fn take(&mut self, len: usize) {
        let start = self.point();
        let text = self.script().slice(start, start + len);
        self.record_literal(text);
        self.set_point(start + len);
    }

    /// Append `text` to this node's literal value.
    pub fn record_literal(&mut self, text: &str) {
        self.data_mut().literal.get_or_insert_with(String::new).push_str(text);
    }

    /// Record `name` as expected at the cursor.
    pub fn expect(&mut self, name: impl Into<Cow<'static, str>>) {
        let at = self.script().position(self.point());
        self.data_mut().expected.insert(at, name);
    }

    // --- Grammar invocation --------------------------------------------------

    /// Match the registered rule `rule` as an ordinary child node.
    pub fn reference(&mut self, rule: &'static str) -> bool {
        self.invoke(rule, Invocation::Reference)
    }

    /// Match the registered rule `rule` through a transient wrapper node that
    /// normalization later splices away. `syntax` is kept on the wrapper for
    /// diagnostics and introspection.
    pub fn named_grammar(&mut self, rule: &'static str, syntax: &'static str) -> bool {
        self.invoke(rule, Invocation::Named(syntax))
    }

    /// Match `text` exactly through a literal wrapper (renamed to
    /// [`crate::TERMINAL`] by normalization).
    pub fn literal(&mut self, text: &'static str) -> bool {
        self.invoke(LITERAL, Invocation::Literal(text))
    }

    fn invoke(&mut self, rule: &'static str, invocation: Invocation) -> bool {
        let (flags, syntax) = match invocation {
            Invocation::Reference => (NodeFlags::empty(), None),
            Invocation::Named(syntax) => (NodeFlags::TRANSIENT, Some(syntax)),
            Invocation::Literal(text) => (NodeFlags::TRANSIENT | NodeFlags::LITERAL, Some(text)),
        };
        let child = self.spawn(rule, flags, syntax);

        if self.session.evaluate(child) {
            let end = self.session.tree[child].point;
            self.set_point(end);
            return true;
        }

        if !self.is_transient() {
            match invocation {
                Invocation::Reference => self.expect(rule),
                Invocation::Literal(text) => self.expect(crate::quoted(text)),
                Invocation::Named(_) => {}
            }
        }
        false
    }

    /// Allocate a child at the cursor, bound to whatever `name` resolves to.
    fn spawn(&mut self, name: &'static str, flags: NodeFlags, syntax: Option<&'static str>) -> NodeId {
        let grammar = self.script().rules().resolve(name).ok();
        let data = NodeData::new(name, Some(self.node), self.point(), grammar, flags, syntax);
        let child = self.session.tree.alloc(data);
        self.session.metrics.nodes_created += 1;
        self.data_mut().children.push(child);
        child
    }

    // --- Combinators ---------------------------------------------------------

    /// All of `rules`, in order, from the cursor. On the first failure the
    /// cursor returns to where the sequence began; diagnostics are kept.
    pub fn sequence(&mut self, rules: &[Combinator]) -> bool {
        let reset = self.point();
        for rule in rules {
            if !rule(self) {
                self.set_point(reset);
                return false;
            }
        }
        true
    }

    /// Every candidate in `rules`, each from the entry cursor into its own
    /// subtree. The successful candidate with the greatest weight wins (the
    /// earliest on ties) and its subtree and cursor are adopted. When none
    /// succeeds, their diagnostics are merged into this node.
    pub fn alternation(&mut self, rules: &[Combinator]) -> bool {
        self.session.metrics.alternations += 1;
        let reset = self.point();
        let base = self.data().children.len();

        let mut candidates = Vec::with_capacity(rules.len());
        for rule in rules {
            self.set_point(reset);
            let matched = rule(self);
            let point = self.point();
            let subtree = self.data_mut().children.split_off(base);
            candidates.push(Candidate { matched, point, subtree });
        }
        self.set_point(reset);

        if self.session.fault.is_some() {
            return false;
        }

        let tree = &self.session.tree;
        let mut winner: Option<(usize, usize)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            if !candidate.matched {
                continue;
            }
            let weight = candidate.subtree.iter().map(|&id| tree.weight(id)).sum();
            if winner.is_none_or(|(_, best)| weight > best) {
                winner = Some((idx, weight));
            }
        }

        match winner {
            Some((idx, weight)) => {
                if debug_enabled() {
                    eprintln!(
                        "[alt:winner] rule=\"{}\" candidate={}/{} weight={}",
                        self.name(),
                        idx + 1,
                        candidates.len(),
                        weight
                    );
                }
                let Candidate { point, subtree, .. } = candidates.swap_remove(idx);
                self.data_mut().children.extend(subtree);
                self.set_point(point);
                true
            }
            None => {
                let mut expected = ExpectedSet::default();
                for id in candidates.iter().flat_map(|c| c.subtree.iter().copied()) {
                    expected.merge(&tree.expected(id));
                }
                self.data_mut().expected.merge(&expected);
                false
            }
        }
    }

    /// Match `rule` as many times as it succeeds and advances. The attempt
    /// that ends the repetition is rolled back (cursor and children) after its
    /// diagnostics are folded into this node. Returns the number of matches.
    pub fn repeat(&mut self, rule: &dyn Fn(&mut Matcher<'_, '_>) -> bool) -> usize {
        let mut count = 0;
        loop {
            let reset = self.point();
            let base = self.data().children.len();
            if rule(self) && self.point() > reset {
                count += 1;
                continue;
            }

            let dropped = self.data_mut().children.split_off(base);
            let mut expected = ExpectedSet::default();
            for id in dropped {
                expected.merge(&self.session.tree.expected(id));
            }
            self.data_mut().expected.merge(&expected);
            self.set_point(reset);
            return count;
        }
    }
}

// --- Combinator factories ----------------------------------------------------

/// Boxed [`Matcher::reference`].
pub fn reference(rule: &'static str) -> Combinator {
    Box::new(move |m: &mut Matcher<'_, '_>| m.reference(rule))
}

/// Boxed [`Matcher::named_grammar`].
pub fn named_grammar(rule: &'static str, syntax: &'static str) -> Combinator {
    Box::new(move |m: &mut Matcher<'_, '_>| m.named_grammar(rule, syntax))
}

/// Boxed [`Matcher::literal`].
pub fn literal(text: &'static str) -> Combinator {
    Box::new(move |m: &mut Matcher<'_, '_>| m.literal(text))
}

/// Nested [`Matcher::sequence`].
pub fn sequence(rules: Vec<Combinator>) -> Combinator {
    Box::new(move |m: &mut Matcher<'_, '_>| m.sequence(&rules))
}

/// Nested [`Matcher::alternation`].
pub fn alternation(rules: Vec<Combinator>) -> Combinator {
    Box::new(move |m: &mut Matcher<'_, '_>| m.alternation(&rules))
}

/// `rule` or nothing: an alternation against the `BLANK` sentinel.
pub fn optional(rule: Combinator) -> Combinator {
    alternation(vec![rule, reference(BLANK)])
}

/// Zero or more `rule`s; always succeeds.
pub fn many(rule: Combinator) -> Combinator {
    Box::new(move |m: &mut Matcher<'_, '_>| {
        m.repeat(&*rule);
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Grammar, Options, Parser, RuleSet, RuleTable, TERMINAL};

    fn script(source: &str, rules: &[(&'static str, Grammar)]) -> Script {
        let parser_rules: RuleSet = rules.iter().copied().collect();
        Script::new(source, RuleTable::new(&RuleSet::new(), crate::rules::primitives::rule_set(), &parser_rules))
    }

    fn char_a(m: &mut Matcher<'_, '_>) -> bool {
        m.try_char(b'a')
    }

    fn char_b(m: &mut Matcher<'_, '_>) -> bool {
        m.try_char(b'b')
    }

    fn only_a(m: &mut Matcher<'_, '_>) -> bool {
        m.sequence(&[literal("a")])
    }

    fn a_then_b(m: &mut Matcher<'_, '_>) -> bool {
        m.sequence(&[literal("a"), literal("b")])
    }

    #[test]
    fn heavier_alternative_wins_even_when_listed_second() {
        fn root(m: &mut Matcher<'_, '_>) -> bool {
            m.alternation(&[reference("ONLY_A"), reference("A_THEN_B")])
        }
        let script = script("ab", &[("ROOT", root), ("ONLY_A", only_a), ("A_THEN_B", a_then_b)]);
        let run = Parser::new(&script).evaluate("ROOT").unwrap();

        let root = run.tree.root_node();
        assert!(run.valid);
        assert_eq!(root.children().map(|c| c.name()).collect::<Vec<_>>(), vec!["A_THEN_B"]);
        assert_eq!(root.end(), 2);
        assert_eq!(root.value(), "ab");
    }

    #[test]
    fn equal_weights_keep_the_earliest_candidate() {
        fn root(m: &mut Matcher<'_, '_>) -> bool {
            m.alternation(&[reference("FIRST"), reference("SECOND")])
        }
        let script = script("a", &[("ROOT", root), ("FIRST", char_a), ("SECOND", char_a)]);
        let run = Parser::new(&script).evaluate("ROOT").unwrap();

        let names: Vec<_> = run.tree.root_node().children().map(|c| c.name()).collect();
        assert_eq!(names, vec!["FIRST"]);
    }

    #[test]
    fn alternation_adopts_exactly_one_subtree() {
        fn root(m: &mut Matcher<'_, '_>) -> bool {
            m.alternation(&[
                sequence(vec![reference("A"), reference("A")]),
                sequence(vec![reference("A"), reference("B")]),
                reference("A"),
            ])
        }
        let script = script("ab", &[("ROOT", root), ("A", char_a), ("B", char_b)]);
        let run = Parser::new(&script).evaluate("ROOT").unwrap();

        let names: Vec<_> = run.tree.root_node().children().map(|c| c.name()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(run.valid);
    }

    #[test]
    fn failed_sequence_restores_the_cursor_and_keeps_diagnostics() {
        fn root(m: &mut Matcher<'_, '_>) -> bool {
            m.sequence(&[reference("A"), reference("A"), reference("B")])
        }
        let script = script("aac", &[("ROOT", root), ("A", char_a), ("B", char_b)]);
        let run = Parser::new(&script).evaluate("ROOT").unwrap();

        let root = &run.tree[run.tree.root()];
        assert!(!run.valid);
        assert_eq!(root.point(), 0);
        assert_eq!(root.own_expected().at(1, 2), vec!["B"]);
    }

    #[test]
    fn no_top_level_match_reports_every_alternative_at_the_start() {
        fn root(m: &mut Matcher<'_, '_>) -> bool {
            m.alternation(&[reference("A"), reference("B"), literal("c")])
        }
        let script = script("zzz", &[("ROOT", root), ("A", char_a), ("B", char_b)]);
        let run = Parser::new(&script).evaluate("ROOT").unwrap();

        assert!(!run.valid);
        assert_eq!(run.tree.root_node().child_count(), 0);
        assert_eq!(run.tree.expected(run.tree.root()).at(1, 0), vec!["A", "B", "\"c\""]);
    }

    #[test]
    fn blank_loses_to_any_real_match() {
        fn root(m: &mut Matcher<'_, '_>) -> bool {
            m.alternation(&[reference(BLANK), reference("A")])
        }
        let rules: &[(&'static str, Grammar)] = &[("ROOT", root), ("A", char_a)];

        let matched = script("a", rules);
        let run = Parser::new(&matched).evaluate("ROOT").unwrap();
        assert_eq!(run.tree.root_node().children().map(|c| c.name()).collect::<Vec<_>>(), vec!["A"]);

        let empty = script("", rules);
        let run = Parser::new(&empty).evaluate("ROOT").unwrap();
        assert!(run.valid);
        assert_eq!(run.tree.root_node().children().map(|c| c.name()).collect::<Vec<_>>(), vec![BLANK]);
    }

    #[test]
    fn repeat_rolls_back_the_final_attempt() {
        fn root(m: &mut Matcher<'_, '_>) -> bool {
            m.sequence(&[many(literal("a")), reference("EOF")])
        }
        let script = script("aaa", &[("ROOT", root)]);
        let run = Parser::new(&script).evaluate("ROOT").unwrap();

        let root = run.tree.root_node();
        assert!(run.valid);
        assert_eq!(root.child_count(), 4);
        assert_eq!(root.value(), "aaa");
        assert_eq!(run.tree.expected(root.id()).at(1, 3), vec!["\"a\""]);
    }

    #[test]
    fn named_grammar_failures_stay_silent() {
        fn root(m: &mut Matcher<'_, '_>) -> bool {
            m.named_grammar("WRAPPED", "A")
        }
        fn wrapped(m: &mut Matcher<'_, '_>) -> bool {
            m.reference("A")
        }
        let script = script("b", &[("ROOT", root), ("WRAPPED", wrapped), ("A", char_a)]);
        let run = Parser::new(&script).evaluate("ROOT").unwrap();

        assert!(!run.valid);
        assert!(run.tree.expected(run.tree.root()).is_empty());
    }

    #[test]
    fn literal_wrappers_are_transient_until_normalized() {
        fn root(m: &mut Matcher<'_, '_>) -> bool {
            m.literal("ab")
        }
        let script = script("ab", &[("ROOT", root)]);
        let run = Parser::new(&script).evaluate("ROOT").unwrap();

        let child = run.tree.root_node().children().next().unwrap();
        assert_eq!(child.name(), LITERAL);
        assert!(child.data().flags().contains(NodeFlags::TRANSIENT | NodeFlags::LITERAL));
        assert_eq!(child.data().syntax(), Some("ab"));

        let mut tree = run.tree;
        tree.normalize();
        let child = tree.root_node().children().next().unwrap();
        assert_eq!(child.name(), TERMINAL);
        assert_eq!(child.value(), "ab");
    }

    #[test]
    fn unresolved_rules_are_absorbed_as_non_matches() {
        fn root(m: &mut Matcher<'_, '_>) -> bool {
            m.alternation(&[reference("MISSING"), reference("A")])
        }
        let script = script("a", &[("ROOT", root), ("A", char_a)]);
        let run = Parser::new(&script).evaluate("ROOT").unwrap();

        assert!(run.valid);
        assert_eq!(run.metrics.unresolved, vec!["MISSING"]);
    }

    #[test]
    fn left_recursion_trips_the_depth_guard() {
        fn looping(m: &mut Matcher<'_, '_>) -> bool {
            m.alternation(&[sequence(vec![reference("LOOP"), literal("x")]), literal("x")])
        }
        let script = script("xx", &[("LOOP", looping)]);
        let options = Options { max_depth: 16, ..Options::default() };

        let err = Parser::new(&script).with_options(options).evaluate("LOOP").unwrap_err();
        assert_eq!(err, Error::GrammarTooDeep { limit: 16, rule: "LOOP" });
    }

    #[test]
    fn seek_and_manual_recording() {
        fn skip_two(m: &mut Matcher<'_, '_>) -> bool {
            if !(m.char_in(b"ab") && m.char_is_at(b'b', 1) && m.byte_at(9).is_none()) {
                return false;
            }
            m.seek(2);
            m.record_literal("ab");
            m.expect("MORE");
            !m.at_end() && m.remaining() == "cd"
        }
        let script = script("abcd", &[("SKIP", skip_two)]);
        let run = Parser::new(&script).evaluate("SKIP").unwrap();

        let root = run.tree.root_node();
        assert!(run.valid);
        assert_eq!((root.value(), root.end()), ("ab".to_string(), 2));
        assert_eq!(root.expected().at(1, 2), vec!["MORE"]);
    }

    #[test]
    fn terminal_helpers_accumulate_the_lexeme() {
        fn digits(m: &mut Matcher<'_, '_>) -> bool {
            let mut count = 0;
            while m.try_char_range(b'0', b'9') {
                count += 1;
            }
            count > 0
        }
        let script = script("2024!", &[("DIGITS", digits)]);
        let run = Parser::new(&script).evaluate("DIGITS").unwrap();

        assert_eq!(run.tree.root_node().value(), "2024");
        assert_eq!(run.tree.root_node().end(), 4);
    }
}
