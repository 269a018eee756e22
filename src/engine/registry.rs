//! Rule registration and lookup.
//!
//! Grammars are resolved by name through three tiers, highest precedence
//! first:
//!
//! 1. **Overrides**: per-script replacements supplied by the caller.
//! 2. **Primitives**: the built-in tier (`crate::rules::primitives`), holding
//!    `BLANK`, `LITERAL`, `EOF` and the other terminal helpers.
//! 3. **Parser rules**: the productions of the language being parsed.
//!
//! The tiers are merged once, when a `RuleTable` is built, so a lookup during
//! evaluation is a single hash probe that yields either a `Grammar` or a typed
//! `Error::RuleNotFound`.
//!
//! ## Invariants
//!
//! - A `RuleTable` is immutable after construction; it is shared read-only by
//!   every node of a run through the owning `Script`.
//! - A name present in several tiers resolves to the highest-precedence tier.
//!   `RuleEntry::tier` records which one won.

use crate::{Error, Grammar, Result};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Registry tier a rule was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Override,
    Primitive,
    Parser,
}

/// One registry tier: an ordered, name-keyed table of grammars.
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: IndexMap<&'static str, Grammar>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`RuleSet::insert`].
    pub fn with(mut self, name: &'static str, grammar: Grammar) -> Self {
        self.insert(name, grammar);
        self
    }

    /// Register `grammar` under `name`, returning the grammar it replaced.
    pub fn insert(&mut self, name: &'static str, grammar: Grammar) -> Option<Grammar> {
        self.rules.insert(name, grammar)
    }

    pub fn get(&self, name: &str) -> Option<Grammar> {
        self.rules.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Rule names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<(&'static str, Grammar)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (&'static str, Grammar)>>(iter: I) -> Self {
        Self { rules: iter.into_iter().collect() }
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet").field("rules", &self.rules.keys().collect::<Vec<_>>()).finish()
    }
}

/// A resolved registry entry.
#[derive(Clone, Copy)]
pub struct RuleEntry {
    pub grammar: Grammar,
    pub tier: Tier,
}

impl std::fmt::Debug for RuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEntry").field("grammar", &"<function>").field("tier", &self.tier).finish()
    }
}

/// The merged three-tier rule table.
#[derive(Clone, Default)]
pub struct RuleTable {
    rules: HashMap<&'static str, RuleEntry>,
}

impl RuleTable {
    /// Merge the three tiers. Lower tiers are inserted first so that higher
    /// tiers overwrite them.
    pub fn new(overrides: &RuleSet, primitives: &RuleSet, parser_rules: &RuleSet) -> Self {
        let mut rules = HashMap::with_capacity(overrides.len() + primitives.len() + parser_rules.len());
        for (tier, set) in [(Tier::Parser, parser_rules), (Tier::Primitive, primitives), (Tier::Override, overrides)] {
            for (&name, &grammar) in &set.rules {
                rules.insert(name, RuleEntry { grammar, tier });
            }
        }
        Self { rules }
    }

    /// Table for `language` on top of the built-in primitives, with no overrides.
    pub fn for_language(language: &crate::Language) -> Self {
        Self::new(&RuleSet::new(), crate::rules::primitives::rule_set(), &language.rules)
    }

    /// Look up `name`, reporting a typed error when no tier defines it.
    pub fn resolve(&self, name: &str) -> Result<Grammar> {
        self.rules.get(name).map(|entry| entry.grammar).ok_or_else(|| Error::RuleNotFound { rule: name.to_string() })
    }

    /// The registered spelling of `name`, with the table's static lifetime.
    pub fn registered_name(&self, name: &str) -> Option<&'static str> {
        self.rules.get_key_value(name).map(|(&key, _)| key)
    }

    pub fn entry(&self, name: &str) -> Option<RuleEntry> {
        self.rules.get(name).copied()
    }

    pub fn tier_of(&self, name: &str) -> Option<Tier> {
        self.rules.get(name).map(|entry| entry.tier)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.rules.iter().map(|(name, entry)| (*name, entry.tier)).collect();
        names.sort_unstable();
        f.debug_struct("RuleTable").field("rules", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Matcher;

    fn yes(_: &mut Matcher<'_, '_>) -> bool {
        true
    }

    fn no(_: &mut Matcher<'_, '_>) -> bool {
        false
    }

    #[test]
    fn higher_tiers_shadow_lower_ones() {
        let overrides = RuleSet::new().with("A", yes);
        let primitives = RuleSet::new().with("A", no).with("B", no);
        let parser_rules = RuleSet::new().with("A", no).with("B", yes).with("C", yes);

        let table = RuleTable::new(&overrides, &primitives, &parser_rules);

        assert_eq!(table.len(), 3);
        assert_eq!(table.tier_of("A"), Some(Tier::Override));
        assert_eq!(table.tier_of("B"), Some(Tier::Primitive));
        assert_eq!(table.tier_of("C"), Some(Tier::Parser));
        assert_eq!(table.registered_name(&String::from("C")), Some("C"));
        assert_eq!(table.registered_name("D"), None);
    }

    #[test]
    fn missing_rule_is_a_typed_error() {
        let table = RuleTable::new(&RuleSet::new(), &RuleSet::new(), &RuleSet::new());
        match table.resolve("NOPE") {
            Err(Error::RuleNotFound { rule }) => assert_eq!(rule, "NOPE"),
            other => panic!("unexpected lookup result: {:?}", other.map(|_| "<function>")),
        }
    }

    #[test]
    fn rule_set_keeps_registration_order() {
        let set: RuleSet = [("Z", yes as Grammar), ("A", no as Grammar)].into_iter().collect();
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["Z", "A"]);
        assert!(set.contains("Z"));
        assert!(!set.is_empty());
    }
}
