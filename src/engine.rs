//! Grammar execution engine.
//!
//! The engine is split into focused submodules under `src/engine/`, re-exported
//! here so callers can use flat paths such as `crate::engine::Parser` and
//! `crate::engine::Walker`.
//!
//! ## How the parts work together
//!
//! ```text
//! overrides ─┐
//! primitives ┼─ RuleTable::new                  (registry.rs)
//! language  ─┘        │
//!                     v
//! source ───────── Script                       (script.rs)
//!                     │
//!                     v
//!            Parser::evaluate                   (parser.rs)
//!              - root node, recursion guard
//!              - Matcher: sequence / alternation / reference   (matcher.rs)
//!              - ExpectedSet per node                          (expected.rs)
//!                     │
//!                     v
//!            raw ParseTree (arena)              (node.rs)
//!                     │  ParseTree::normalize   (normalize.rs)
//!                     v
//!            Walker ── Compiler::trigger        (walker.rs)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `registry.rs`: rule tiers (`RuleSet`) and their merged, precedence-ordered
//!   lookup table (`RuleTable`).
//! - `script.rs`: source text with byte access and line/character positions.
//! - `node.rs`: the node arena, flags and the read-only `NodeRef` view.
//! - `matcher.rs`: node evaluation and every combinator rule authors use.
//! - `expected.rs`: positional "expected one of" diagnostics.
//! - `normalize.rs`: removal of transient wrapper nodes.
//! - `walker.rs`: post-order traversal driving the external compiler.
//! - `parser.rs`: the façade tying a run together.
//! - `metrics.rs`: counters and timings for a run.
//!
//! ## Debugging
//!
//! Set `RULEWALK_DEBUG=1` to print evaluation, alternation and traversal traces.

#[path = "engine/expected.rs"]
mod expected;
#[path = "engine/matcher.rs"]
mod matcher;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/node.rs"]
mod node;
#[path = "engine/normalize.rs"]
mod normalize;
#[path = "engine/parser.rs"]
mod parser;
#[path = "engine/registry.rs"]
mod registry;
#[path = "engine/script.rs"]
mod script;
#[path = "engine/walker.rs"]
mod walker;

use once_cell::sync::Lazy;

pub use expected::{ExpectedSet, SyntaxError};
pub use matcher::{Matcher, alternation, literal, many, named_grammar, optional, reference, sequence};
pub use metrics::RunMetrics;
pub use node::{NodeData, NodeFlags, NodeId, NodeRef, ParseTree};
pub use normalize::NormalizeStats;
pub use parser::{Evaluation, Parser};
pub use registry::{RuleEntry, RuleSet, RuleTable, Tier};
pub use script::{Position, Script};
pub use walker::{Compiler, Walker};

static DEBUG: Lazy<bool> = Lazy::new(|| std::env::var_os("RULEWALK_DEBUG").is_some());

/// Whether trace output was requested through `RULEWALK_DEBUG`.
pub(crate) fn debug_enabled() -> bool {
    *DEBUG
}
