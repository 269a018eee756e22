//! Engine run metrics.
//!
//! Counters are cheap and always collected during evaluation; timings are
//! filled in by `Parser::evaluate` and `Parser::run`. The CLI prints them
//! after the tree.

use super::normalize::NormalizeStats;
use std::time::Duration;

// --- Metrics -----------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Total elapsed time for the run.
    pub total: Duration,
    /// Time spent evaluating the root rule.
    pub evaluate: Duration,
    /// Time spent in the normalizer (zero when normalization is disabled).
    pub normalize: Duration,
    /// Nodes allocated, including those of discarded alternatives.
    pub nodes_created: usize,
    /// Grammar functions invoked.
    pub evaluations: usize,
    /// Alternations evaluated.
    pub alternations: usize,
    /// Deepest rule nesting reached.
    pub deepest: usize,
    /// Rule names that resolved in no registry tier, in first-seen order.
    pub unresolved: Vec<&'static str>,
    /// What normalization changed.
    pub normalized: NormalizeStats,
}
