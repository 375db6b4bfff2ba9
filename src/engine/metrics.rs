//! Engine run metrics.
//!
//! A small set of structs used to observe and debug engine performance and
//! behavior:
//!
//! - `Parser::run` for normal operation.
//! - `Parser::run_with_metrics` for profiling and inspecting what each pass
//!   produced (surfaced through the verbose API and the CLI report).

use crate::{Node, ResolvedToken};
use std::time::Duration;

// --- Metrics -----------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Total elapsed time for a run.
    pub total: Duration,
    /// Timings for the saturation phase.
    pub saturation: SaturationMetrics,
    /// Time spent resolving tokens after saturation.
    pub resolve: Duration,
}

/// Timings for the saturation phase.
#[derive(Debug, Default, Clone)]
pub struct SaturationMetrics {
    /// Total elapsed time for saturation (initial regex pass + iterations).
    pub total: Duration,
    /// Metrics for the initial regex-only pass.
    pub initial_regex: PassMetrics,
    /// Metrics for each subsequent saturation iteration.
    pub iterations: Vec<PassMetrics>,
}

/// Timing and node discovery for a single pass.
#[derive(Debug, Default, Clone)]
pub struct PassMetrics {
    /// Elapsed time for the pass.
    pub duration: Duration,
    /// Number of new nodes added to the stash during the pass.
    pub produced: usize,
    /// New nodes produced in this pass.
    pub nodes: Vec<Node>,
}

/// Parser output bundled with timing information.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Resolved tokens after span filtering, in facet-then-position order.
    pub tokens: Vec<ResolvedToken>,
    /// Timing measurements for the run.
    pub metrics: RunMetrics,
}
