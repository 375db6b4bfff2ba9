//! Extraction and resolution engine.
//!
//! This module is the entry point for the rule-based extraction engine. It is
//! split into focused submodules under `src/engine/` while keeping paths
//! stable (for example `crate::engine::Parser` and `crate::engine::BucketMask`).
//!
//! ## How the parts work together
//!
//! At a high level, extracting from an input string is a pipeline:
//!
//! ```text
//! rules (all)  ──┐
//!               │  CompiledRules::new           (compiled_rules.rs)
//!               └───────────────┬──────────────
//!                               │
//! input ── TriggerInfo::scan ───┼─ select active rules (buckets + phrases)
//!         (trigger.rs)          │
//!                               v
//!                     Parser::saturate (parser.rs)
//!                       - seed matches (regex-first)
//!                       - iterate to fixpoint
//!                       - add nodes to stash
//!                       - dedup via NodeKey (dedup.rs)
//!                               │
//!                               v
//!                     resolve_node (resolve.rs)
//!                       - per-dimension resolve
//!                       - span subsumption filter
//!                               │
//!                               v
//!                        Vec<ResolvedToken>
//! ```
//!
//! The engine leans on **saturation**: repeatedly apply rules until an
//! iteration produces no new nodes. Rule composition falls out naturally —
//! the amount rules discover `$100` in a first pass so that the price-ceiling
//! rule can consume it in the next.
//!
//! ## Responsibilities by module
//!
//! - `compiled_rules.rs`: derives `CompiledRules` from `Rule`s and builds cheap
//!   indexes (bucket lists, per-rule metadata).
//! - `trigger.rs`: scans the raw input to compute coarse buckets and key
//!   phrases for rule activation.
//! - `parser.rs`: performs matching + saturation over a `Stash`, producing
//!   candidate nodes and resolving them to output tokens.
//! - `dedup.rs`: defines stable dedup keys to keep saturation finite.
//! - `resolve.rs`: turns nodes into tag values, with dimension-specific logic.
//! - `metrics.rs`: timing/debug data for runs and passes.
//!
//! ## Adding new rules / dimensions
//!
//! - New rules are added under `src/rules/**` and ultimately passed into
//!   `Parser::new(..)` / `CompiledRules::new(..)`.
//! - If a new rule needs a new coarse trigger, add a new `BucketMask` bit and
//!   teach `TriggerInfo::scan` + `CompiledRules::new` + `Parser::new_compiled`
//!   to wire it through.
//! - If a new semantic dimension is added, extend `resolve.rs` so that
//!   `resolve_node` can produce a stable value for it, and give it a
//!   `DimensionSet` bit for dependency gating.
//!
//! ## Debugging
//!
//! The engine emits `tracing` events at `debug`/`trace` level for rule
//! activation, productions and resolution. Run the CLI with
//! `RUST_LOG=facetor=trace` to see them.

#[path = "engine/compiled_rules.rs"]
mod compiled_rules;
#[path = "engine/dedup.rs"]
mod dedup;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/parser.rs"]
mod parser;
#[path = "engine/resolve.rs"]
mod resolve;
#[path = "engine/trigger.rs"]
mod trigger;

#[allow(unused_imports)]
pub use compiled_rules::{BucketMask, CompiledRules, DimensionSet, RuleIndex, RuleMeta};
#[allow(unused_imports)]
pub use metrics::{PassMetrics, RunMetrics, RunResult, SaturationMetrics};
#[allow(unused_imports)]
pub use parser::Parser;
#[allow(unused_imports)]
pub use trigger::TriggerInfo;
