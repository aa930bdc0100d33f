//! Analysis-and-rewrite engine: detects rule violations in script
//! documents and applies syntax-preserving text fixes with a
//! confidence score per fix.
//!
//! The entry point is [`Pipeline::run`] (or the [`run_pipeline`]
//! convenience wrapper), which drives the detect→fix→validate loop per
//! file over a bounded worker pool. File discovery, reporting and
//! persistence are the caller's concern; the engine only consumes
//! `(path, text)` pairs and returns structured per-file outcomes.

use std::time::Duration;

pub mod cache;
pub mod detect;
pub mod edit;
pub mod metrics;
pub mod orchestrate;
pub mod pipeline;
pub mod score;
pub mod selector;

pub use cache::AstCache;
pub use detect::{run_detectors, DetectorError};
pub use edit::{splice, MalformedEdit, SpliceOutcome};
pub use metrics::{FixAttemptRecord, MetricsRecorder, MetricsSink, NoopSink};
pub use orchestrate::{fix_file, FileOutcome, FixResult, FixState};
pub use pipeline::{CancellationFlag, Pipeline};
pub use rules::{ConfigurationError, Edit, ErrorKind, Finding, RuleRegistry, Severity};
pub use score::score;
pub use selector::{ActionSelector, FirstFixer};

#[derive(Debug, Clone, Copy)]
/// Weights of the four confidence sub-scores. They sum to 1.0 by
/// default; syntax validity dominates so an invalid fix can never
/// outrank a no-op.
pub struct ScoreWeights {
    pub syntax: f64,
    pub structure: f64,
    pub minimality: f64,
    pub safety: f64,
    /// Deduction per distinct newly introduced dangerous construct.
    pub unsafe_penalty: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            syntax: 0.5,
            structure: 0.2,
            minimality: 0.2,
            safety: 0.1,
            unsafe_penalty: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
/// Acceptance bands applied to a scored fix. A fix below `floor` is
/// reverted; the other thresholds only grade how loudly it is
/// reported.
pub struct ConfidenceBands {
    pub auto_apply: f64,
    pub notice: f64,
    pub floor: f64,
}

impl Default for ConfidenceBands {
    fn default() -> Self {
        Self {
            auto_apply: 0.90,
            notice: 0.75,
            floor: 0.50,
        }
    }
}

#[derive(Debug, Clone)]
/// Explicit engine configuration, passed into the pipeline at
/// construction. There is no process-wide mutable state.
pub struct PipelineConfig {
    /// Upper bound on detect→fix passes per file; guards against
    /// oscillating rules.
    pub max_passes: usize,
    /// Maximum number of parsed documents kept by the AST cache.
    pub cache_capacity: usize,
    /// Worker pool size; `None` means one worker per logical core.
    pub workers: Option<usize>,
    /// Optional wall-clock budget per file, checked between passes.
    pub file_budget: Option<Duration>,
    pub weights: ScoreWeights,
    pub bands: ConfidenceBands,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_passes: 10,
            cache_capacity: 128,
            workers: None,
            file_budget: None,
            weights: ScoreWeights::default(),
            bands: ConfidenceBands::default(),
        }
    }
}

/// Runs the builtin rule set with default configuration over the given
/// `(path, text)` pairs and returns one outcome per input, in input
/// order.
pub fn run_pipeline<I>(sources: I) -> Vec<FileOutcome>
where
    I: IntoIterator<Item = (String, String)>,
{
    Pipeline::new(RuleRegistry::builtin(), PipelineConfig::default()).run(sources)
}
