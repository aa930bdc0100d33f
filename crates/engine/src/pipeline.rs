//! Concurrent multi-file pipeline.
//!
//! Files fan out over a bounded rayon pool; every worker shares one
//! [`AstCache`], one metrics sink, and one cancellation flag. Results
//! come back in input order regardless of worker count, so a run is
//! reproducible byte for byte.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rules::RuleRegistry;
use tracing::{debug, info};

use crate::cache::AstCache;
use crate::metrics::{MetricsSink, NoopSink};
use crate::orchestrate::{fix_file, FileOutcome};
use crate::selector::{ActionSelector, FirstFixer};
use crate::PipelineConfig;

/// Cooperative stop signal, checked between passes. Work already in
/// flight finishes; nothing is left half-applied.
#[derive(Debug, Default)]
pub struct CancellationFlag {
    cancelled: AtomicBool,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

pub struct Pipeline {
    registry: RuleRegistry,
    config: PipelineConfig,
    cache: Arc<AstCache>,
    metrics: Arc<dyn MetricsSink>,
    selector: Arc<dyn ActionSelector>,
    cancel: Arc<CancellationFlag>,
}

impl Pipeline {
    pub fn new(registry: RuleRegistry, config: PipelineConfig) -> Self {
        let cache = Arc::new(AstCache::new(config.cache_capacity));
        Self {
            registry,
            config,
            cache,
            metrics: Arc::new(NoopSink),
            selector: Arc::new(FirstFixer),
            cancel: Arc::new(CancellationFlag::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_selector(mut self, selector: Arc<dyn ActionSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Handle for requesting a cooperative stop from another thread.
    pub fn cancellation_flag(&self) -> Arc<CancellationFlag> {
        Arc::clone(&self.cancel)
    }

    /// `(hits, misses)` of the shared parse cache.
    pub fn cache_stats(&self) -> (usize, usize) {
        self.cache.stats()
    }

    /// Fixes every `(path, content)` pair, returning one outcome per
    /// input in input order.
    pub fn run<I>(&self, sources: I) -> Vec<FileOutcome>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let sources: Vec<(String, String)> = sources.into_iter().collect();
        info!(files = sources.len(), "pipeline run started");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.unwrap_or(0))
            .build()
            .expect("rayon thread pool");

        let outcomes: Vec<FileOutcome> = pool.install(|| {
            sources
                .par_iter()
                .map(|(path, content)| {
                    fix_file(
                        path,
                        content,
                        &self.registry,
                        &self.cache,
                        &self.config,
                        self.metrics.as_ref(),
                        self.selector.as_ref(),
                        &self.cancel,
                    )
                })
                .collect()
        });

        let changed = outcomes.iter().filter(|o| o.changed).count();
        let failed = outcomes.iter().filter(|o| !o.success).count();
        debug!(changed, failed, "pipeline run finished");
        outcomes
    }
}
