use std::sync::Arc;

use engine::{MetricsRecorder, Pipeline, PipelineConfig, RuleRegistry};

fn mixed_corpus(files: usize) -> Vec<(String, String)> {
    (0..files)
        .map(|i| {
            let body = match i % 4 {
                0 => format!("gci -Path C:\\dir{i}\n"),
                1 => format!("try {{ ls }} catch {{ }}\niwr http://host{i}.example\n"),
                2 => "Invoke-Expression $payload\n".to_string(),
                _ => format!("Write-Output {i}\n"),
            };
            (format!("script{i}.ps1"), body)
        })
        .collect()
}

fn pipeline_with_workers(workers: usize) -> Pipeline {
    Pipeline::new(
        RuleRegistry::builtin(),
        PipelineConfig {
            workers: Some(workers),
            ..PipelineConfig::default()
        },
    )
}

#[test]
fn outcomes_are_identical_across_worker_counts() {
    let corpus = mixed_corpus(32);
    let serial = pipeline_with_workers(1).run(corpus.clone());
    let parallel = pipeline_with_workers(8).run(corpus);

    assert_eq!(serial.len(), parallel.len());
    for (a, b) in serial.iter().zip(&parallel) {
        assert_eq!(a.path, b.path);
        assert_eq!(a.fixed_content, b.fixed_content);
        assert_eq!(a.changed, b.changed);
        assert_eq!(a.error_kind, b.error_kind);
        assert_eq!(a.results.len(), b.results.len());
        assert_eq!(a.outstanding.len(), b.outstanding.len());
    }
}

#[test]
fn metrics_aggregate_across_workers() {
    let corpus = mixed_corpus(16);
    let recorder = Arc::new(MetricsRecorder::new());
    let outcomes = pipeline_with_workers(4)
        .with_metrics(Arc::clone(&recorder) as Arc<dyn engine::MetricsSink>)
        .run(corpus);

    let expected: usize = outcomes.iter().map(|o| o.results.len()).sum();
    assert_eq!(recorder.attempts(), expected);
    let successes: usize = outcomes
        .iter()
        .map(|o| o.results.iter().filter(|r| r.success).count())
        .sum();
    assert_eq!(recorder.successes(), successes);
}

#[test]
fn duplicate_contents_hit_the_shared_cache() {
    let src = "Write-Output 'same everywhere'\n".to_string();
    let corpus: Vec<(String, String)> = (0..8)
        .map(|i| (format!("copy{i}.ps1"), src.clone()))
        .collect();
    let pipeline = pipeline_with_workers(4);
    pipeline.run(corpus);
    let (hits, misses) = pipeline.cache_stats();
    assert_eq!(misses, 1);
    assert_eq!(hits, 7);
}

#[test]
fn cancelled_pipeline_reports_unchanged_files() {
    let pipeline = pipeline_with_workers(2);
    pipeline.cancellation_flag().cancel();
    let outcomes = pipeline.run(mixed_corpus(6));
    for outcome in &outcomes {
        assert!(!outcome.changed);
        assert_eq!(outcome.fixed_content, outcome.original_content);
        assert!(outcome.success);
    }
}
