//! Per-file fix orchestration.
//!
//! Each finding-fix attempt walks the state machine
//! `Detected → Proposed → Applied → {Validated | RolledBack |
//! Skipped}`. Passes repeat (one detection pass, then at most one
//! fixer application per outstanding finding) until no findings
//! remain, a pass produces no change, or the pass limit is reached.
//! Edits are always expressed against the pass-start snapshot;
//! accepted batches shift later offsets through [`offset_delta`], and
//! a batch overlapping an earlier accepted one loses the conflict
//! (first-registered rule wins).

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use rules::{Edit, ErrorKind, Finding, RuleRegistry};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::AstCache;
use crate::detect::{panic_message, run_detectors, DetectorError};
use crate::edit::{offset_delta, splice};
use crate::metrics::MetricsSink;
use crate::pipeline::CancellationFlag;
use crate::score::score;
use crate::selector::ActionSelector;
use crate::PipelineConfig;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
/// State of one finding-fix attempt. Recorded results always carry a
/// terminal state (`Validated`, `RolledBack`, or `Skipped`); the
/// earlier states exist for callers that stream progress.
pub enum FixState {
    Detected,
    Proposed,
    Applied,
    Validated,
    RolledBack,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
/// One fix attempt for one (file, rule, pass) application.
pub struct FixResult {
    pub rule_id: String,
    /// 1-based pass in which the attempt ran.
    pub pass: usize,
    pub state: FixState,
    /// Text before this attempt. Equal to `fixed_content` whenever
    /// `success` is false (rollback is byte-exact).
    pub original_content: String,
    pub fixed_content: String,
    /// Edits actually spliced, in current-snapshot coordinates.
    pub applied_edits: Vec<Edit>,
    pub confidence: f64,
    pub success: bool,
    pub error_kind: Option<ErrorKind>,
}

impl FixResult {
    fn unchanged(
        finding: &Finding,
        pass: usize,
        text: &str,
        state: FixState,
        confidence: f64,
        error_kind: ErrorKind,
    ) -> Self {
        Self {
            rule_id: finding.rule_id.clone(),
            pass,
            state,
            original_content: text.to_string(),
            fixed_content: text.to_string(),
            applied_edits: Vec::new(),
            confidence,
            success: false,
            error_kind: Some(error_kind),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
/// Everything the pipeline returns for one input file. The engine
/// never touches disk; committing `fixed_content` and writing backups
/// is the caller's responsibility.
pub struct FileOutcome {
    pub path: String,
    pub original_content: String,
    pub fixed_content: String,
    pub changed: bool,
    /// False only for `ParseFailure` and `TransformError`; contained
    /// per-rule failures leave the file outcome successful.
    pub success: bool,
    pub error_kind: Option<ErrorKind>,
    /// Passes actually run.
    pub passes: usize,
    pub results: Vec<FixResult>,
    /// Findings still present in the final text (unfixable or left at
    /// the pass limit). Reported, not errors.
    pub outstanding: Vec<Finding>,
    pub detector_errors: Vec<DetectorError>,
}

/// Runs the detect→fix→validate loop for one file.
#[allow(clippy::too_many_arguments)]
pub fn fix_file(
    path: &str,
    text: &str,
    registry: &RuleRegistry,
    cache: &AstCache,
    config: &PipelineConfig,
    metrics: &dyn MetricsSink,
    selector: &dyn ActionSelector,
    cancel: &CancellationFlag,
) -> FileOutcome {
    let started = Instant::now();
    let mut doc = cache.get_or_parse(text);
    if doc.has_fatal_errors() {
        debug!(path, "fatal parse errors present from the start; file skipped");
        return FileOutcome {
            path: path.to_string(),
            original_content: text.to_string(),
            fixed_content: text.to_string(),
            changed: false,
            success: false,
            error_kind: Some(ErrorKind::ParseFailure),
            passes: 0,
            results: Vec::new(),
            outstanding: Vec::new(),
            detector_errors: Vec::new(),
        };
    }

    let mut current = text.to_string();
    let mut results: Vec<FixResult> = Vec::new();
    let mut detector_errors: Vec<DetectorError> = Vec::new();
    let mut attempted: HashSet<(String, ir::Span)> = HashSet::new();
    let mut error_kind: Option<ErrorKind> = None;
    let mut passes = 0usize;

    for pass in 1..=config.max_passes {
        if cancel.is_cancelled() {
            debug!(path, pass, "cancelled between passes");
            break;
        }
        if let Some(budget) = config.file_budget {
            if started.elapsed() >= budget {
                warn!(path, pass, "per-file budget exhausted; aborting remaining passes");
                error_kind = Some(ErrorKind::TransformError);
                break;
            }
        }
        passes = pass;

        let pass_doc = Arc::clone(&doc);
        let (findings, errs) = run_detectors(&pass_doc, registry);
        detector_errors.extend(errs);
        if findings.is_empty() {
            break;
        }
        debug!(path, pass, findings = findings.len(), "detection pass complete");

        // accepted edits of this pass, in pass-start coordinates
        let mut applied_this_pass: Vec<Edit> = Vec::new();
        let mut changed = false;

        for finding in &findings {
            if attempted.contains(&finding.key()) {
                continue;
            }
            let Some(rule) = registry.get(&finding.rule_id) else {
                continue;
            };
            let attempt_start = Instant::now();

            if rule.fixers.is_empty() {
                debug!(rule = %finding.rule_id, "no fixer registered; manual review required");
                results.push(FixResult::unchanged(
                    finding,
                    pass,
                    &current,
                    FixState::Skipped,
                    0.0,
                    ErrorKind::ManualReviewRequired,
                ));
                attempted.insert(finding.key());
                metrics.record(
                    &finding.rule_id,
                    false,
                    attempt_start.elapsed().as_millis(),
                    0.0,
                );
                continue;
            }

            let idx = selector
                .choose(rule.id, rule.fixers.len())
                .min(rule.fixers.len() - 1);
            let fixer = rule.fixers[idx];
            let edits = match catch_unwind(AssertUnwindSafe(|| fixer(&pass_doc, finding))) {
                Ok(edits) => edits,
                Err(payload) => {
                    warn!(
                        rule = %finding.rule_id,
                        message = %panic_message(payload.as_ref()),
                        "fixer panicked; rule isolated"
                    );
                    results.push(FixResult::unchanged(
                        finding,
                        pass,
                        &current,
                        FixState::RolledBack,
                        0.0,
                        ErrorKind::FixerFailure,
                    ));
                    attempted.insert(finding.key());
                    metrics.record(
                        &finding.rule_id,
                        false,
                        attempt_start.elapsed().as_millis(),
                        0.0,
                    );
                    continue;
                }
            };

            if edits.is_empty() {
                results.push(FixResult::unchanged(
                    finding,
                    pass,
                    &current,
                    FixState::Skipped,
                    0.0,
                    ErrorKind::ManualReviewRequired,
                ));
                attempted.insert(finding.key());
                metrics.record(
                    &finding.rule_id,
                    false,
                    attempt_start.elapsed().as_millis(),
                    0.0,
                );
                continue;
            }

            // first-registered rule wins: proposals overlapping an
            // edit already accepted this pass are dropped; the finding
            // stays outstanding and gets fresh spans next pass
            let kept: Vec<Edit> = edits
                .iter()
                .filter(|e| !applied_this_pass.iter().any(|a| a.overlaps(e)))
                .cloned()
                .collect();
            if kept.len() < edits.len() {
                warn!(
                    rule = %finding.rule_id,
                    dropped = edits.len() - kept.len(),
                    "edit conflict with an earlier rule; losing edits dropped"
                );
            }
            if kept.is_empty() {
                continue;
            }

            let translated: Vec<Edit> = kept
                .iter()
                .map(|e| Edit {
                    start: shift(e.start, offset_delta(&applied_this_pass, e.start)),
                    end: shift(e.end, offset_delta(&applied_this_pass, e.end)),
                    replacement: e.replacement.clone(),
                })
                .collect();

            let outcome = match splice(&current, &translated) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(rule = %finding.rule_id, %err, "malformed edit batch rejected");
                    results.push(FixResult::unchanged(
                        finding,
                        pass,
                        &current,
                        FixState::RolledBack,
                        0.0,
                        ErrorKind::FixerFailure,
                    ));
                    attempted.insert(finding.key());
                    metrics.record(
                        &finding.rule_id,
                        false,
                        attempt_start.elapsed().as_millis(),
                        0.0,
                    );
                    continue;
                }
            };

            let after = cache.get_or_parse(&outcome.text);
            if after.fatal_count() > doc.fatal_count() {
                warn!(rule = %finding.rule_id, "re-parse introduced fatal errors; batch reverted");
                results.push(FixResult::unchanged(
                    finding,
                    pass,
                    &current,
                    FixState::RolledBack,
                    0.0,
                    ErrorKind::ValidationFailure,
                ));
                attempted.insert(finding.key());
                metrics.record(
                    &finding.rule_id,
                    false,
                    attempt_start.elapsed().as_millis(),
                    0.0,
                );
                continue;
            }

            let confidence = score(&doc, &after, &config.weights);
            if confidence < config.bands.floor {
                debug!(
                    rule = %finding.rule_id,
                    confidence,
                    "confidence below the accept floor; batch reverted"
                );
                results.push(FixResult::unchanged(
                    finding,
                    pass,
                    &current,
                    FixState::RolledBack,
                    confidence,
                    ErrorKind::ValidationFailure,
                ));
                attempted.insert(finding.key());
                metrics.record(
                    &finding.rule_id,
                    false,
                    attempt_start.elapsed().as_millis(),
                    confidence,
                );
                continue;
            }

            if confidence >= config.bands.auto_apply {
                debug!(rule = %finding.rule_id, confidence, "fix applied");
            } else if confidence >= config.bands.notice {
                info!(rule = %finding.rule_id, confidence, "fix applied (notice)");
            } else {
                warn!(rule = %finding.rule_id, confidence, "fix applied with warning");
            }

            results.push(FixResult {
                rule_id: finding.rule_id.clone(),
                pass,
                state: FixState::Validated,
                original_content: current.clone(),
                fixed_content: outcome.text.clone(),
                applied_edits: outcome.applied.clone(),
                confidence,
                success: true,
                error_kind: None,
            });
            metrics.record(
                &finding.rule_id,
                true,
                attempt_start.elapsed().as_millis(),
                confidence,
            );
            applied_this_pass.extend(kept);
            current = outcome.text;
            doc = after;
            changed = true;
        }

        if !changed {
            break;
        }
    }

    let outstanding = run_detectors(&doc, registry).0;
    FileOutcome {
        path: path.to_string(),
        original_content: text.to_string(),
        changed: current != text,
        success: error_kind.is_none(),
        error_kind,
        passes,
        fixed_content: current,
        results,
        outstanding,
        detector_errors,
    }
}

fn shift(pos: usize, delta: isize) -> usize {
    (pos as isize + delta).max(0) as usize
}
