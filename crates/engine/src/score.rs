//! Confidence scoring for a (before, after) document pair.
//!
//! Four independent sub-scores are combined as a weighted sum and
//! rounded to two decimals. The score is advisory metadata; only the
//! orchestrator's acceptance bands turn it into a decision.

use std::collections::HashMap;
use std::sync::OnceLock;

use ir::Document;
use regex::Regex;
use tracing::debug;

use crate::ScoreWeights;

/// Constructs whose *appearance* in the fixed text (when absent from
/// the original) deducts from the safety sub-score.
const DANGEROUS_CONSTRUCTS: &[&str] = &[
    r"(?i)invoke-expression",
    r"(?i)\biex\b",
    r"(?i)downloadstring",
    r"(?i)downloadfile",
    r"(?i)-asplaintext",
    r"(?i)frombase64string",
];

fn dangerous_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        DANGEROUS_CONSTRUCTS
            .iter()
            .map(|p| Regex::new(p).expect("valid pattern"))
            .collect()
    })
}

/// Scores the rewrite `before → after`, in `[0.0, 1.0]`.
pub fn score(before: &Document, after: &Document, weights: &ScoreWeights) -> f64 {
    let syntax = if after.fatal_count() == 0 { 1.0 } else { 0.0 };
    let structure = structural_preservation(before.node_count(), after.node_count());
    let minimality = change_minimality(&before.source, &after.source);
    let safety = safety_score(&before.source, &after.source, weights.unsafe_penalty);

    let total = weights.syntax * syntax
        + weights.structure * structure
        + weights.minimality * minimality
        + weights.safety * safety;
    let rounded = (total.clamp(0.0, 1.0) * 100.0).round() / 100.0;
    debug!(syntax, structure, minimality, safety, confidence = rounded, "fix scored");
    rounded
}

fn structural_preservation(nodes_before: usize, nodes_after: usize) -> f64 {
    if nodes_before == 0 {
        return 1.0;
    }
    let delta = nodes_before.abs_diff(nodes_after) as f64;
    (1.0 - delta / nodes_before as f64).max(0.0)
}

/// Line-level diff ratio: changed lines over the longer of the two
/// line counts, as `1 - ratio` floored at zero.
fn change_minimality(before: &str, after: &str) -> f64 {
    let before_lines: Vec<&str> = before.lines().collect();
    let after_lines: Vec<&str> = after.lines().collect();
    let total = before_lines.len().max(after_lines.len());
    if total == 0 {
        return 1.0;
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in &before_lines {
        *counts.entry(line).or_insert(0) += 1;
    }
    let mut common = 0usize;
    for line in &after_lines {
        if let Some(c) = counts.get_mut(line) {
            if *c > 0 {
                *c -= 1;
                common += 1;
            }
        }
    }
    let changed = total - common.min(total);
    (1.0 - changed as f64 / total as f64).max(0.0)
}

fn safety_score(before: &str, after: &str, penalty: f64) -> f64 {
    let mut score = 1.0;
    for pattern in dangerous_patterns() {
        if pattern.is_match(after) && !pattern.is_match(before) {
            score -= penalty;
        }
    }
    score.max(0.0)
}
