//! Detection pass: every registered detector over one document, each
//! call in its own failure boundary.

use std::panic::{catch_unwind, AssertUnwindSafe};

use ir::Document;
use rules::{Finding, RuleRegistry};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize)]
/// A detector that panicked during a pass. The rule is skipped for
/// that pass; the others keep running.
pub struct DetectorError {
    pub rule_id: String,
    pub message: String,
}

/// Runs all registered detectors over `doc` in registration order and
/// collects their findings into one ordered list. A panicking
/// detector is isolated, logged and reported as a [`DetectorError`].
pub fn run_detectors(doc: &Document, registry: &RuleRegistry) -> (Vec<Finding>, Vec<DetectorError>) {
    let mut findings = Vec::new();
    let mut errors = Vec::new();
    for rule in registry.rules() {
        match catch_unwind(AssertUnwindSafe(|| (rule.detector)(doc))) {
            Ok(mut found) => {
                debug!(rule = rule.id, count = found.len(), "detector finished");
                findings.append(&mut found);
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(rule = rule.id, %message, "detector panicked; skipped for this pass");
                errors.push(DetectorError {
                    rule_id: rule.id.to_string(),
                    message,
                });
            }
        }
    }
    (findings, errors)
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
