//! Rule contracts and the builtin rule set.
//!
//! A rule pairs a [`Detector`] (pure function from a document to
//! findings) with zero or more [`Fixer`]s (pure functions from a
//! finding to text edits). Rules are registered once into a
//! [`RuleRegistry`] at pipeline construction and are read-only
//! afterwards; registration problems fail fast as
//! [`ConfigurationError`], never at per-file runtime.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ir::{Document, Span};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

pub mod builtin;
mod registry;

pub use registry::RuleRegistry;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
/// Severity associated with a rule or finding.
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Result of a detector matching somewhere in a document.
pub struct Finding {
    /// Rule that produced the finding.
    pub rule_id: String,
    pub severity: Severity,
    /// Where it matched, in the coordinates of the detected snapshot.
    pub span: Span,
    pub message: String,
    /// Free-form extra data for fixers and reporters.
    #[serde(default)]
    pub metadata: HashMap<String, JsonValue>,
}

impl Finding {
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            span,
            message: message.into(),
            metadata: HashMap::new(),
        }
    }

    /// Identity used for idempotence checks: same rule, same place.
    pub fn key(&self) -> (String, Span) {
        (self.rule_id.clone(), self.span)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// A single text replacement, half-open offsets into the *current*
/// document snapshot. Within one batch edits must not overlap.
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl Edit {
    pub fn replace(start: usize, end: usize, replacement: impl Into<String>) -> Self {
        Self {
            start,
            end,
            replacement: replacement.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at, at, text)
    }

    pub fn delete(start: usize, end: usize) -> Self {
        Self::replace(start, end, "")
    }

    /// A well-formed edit has ordered offsets that fit the snapshot.
    pub fn is_well_formed(&self, source_len: usize) -> bool {
        self.start <= self.end && self.end <= source_len
    }

    pub fn overlaps(&self, other: &Edit) -> bool {
        // two pure insertions at the same offset still conflict
        if self.start == self.end && other.start == other.end {
            return self.start == other.start;
        }
        self.start < other.end && other.start < self.end
    }
}

/// Pure function producing findings from a document. Must not perform
/// I/O and must be safe to call repeatedly.
pub type Detector = fn(&Document) -> Vec<Finding>;

/// Pure function producing the edits that remediate one finding.
/// Returning no edits means "no safe automatic fix".
pub type Fixer = fn(&Document, &Finding) -> Vec<Edit>;

#[derive(Clone)]
/// A registered rule: id, default severity, detector and candidate
/// fixers (empty for detect-only rules).
pub struct RuleDescriptor {
    pub id: &'static str,
    pub default_severity: Severity,
    pub detector: Detector,
    pub fixers: Vec<Fixer>,
}

impl fmt::Debug for RuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDescriptor")
            .field("id", &self.id)
            .field("default_severity", &self.default_severity)
            .field("fixers", &self.fixers.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Why a fix attempt (or a whole file) did not produce a change.
/// Everything here is contained and reported; nothing aborts the run.
pub enum ErrorKind {
    /// Fatal parse errors present from the start; file skipped.
    ParseFailure,
    /// A detector panicked; it was isolated and skipped for the pass.
    DetectorFailure,
    /// A fixer panicked or returned malformed edits.
    FixerFailure,
    /// Post-edit re-parse introduced new fatal errors; batch reverted.
    ValidationFailure,
    /// The fixer intentionally declined to act.
    ManualReviewRequired,
    /// Per-file budget exhausted; validated fixes were kept.
    TransformError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ParseFailure => "parse failure",
            ErrorKind::DetectorFailure => "detector failure",
            ErrorKind::FixerFailure => "fixer failure",
            ErrorKind::ValidationFailure => "validation failure",
            ErrorKind::ManualReviewRequired => "manual review required",
            ErrorKind::TransformError => "transform error",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Error)]
/// Invalid rule registration. The only error that aborts pipeline
/// construction instead of being contained per file.
pub enum ConfigurationError {
    #[error("duplicate rule id '{0}'")]
    DuplicateRuleId(String),
    #[error("rule id must not be empty")]
    EmptyRuleId,
}
