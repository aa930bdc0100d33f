//! `invoke-expression`: dynamic evaluation of a string as code. There
//! is no mechanical rewrite that keeps the behavior and removes the
//! injection risk, so this rule deliberately ships without a fixer
//! and every finding ends up flagged for manual review.

use ir::{AstKind, Document, Span};

use crate::{Finding, RuleDescriptor, Severity};

pub const ID: &str = "invoke-expression";

pub fn rule() -> RuleDescriptor {
    RuleDescriptor {
        id: ID,
        default_severity: Severity::Error,
        detector: detect,
        fixers: Vec::new(),
    }
}

fn detect(doc: &Document) -> Vec<Finding> {
    let mut findings = Vec::new();
    for cmd in doc.tree.nodes_of_kind(AstKind::Command) {
        let Some(name) = cmd.value.as_deref() else {
            continue;
        };
        if !name.eq_ignore_ascii_case("invoke-expression") && !name.eq_ignore_ascii_case("iex") {
            continue;
        }
        let span = Span::new(
            cmd.span.start,
            cmd.span.start + name.len(),
            cmd.span.line,
            cmd.span.column,
        );
        findings.push(Finding::new(
            ID,
            Severity::Error,
            span,
            "Invoke-Expression executes arbitrary strings as code; review the input source",
        ));
    }
    findings
}
