//! `trailing-whitespace`: blanks before the end of a line. Pure
//! style, deleted verbatim by the fixer.

use ir::{Document, Span};

use crate::{Edit, Finding, Fixer, RuleDescriptor, Severity};

pub const ID: &str = "trailing-whitespace";

pub fn rule() -> RuleDescriptor {
    RuleDescriptor {
        id: ID,
        default_severity: Severity::Info,
        detector: detect,
        fixers: vec![fix as Fixer],
    }
}

fn detect(doc: &Document) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut offset = 0usize;
    for (idx, raw) in doc.source.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let trimmed = line.trim_end_matches([' ', '\t']);
        if trimmed.len() < line.len() {
            let span = Span::new(
                offset + trimmed.len(),
                offset + line.len(),
                idx + 1,
                trimmed.chars().count() + 1,
            );
            findings.push(Finding::new(
                ID,
                Severity::Info,
                span,
                "trailing whitespace",
            ));
        }
        offset += raw.len() + 1;
    }
    findings
}

fn fix(_doc: &Document, finding: &Finding) -> Vec<Edit> {
    vec![Edit::delete(finding.span.start, finding.span.end)]
}
