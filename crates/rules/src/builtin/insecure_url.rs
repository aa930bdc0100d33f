//! `insecure-url`: a plain-HTTP URL in a string literal or bare
//! argument. The fixer upgrades the scheme to HTTPS inside the
//! affected token only; whether the endpoint actually speaks HTTPS is
//! for the caller's confidence threshold to veto.

use std::sync::OnceLock;

use ir::{Document, TokenKind};
use regex::Regex;
use serde_json::json;

use crate::{Edit, Finding, Fixer, RuleDescriptor, Severity};

pub const ID: &str = "insecure-url";

fn http_scheme() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)http://").expect("valid regex"))
}

pub fn rule() -> RuleDescriptor {
    RuleDescriptor {
        id: ID,
        default_severity: Severity::Warning,
        detector: detect,
        fixers: vec![fix as Fixer],
    }
}

fn detect(doc: &Document) -> Vec<Finding> {
    let mut findings = Vec::new();
    for token in &doc.tokens {
        if !matches!(token.kind, TokenKind::StringLiteral | TokenKind::BareWord) {
            continue;
        }
        if !http_scheme().is_match(&token.text) {
            continue;
        }
        let replacement = http_scheme().replace_all(&token.text, "https://");
        let mut finding = Finding::new(
            ID,
            Severity::Warning,
            token.span,
            "insecure http:// URL; use https://",
        );
        finding
            .metadata
            .insert("replacement".into(), json!(replacement));
        findings.push(finding);
    }
    findings
}

fn fix(_doc: &Document, finding: &Finding) -> Vec<Edit> {
    let Some(replacement) = finding
        .metadata
        .get("replacement")
        .and_then(|v| v.as_str())
    else {
        return Vec::new();
    };
    vec![Edit::replace(
        finding.span.start,
        finding.span.end,
        replacement,
    )]
}
