//! `empty-catch`: a catch block that swallows the error without a
//! trace. The fixer inserts a `Write-Error $_` so the failure is at
//! least surfaced; callers who want different handling still get the
//! finding to act on.

use ir::{AstKind, Document};

use crate::{Edit, Finding, Fixer, RuleDescriptor, Severity};

pub const ID: &str = "empty-catch";

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
    for catch in doc.tree.nodes_of_kind(AstKind::Catch) {
        let Some(body) = catch
            .children
            .iter()
            .find(|c| c.kind == AstKind::ScriptBlock)
        else {
            continue;
        };
        if body.children.is_empty() {
            findings.push(Finding::new(
                ID,
                Severity::Warning,
                body.span,
                "empty catch block silently discards the error",
            ));
        }
    }
    findings
}

/// Inserts `Write-Error $_` right after the opening brace. The body
/// is only edited, never replaced: interior text the detector cannot
/// see (comments are stripped before tree building) stays in place.
fn fix(_doc: &Document, finding: &Finding) -> Vec<Edit> {
    vec![Edit::insert(finding.span.start + 1, " Write-Error $_")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_empty_catch_body() {
        let doc = parsers::parse("try { DoWork } catch { }");
        let findings = detect(&doc);
        assert_eq!(findings.len(), 1);
        assert_eq!(doc.slice(&findings[0].span), "{ }");
    }

    #[test]
    fn populated_catch_is_clean() {
        let doc = parsers::parse("try { DoWork } catch { Write-Error $_ }");
        assert!(detect(&doc).is_empty());
    }

    #[test]
    fn fix_inserts_error_reporting() {
        let src = "try { DoWork } catch { }";
        let doc = parsers::parse(src);
        let findings = detect(&doc);
        let edits = fix(&doc, &findings[0]);
        assert_eq!(edits.len(), 1);
        let mut fixed = src.to_string();
        fixed.replace_range(edits[0].start..edits[0].end, &edits[0].replacement);
        assert_eq!(fixed, "try { DoWork } catch { Write-Error $_ }");
        assert!(!parsers::parse(&fixed).has_fatal_errors());
    }

    #[test]
    fn fix_keeps_comment_only_bodies() {
        // comments are invisible to the detector but must survive
        let src = "try { DoWork } catch { # retry is intentional\n}";
        let doc = parsers::parse(src);
        let findings = detect(&doc);
        assert_eq!(findings.len(), 1);
        let edits = fix(&doc, &findings[0]);
        let mut fixed = src.to_string();
        fixed.replace_range(edits[0].start..edits[0].end, &edits[0].replacement);
        assert_eq!(
            fixed,
            "try { DoWork } catch { Write-Error $_ # retry is intentional\n}"
        );
        assert!(!parsers::parse(&fixed).has_fatal_errors());
    }

    #[test]
    fn multiline_empty_catch() {
        let doc = parsers::parse("try {\n  DoWork\n} catch {\n}\n");
        assert_eq!(detect(&doc).len(), 1);
    }
}
