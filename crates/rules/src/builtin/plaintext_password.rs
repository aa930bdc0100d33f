//! `plaintext-password`: `ConvertTo-SecureString -AsPlainText` builds
//! a credential out of a cleartext string. Removing the flag changes
//! behavior and the right remediation (vaults, prompts) is a design
//! decision, so this rule only reports.

use ir::{AstKind, Document};

use crate::{Finding, RuleDescriptor, Severity};

pub const ID: &str = "plaintext-password";

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
        if !name.eq_ignore_ascii_case("convertto-securestring") {
            continue;
        }
        for param in &cmd.children {
            if param.kind != AstKind::Parameter {
                continue;
            }
            if param
                .value
                .as_deref()
                .is_some_and(|p| p.eq_ignore_ascii_case("-asplaintext"))
            {
                findings.push(Finding::new(
                    ID,
                    Severity::Error,
                    param.span,
                    "secure string built from plain text; use a credential store or prompt",
                ));
            }
        }
    }
    findings
}
