//! `alias-usage`: command invoked through an alias instead of its
//! canonical cmdlet name. Aliases are a readability and portability
//! hazard in scripts (`gci` is not even defined on all platforms),
//! and the rewrite is mechanical, so this rule carries a fixer.

use ir::{AstKind, Document, Span};
use serde_json::json;

use crate::{Edit, Finding, Fixer, RuleDescriptor, Severity};

pub const ID: &str = "alias-usage";

/// Canonical cmdlet behind a builtin alias, if any.
pub fn canonical_cmdlet(name: &str) -> Option<&'static str> {
    let canonical = match name.to_ascii_lowercase().as_str() {
        "gci" | "ls" | "dir" => "Get-ChildItem",
        "gc" | "cat" | "type" => "Get-Content",
        "sc" => "Set-Content",
        "cp" | "copy" => "Copy-Item",
        "mv" | "move" => "Move-Item",
        "rm" | "del" | "ri" | "erase" => "Remove-Item",
        "gi" => "Get-Item",
        "echo" | "write" => "Write-Output",
        "select" => "Select-Object",
        "where" => "Where-Object",
        "sort" => "Sort-Object",
        "measure" => "Measure-Object",
        "sls" => "Select-String",
        "pwd" | "gl" => "Get-Location",
        "cd" | "sl" | "chdir" => "Set-Location",
        "ps" | "gps" => "Get-Process",
        "kill" | "spps" => "Stop-Process",
        "sleep" => "Start-Sleep",
        "gcm" => "Get-Command",
        "gm" => "Get-Member",
        "iwr" | "curl" | "wget" => "Invoke-WebRequest",
        "iex" => "Invoke-Expression",
        "cls" | "clear" => "Clear-Host",
        "popd" => "Pop-Location",
        "pushd" => "Push-Location",
        _ => return None,
    };
    Some(canonical)
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
    for cmd in doc.tree.nodes_of_kind(AstKind::Command) {
        let Some(name) = cmd.value.as_deref() else {
            continue;
        };
        let Some(canonical) = canonical_cmdlet(name) else {
            continue;
        };
        if name == canonical {
            continue;
        }
        // the command span starts at the name token
        let span = Span::new(
            cmd.span.start,
            cmd.span.start + name.len(),
            cmd.span.line,
            cmd.span.column,
        );
        let mut finding = Finding::new(
            ID,
            Severity::Warning,
            span,
            format!("alias '{name}' used instead of '{canonical}'"),
        );
        finding
            .metadata
            .insert("replacement".into(), json!(canonical));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_alias_at_name_span() {
        let doc = parsers::parse("gci -Path C:\\");
        let findings = detect(&doc);
        assert_eq!(findings.len(), 1);
        assert_eq!(doc.slice(&findings[0].span), "gci");
    }

    #[test]
    fn canonical_names_are_clean() {
        let doc = parsers::parse("Get-ChildItem -Path C:\\");
        assert!(detect(&doc).is_empty());
    }

    #[test]
    fn fix_replaces_alias_only() {
        let doc = parsers::parse("gci -Path C:\\");
        let findings = detect(&doc);
        let edits = fix(&doc, &findings[0]);
        assert_eq!(edits, vec![Edit::replace(0, 3, "Get-ChildItem")]);
    }

    #[test]
    fn finds_aliases_in_nested_blocks() {
        let doc = parsers::parse("if ($x) { ls | where { $_.Name } }");
        let names: Vec<String> = detect(&doc)
            .into_iter()
            .map(|f| doc.slice(&f.span).to_string())
            .collect();
        assert_eq!(names, vec!["ls", "where"]);
    }
}
