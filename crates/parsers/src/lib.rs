//! Converts raw script text into the [`ir::Document`] snapshot used by
//! the fix engine.
//!
//! Parsing is total and deterministic: identical text always yields a
//! structurally identical tree, and broken input never fails. Broken
//! input yields a document whose diagnostics carry the damage (fatal
//! for unterminated strings/blocks, recoverable for constructs the
//! parser stepped over).

use ir::Document;
use serde::Serialize;
use tracing::debug;

mod syntax;
mod tokens;

pub use tokens::tokenize;

#[derive(Debug, Default, Serialize)]
pub struct ParserMetrics {
    pub documents_parsed: usize,
    pub fatal_diagnostics: usize,
}

/// Parses `text` into an immutable [`Document`].
///
/// # Example
/// ```
/// let doc = parsers::parse("Get-ChildItem -Path C:\\");
/// assert!(!doc.has_fatal_errors());
/// assert!(doc.node_count() > 0);
/// ```
pub fn parse(text: &str) -> Document {
    let (tokens, mut diagnostics) = tokens::tokenize(text);
    let (tree, parse_diags) = syntax::build_tree(&tokens);
    diagnostics.extend(parse_diags);
    debug!(
        bytes = text.len(),
        tokens = tokens.len(),
        diagnostics = diagnostics.len(),
        "parsed document"
    );
    Document::new(text.to_string(), tokens, tree, diagnostics)
}

/// Same as [`parse`] but feeds the shared metrics counters.
pub fn parse_with_metrics(text: &str, metrics: &mut ParserMetrics) -> Document {
    let doc = parse(text);
    metrics.documents_parsed += 1;
    metrics.fatal_diagnostics += doc.fatal_count();
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::AstKind;

    #[test]
    fn parse_is_total_on_empty_input() {
        let doc = parse("");
        assert!(!doc.has_fatal_errors());
        assert_eq!(doc.tree.roots.len(), 1);
        assert_eq!(doc.tree.roots[0].kind, AstKind::Script);
    }

    #[test]
    fn parse_is_deterministic() {
        let src = "gci -Path C:\\ | Where-Object { $_.Length -gt 10 }";
        let a = parse(src);
        let b = parse(src);
        assert_eq!(a.node_count(), b.node_count());
        assert_eq!(
            serde_json::to_string(&a.tree).unwrap(),
            serde_json::to_string(&b.tree).unwrap()
        );
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let doc = parse("Write-Output \"oops");
        assert!(doc.has_fatal_errors());
    }

    #[test]
    fn metrics_count_documents() {
        let mut m = ParserMetrics::default();
        parse_with_metrics("gci", &mut m);
        parse_with_metrics("'open", &mut m);
        assert_eq!(m.documents_parsed, 2);
        assert_eq!(m.fatal_diagnostics, 1);
    }
}
