//! Core data model shared by the parser and the fix engine.
//!
//! A [`Document`] is an immutable snapshot of one script: the raw text,
//! its token stream, the syntax tree (module [`ast`]) and the
//! diagnostics collected while parsing. Every successful edit
//! application produces a *new* `Document`; nothing here is mutated in
//! place after construction.

use serde::{Deserialize, Serialize};

pub mod ast;

pub use ast::{AstKind, AstNode, SyntaxTree};

/// Half-open `[start, end)` byte-offset range into a specific text
/// snapshot, with the line/column of its first character.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether two half-open ranges share at least one offset.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Lexical class of a token.
pub enum TokenKind {
    /// `# ...` or `<# ... #>`.
    Comment,
    /// Single- or double-quoted string literal, quotes included.
    StringLiteral,
    /// `$name`, `$env:name` or `${name}`.
    Variable,
    Number,
    /// `-Path`, `-Recurse` and other command parameters.
    Parameter,
    /// `-eq`, `=`, `+`, `!` and friends.
    Operator,
    /// Command names, keywords and other unquoted words.
    BareWord,
    Keyword,
    Pipe,
    Semicolon,
    Newline,
    Comma,
    LBrace,
    RBrace,
    LParen,
    RParen,
    /// `$(` opening a sub-expression.
    DollarParen,
    /// Anything the tokenizer could not classify.
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source text of the token.
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Whether a parse problem invalidates the document.
pub enum DiagnosticSeverity {
    /// The document cannot be trusted (unterminated string, unbalanced
    /// block). Fatal diagnostics gate edit validation.
    Fatal,
    /// Recovered from; the surrounding tree is still usable.
    Recoverable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A problem reported by the parser.
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn fatal(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: DiagnosticSeverity::Fatal,
            message: message.into(),
            span,
        }
    }

    pub fn recoverable(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: DiagnosticSeverity::Recoverable,
            message: message.into(),
            span,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Immutable parse result for one script snapshot.
pub struct Document {
    pub source: String,
    pub tokens: Vec<Token>,
    pub tree: SyntaxTree,
    pub diagnostics: Vec<Diagnostic>,
}

impl Document {
    pub fn new(
        source: String,
        tokens: Vec<Token>,
        tree: SyntaxTree,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            source,
            tokens,
            tree,
            diagnostics,
        }
    }

    /// Number of fatal diagnostics. Edit validation compares this
    /// before and after a splice.
    pub fn fatal_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Fatal)
            .count()
    }

    pub fn has_fatal_errors(&self) -> bool {
        self.fatal_count() > 0
    }

    /// Total node count of the tree, used for structural comparison.
    pub fn node_count(&self) -> usize {
        self.tree.index.len()
    }

    /// Source slice covered by `span`, empty if out of bounds.
    pub fn slice(&self, span: &Span) -> &str {
        self.source.get(span.start..span.end).unwrap_or("")
    }
}
