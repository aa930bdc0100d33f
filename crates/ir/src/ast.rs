//! Syntax tree for the PowerShell subset.
//!
//! Nodes own their children; upward navigation goes through the flat
//! id-ordered `index` kept by [`SyntaxTree`], so parent references are
//! plain `Option<usize>` and never manage lifetimes.

use serde::{Deserialize, Serialize};

use crate::Span;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Logical kind of a syntax node.
pub enum AstKind {
    /// Root of a parsed script.
    Script,
    /// One or more commands joined by `|`.
    Pipeline,
    /// A command invocation, value = command name.
    Command,
    /// `-Name` style parameter of a command, possibly with a value.
    Parameter,
    /// Positional command argument.
    Argument,
    /// `$x = <pipeline>`.
    Assignment,
    Variable,
    StringLiteral,
    NumberLiteral,
    If,
    ElseIf,
    Else,
    Foreach,
    While,
    Function,
    Try,
    Catch,
    Finally,
    Return,
    /// `{ ... }` block of statements.
    ScriptBlock,
    /// `$( ... )` or `( ... )`.
    SubExpression,
    /// Condition or expression kept as raw tokens.
    Expression,
    /// Statement the parser could not classify; spans the raw tokens.
    Opaque,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstNode {
    /// Incremental unique identifier of the node within the document.
    pub id: usize,
    /// Reference to the parent node, if any.
    pub parent: Option<usize>,
    pub kind: AstKind,
    /// Associated text where it matters (command name, variable name,
    /// literal text); `None` for purely structural nodes.
    pub value: Option<String>,
    pub span: Span,
    pub children: Vec<AstNode>,
}

impl AstNode {
    pub fn new(id: usize, kind: AstKind, span: Span) -> Self {
        Self {
            id,
            parent: None,
            kind,
            value: None,
            span,
            children: Vec::new(),
        }
    }

    pub fn with_value(id: usize, kind: AstKind, span: Span, value: impl Into<String>) -> Self {
        let mut node = Self::new(id, kind, span);
        node.value = Some(value.into());
        node
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Root nodes of a document plus a flat node index ordered by `id`.
pub struct SyntaxTree {
    pub roots: Vec<AstNode>,
    /// Every node of the tree, cloned, indexed by `id`.
    pub index: Vec<AstNode>,
}

impl SyntaxTree {
    /// Links parent ids and adds `node` as a root.
    pub fn push(&mut self, mut node: AstNode) {
        link_parents(&mut node);
        self.collect(&node);
        self.roots.push(node);
    }

    fn collect(&mut self, node: &AstNode) {
        if node.id == self.index.len() {
            self.index.push(node.clone());
        } else if node.id < self.index.len() {
            self.index[node.id] = node.clone();
        } else {
            self.index.push(node.clone());
        }
        for child in &node.children {
            self.collect(child);
        }
    }

    /// Gets the parent node of `id`, if any.
    pub fn parent(&self, id: usize) -> Option<&AstNode> {
        self.index
            .get(id)
            .and_then(|n| n.parent.and_then(|p| self.index.get(p)))
    }

    pub fn get(&self, id: usize) -> Option<&AstNode> {
        self.index.get(id)
    }

    /// All nodes of the given kind, in id (source) order.
    pub fn nodes_of_kind(&self, kind: AstKind) -> Vec<&AstNode> {
        self.index.iter().filter(|n| n.kind == kind).collect()
    }

    /// Depth-first walk over the owned tree.
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(&'a AstNode)) {
        fn go<'a>(node: &'a AstNode, visit: &mut impl FnMut(&'a AstNode)) {
            visit(node);
            for child in &node.children {
                go(child, visit);
            }
        }
        for root in &self.roots {
            go(root, &mut visit);
        }
    }
}

fn link_parents(node: &mut AstNode) {
    let id = node.id;
    for child in &mut node.children {
        child.parent = Some(id);
        link_parents(child);
    }
}
