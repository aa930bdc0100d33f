//! Recursive-descent statement parser.
//!
//! Builds a [`SyntaxTree`] out of the token stream with best-effort
//! recovery: anything unclassifiable becomes an `Opaque` node spanning
//! the raw tokens, and only structural damage (an unclosed block or
//! parenthesis) is fatal.

use ir::{AstKind, AstNode, Diagnostic, Span, SyntaxTree, Token, TokenKind};

struct TreeBuilder<'a> {
    tokens: Vec<&'a Token>,
    pos: usize,
    next_id: usize,
    diagnostics: Vec<Diagnostic>,
    source_len: usize,
}

pub(crate) fn build_tree(tokens: &[Token]) -> (SyntaxTree, Vec<Diagnostic>) {
    let source_len = tokens.last().map(|t| t.span.end).unwrap_or(0);
    let mut b = TreeBuilder {
        // comments never participate in the grammar
        tokens: tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect(),
        pos: 0,
        next_id: 0,
        diagnostics: Vec::new(),
        source_len,
    };
    let mut script = AstNode::new(b.new_id(), AstKind::Script, Span::new(0, source_len, 1, 1));
    b.skip_separators();
    while !b.at_end() {
        let stmt = b.statement();
        script.children.push(stmt);
        b.skip_separators();
    }
    let mut tree = SyntaxTree::default();
    tree.push(script);
    (tree, b.diagnostics)
}

impl<'a> TreeBuilder<'a> {
    fn new_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<&'a Token> {
        let t = self.tokens.get(self.pos).copied();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn skip_separators(&mut self) {
        while matches!(
            self.peek_kind(),
            Some(TokenKind::Newline) | Some(TokenKind::Semicolon)
        ) {
            self.pos += 1;
        }
    }

    fn at_separator(&self) -> bool {
        matches!(
            self.peek_kind(),
            None | Some(TokenKind::Newline) | Some(TokenKind::Semicolon)
        )
    }

    /// Span covering the already-consumed tokens `[from, self.pos)`.
    fn span_from(&self, from: usize) -> Span {
        let first = match self.tokens.get(from) {
            Some(t) => t.span,
            None => Span::new(self.source_len, self.source_len, 1, 1),
        };
        let end = self
            .tokens
            .get(self.pos.saturating_sub(1))
            .map(|t| t.span.end)
            .unwrap_or(first.end);
        Span::new(first.start, end.max(first.start), first.line, first.column)
    }

    fn statement(&mut self) -> AstNode {
        let tok = match self.peek() {
            Some(t) => t,
            None => return AstNode::new(self.new_id(), AstKind::Opaque, Span::default()),
        };
        match tok.kind {
            TokenKind::Keyword => match tok.text.to_ascii_lowercase().as_str() {
                "if" => self.if_statement(),
                "foreach" | "while" | "for" | "until" => self.loop_statement(),
                "function" => self.function_statement(),
                "try" => self.try_statement(),
                "return" => self.return_statement(),
                _ => self.opaque_statement("unexpected keyword"),
            },
            TokenKind::Variable
                if self
                    .peek_at(1)
                    .is_some_and(|t| t.kind == TokenKind::Operator && t.text == "=") =>
            {
                self.assignment()
            }
            TokenKind::LBrace => {
                let from = self.pos;
                let id = self.new_id();
                let block = self.script_block();
                let mut node = AstNode::new(id, AstKind::Pipeline, self.span_from(from));
                node.children.push(block);
                node
            }
            _ => self.pipeline(),
        }
    }

    fn opaque_statement(&mut self, message: &str) -> AstNode {
        let from = self.pos;
        while !self.at_separator() {
            self.bump();
        }
        let span = self.span_from(from);
        self.diagnostics
            .push(Diagnostic::recoverable(message, span));
        AstNode::new(self.new_id(), AstKind::Opaque, span)
    }

    fn pipeline(&mut self) -> AstNode {
        let from = self.pos;
        let id = self.new_id();
        let mut children = vec![self.command()];
        while self.peek_kind() == Some(TokenKind::Pipe) {
            self.bump();
            // a pipe may be followed by a line break
            while self.peek_kind() == Some(TokenKind::Newline) {
                self.bump();
            }
            children.push(self.command());
        }
        let mut node = AstNode::new(id, AstKind::Pipeline, self.span_from(from));
        node.children = children;
        node
    }

    fn command(&mut self) -> AstNode {
        let from = self.pos;
        let tok = match self.peek() {
            Some(t) => t,
            None => {
                return AstNode::new(
                    self.new_id(),
                    AstKind::Opaque,
                    Span::new(self.source_len, self.source_len, 1, 1),
                )
            }
        };
        match tok.kind {
            TokenKind::BareWord => {
                let id = self.new_id();
                let name = tok.text.clone();
                self.bump();
                let children = self.command_elements();
                let mut node =
                    AstNode::with_value(id, AstKind::Command, self.span_from(from), name);
                node.children = children;
                node
            }
            TokenKind::Variable | TokenKind::StringLiteral | TokenKind::Number => {
                // bare expression in command position: $x.Count, "text", 42
                let id = self.new_id();
                while !self.at_separator()
                    && !matches!(
                        self.peek_kind(),
                        Some(TokenKind::Pipe) | Some(TokenKind::RParen) | Some(TokenKind::RBrace)
                    )
                {
                    self.bump();
                }
                AstNode::with_value(
                    id,
                    AstKind::Expression,
                    self.span_from(from),
                    tok.text.clone(),
                )
            }
            TokenKind::DollarParen | TokenKind::LParen => {
                let id = self.new_id();
                let sub = self.sub_expression();
                let mut node = AstNode::new(id, AstKind::Pipeline, self.span_from(from));
                node.children.push(sub);
                node
            }
            _ => self.opaque_statement("unexpected token in command position"),
        }
    }

    fn command_elements(&mut self) -> Vec<AstNode> {
        let mut out = Vec::new();
        loop {
            if self.at_separator()
                || matches!(
                    self.peek_kind(),
                    Some(TokenKind::Pipe) | Some(TokenKind::RParen) | Some(TokenKind::RBrace)
                )
            {
                break;
            }
            let tok = match self.peek() {
                Some(t) => t,
                None => break,
            };
            match tok.kind {
                TokenKind::Parameter => {
                    let id = self.new_id();
                    let from = self.pos;
                    self.bump();
                    out.push(AstNode::with_value(
                        id,
                        AstKind::Parameter,
                        self.span_from(from),
                        tok.text.clone(),
                    ));
                }
                TokenKind::Variable => {
                    out.push(self.leaf(AstKind::Variable));
                }
                TokenKind::StringLiteral => {
                    out.push(self.leaf(AstKind::StringLiteral));
                }
                TokenKind::Number => {
                    out.push(self.leaf(AstKind::NumberLiteral));
                }
                TokenKind::LBrace => {
                    out.push(self.script_block());
                }
                TokenKind::DollarParen | TokenKind::LParen => {
                    out.push(self.sub_expression());
                }
                _ => {
                    out.push(self.leaf(AstKind::Argument));
                }
            }
        }
        out
    }

    fn leaf(&mut self, kind: AstKind) -> AstNode {
        let id = self.new_id();
        let from = self.pos;
        let text = self.bump().map(|t| t.text.clone()).unwrap_or_default();
        AstNode::with_value(id, kind, self.span_from(from), text)
    }

    fn script_block(&mut self) -> AstNode {
        let from = self.pos;
        let id = self.new_id();
        self.bump(); // {
        let mut children = Vec::new();
        loop {
            self.skip_separators();
            match self.peek_kind() {
                Some(TokenKind::RBrace) => {
                    self.bump();
                    break;
                }
                None => {
                    self.diagnostics.push(Diagnostic::fatal(
                        "unclosed script block",
                        self.span_from(from),
                    ));
                    break;
                }
                _ => children.push(self.statement()),
            }
        }
        let mut node = AstNode::new(id, AstKind::ScriptBlock, self.span_from(from));
        node.children = children;
        node
    }

    fn sub_expression(&mut self) -> AstNode {
        let from = self.pos;
        let id = self.new_id();
        self.bump(); // ( or $(
        let mut children = Vec::new();
        loop {
            self.skip_separators();
            match self.peek_kind() {
                Some(TokenKind::RParen) => {
                    self.bump();
                    break;
                }
                None => {
                    self.diagnostics.push(Diagnostic::fatal(
                        "unclosed sub-expression",
                        self.span_from(from),
                    ));
                    break;
                }
                _ => children.push(self.statement()),
            }
        }
        let mut node = AstNode::new(id, AstKind::SubExpression, self.span_from(from));
        node.children = children;
        node
    }

    /// Raw parenthesized header: `( ... )` consumed with nesting,
    /// contents kept as one Expression node.
    fn paren_expression(&mut self) -> AstNode {
        let from = self.pos;
        let id = self.new_id();
        if self.peek_kind() != Some(TokenKind::LParen) {
            let span = self.span_from(from);
            self.diagnostics
                .push(Diagnostic::recoverable("expected '('", span));
            return AstNode::new(id, AstKind::Expression, span);
        }
        self.bump();
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek_kind() {
                Some(TokenKind::LParen) | Some(TokenKind::DollarParen) => {
                    depth += 1;
                    self.bump();
                }
                Some(TokenKind::RParen) => {
                    depth -= 1;
                    self.bump();
                }
                Some(_) => {
                    self.bump();
                }
                None => {
                    self.diagnostics.push(Diagnostic::fatal(
                        "unclosed parenthesis",
                        self.span_from(from),
                    ));
                    break;
                }
            }
        }
        AstNode::new(id, AstKind::Expression, self.span_from(from))
    }

    fn braced_body_or_recover(&mut self) -> Option<AstNode> {
        self.skip_newlines_only();
        if self.peek_kind() == Some(TokenKind::LBrace) {
            Some(self.script_block())
        } else {
            let span = self.span_from(self.pos);
            self.diagnostics
                .push(Diagnostic::recoverable("expected '{'", span));
            None
        }
    }

    fn skip_newlines_only(&mut self) {
        while self.peek_kind() == Some(TokenKind::Newline) {
            self.bump();
        }
    }

    fn if_statement(&mut self) -> AstNode {
        let from = self.pos;
        let id = self.new_id();
        self.bump(); // if
        let mut children = vec![self.paren_expression()];
        if let Some(body) = self.braced_body_or_recover() {
            children.push(body);
        }
        loop {
            self.skip_newlines_only();
            let Some(tok) = self.peek() else { break };
            if tok.kind != TokenKind::Keyword {
                break;
            }
            match tok.text.to_ascii_lowercase().as_str() {
                "elseif" => {
                    let branch_from = self.pos;
                    let branch_id = self.new_id();
                    self.bump();
                    let mut branch = Vec::new();
                    branch.push(self.paren_expression());
                    if let Some(body) = self.braced_body_or_recover() {
                        branch.push(body);
                    }
                    let mut node =
                        AstNode::new(branch_id, AstKind::ElseIf, self.span_from(branch_from));
                    node.children = branch;
                    children.push(node);
                }
                "else" => {
                    let branch_from = self.pos;
                    let branch_id = self.new_id();
                    self.bump();
                    let mut node =
                        AstNode::new(branch_id, AstKind::Else, self.span_from(branch_from));
                    if let Some(body) = self.braced_body_or_recover() {
                        node.children.push(body);
                    }
                    node.span = self.span_from(branch_from);
                    children.push(node);
                    break;
                }
                _ => break,
            }
        }
        let mut node = AstNode::new(id, AstKind::If, self.span_from(from));
        node.children = children;
        node
    }

    fn loop_statement(&mut self) -> AstNode {
        let from = self.pos;
        let id = self.new_id();
        let keyword = self.bump().map(|t| t.text.to_ascii_lowercase());
        let kind = match keyword.as_deref() {
            Some("foreach") => AstKind::Foreach,
            _ => AstKind::While,
        };
        let mut children = vec![self.paren_expression()];
        if let Some(body) = self.braced_body_or_recover() {
            children.push(body);
        }
        let mut node = AstNode::new(id, kind, self.span_from(from));
        node.children = children;
        node
    }

    fn function_statement(&mut self) -> AstNode {
        let from = self.pos;
        let id = self.new_id();
        self.bump(); // function
        let name = if self.peek_kind() == Some(TokenKind::BareWord) {
            self.bump().map(|t| t.text.clone())
        } else {
            let span = self.span_from(self.pos);
            self.diagnostics
                .push(Diagnostic::recoverable("expected function name", span));
            None
        };
        let mut node = AstNode::new(id, AstKind::Function, self.span_from(from));
        node.value = name;
        if let Some(body) = self.braced_body_or_recover() {
            node.children.push(body);
        }
        node.span = self.span_from(from);
        node
    }

    fn try_statement(&mut self) -> AstNode {
        let from = self.pos;
        let id = self.new_id();
        self.bump(); // try
        let mut children = Vec::new();
        if let Some(body) = self.braced_body_or_recover() {
            children.push(body);
        }
        let mut handled = false;
        loop {
            self.skip_newlines_only();
            let Some(tok) = self.peek() else { break };
            if tok.kind != TokenKind::Keyword {
                break;
            }
            match tok.text.to_ascii_lowercase().as_str() {
                "catch" => {
                    handled = true;
                    let branch_from = self.pos;
                    let branch_id = self.new_id();
                    self.bump();
                    let mut branch = AstNode::new(branch_id, AstKind::Catch, Span::default());
                    // optional exception type tokens before the body
                    let type_from = self.pos;
                    while !matches!(
                        self.peek_kind(),
                        None | Some(TokenKind::LBrace) | Some(TokenKind::Newline)
                    ) {
                        self.bump();
                    }
                    if self.pos > type_from {
                        let type_id = self.new_id();
                        branch.children.push(AstNode::new(
                            type_id,
                            AstKind::Expression,
                            self.span_from(type_from),
                        ));
                    }
                    if let Some(body) = self.braced_body_or_recover() {
                        branch.children.push(body);
                    }
                    branch.span = self.span_from(branch_from);
                    children.push(branch);
                }
                "finally" => {
                    handled = true;
                    let branch_from = self.pos;
                    let branch_id = self.new_id();
                    self.bump();
                    let mut branch = AstNode::new(branch_id, AstKind::Finally, Span::default());
                    if let Some(body) = self.braced_body_or_recover() {
                        branch.children.push(body);
                    }
                    branch.span = self.span_from(branch_from);
                    children.push(branch);
                    break;
                }
                _ => break,
            }
        }
        if !handled {
            self.diagnostics.push(Diagnostic::recoverable(
                "try without catch or finally",
                self.span_from(from),
            ));
        }
        let mut node = AstNode::new(id, AstKind::Try, self.span_from(from));
        node.children = children;
        node
    }

    fn return_statement(&mut self) -> AstNode {
        let from = self.pos;
        let id = self.new_id();
        self.bump(); // return
        let mut node = AstNode::new(id, AstKind::Return, Span::default());
        if !self.at_separator() {
            node.children.push(self.pipeline());
        }
        node.span = self.span_from(from);
        node
    }

    fn assignment(&mut self) -> AstNode {
        let from = self.pos;
        let id = self.new_id();
        let target = self.leaf(AstKind::Variable);
        self.bump(); // =
        let value = self.pipeline();
        let mut node = AstNode::new(id, AstKind::Assignment, self.span_from(from));
        node.children = vec![target, value];
        node
    }
}
