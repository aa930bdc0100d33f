//! Single-pass tokenizer for the PowerShell subset.

use ir::{Diagnostic, Span, Token, TokenKind};

const COMPARISON_OPERATORS: &[&str] = &[
    "-eq",
    "-ne",
    "-gt",
    "-ge",
    "-lt",
    "-le",
    "-like",
    "-notlike",
    "-match",
    "-notmatch",
    "-replace",
    "-contains",
    "-notcontains",
    "-in",
    "-notin",
    "-and",
    "-or",
    "-not",
    "-xor",
    "-band",
    "-bor",
    "-is",
    "-as",
    "-join",
    "-split",
    "-f",
];

const KEYWORDS: &[&str] = &[
    "if", "elseif", "else", "foreach", "while", "function", "try", "catch", "finally", "return",
    "param", "do", "until", "switch", "for",
];

struct Tokenizer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
}

/// Splits `text` into tokens. Never fails; lexical damage (an
/// unterminated string or block comment) is reported as a fatal
/// diagnostic and the rest of the input becomes part of the broken
/// token.
pub fn tokenize(text: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut t = Tokenizer {
        src: text,
        bytes: text.as_bytes(),
        pos: 0,
        line: 1,
        column: 1,
        tokens: Vec::new(),
        diagnostics: Vec::new(),
    };
    t.run();
    (t.tokens, t.diagnostics)
}

impl<'a> Tokenizer<'a> {
    fn run(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '\n' => self.newline(),
                '#' => self.line_comment(),
                '<' if self.peek_at(1) == Some('#') => self.block_comment(),
                '\'' => self.single_quoted(),
                '"' => self.double_quoted(),
                '$' => self.dollar(),
                '-' => self.dash(),
                '0'..='9' => self.number(),
                '|' => self.punct(TokenKind::Pipe),
                ';' => self.punct(TokenKind::Semicolon),
                ',' => self.punct(TokenKind::Comma),
                '{' => self.punct(TokenKind::LBrace),
                '}' => self.punct(TokenKind::RBrace),
                '(' => self.punct(TokenKind::LParen),
                ')' => self.punct(TokenKind::RParen),
                '=' | '+' | '*' | '/' | '%' | '!' | '>' | '<' | '@' | '&' | '[' | ']' | '.' => {
                    self.punct(TokenKind::Operator)
                }
                c if c.is_alphanumeric() || c == '_' || c == '\\' || c == '~' => self.bare_word(),
                _ => self.punct(TokenKind::Unknown),
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, start: usize, line: usize, column: usize) {
        let span = Span::new(start, self.pos, line, column);
        self.tokens.push(Token {
            kind,
            text: self.src[start..self.pos].to_string(),
            span,
        });
    }

    fn mark(&self) -> (usize, usize, usize) {
        (self.pos, self.line, self.column)
    }

    fn newline(&mut self) {
        let (start, line, column) = self.mark();
        self.bump();
        self.push(TokenKind::Newline, start, line, column);
    }

    fn punct(&mut self, kind: TokenKind) {
        let (start, line, column) = self.mark();
        self.bump();
        self.push(kind, start, line, column);
    }

    fn line_comment(&mut self) {
        let (start, line, column) = self.mark();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        self.push(TokenKind::Comment, start, line, column);
    }

    fn block_comment(&mut self) {
        let (start, line, column) = self.mark();
        self.bump(); // <
        self.bump(); // #
        loop {
            match self.peek() {
                Some('#') if self.peek_at(1) == Some('>') => {
                    self.bump();
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
                None => {
                    self.diagnostics.push(Diagnostic::fatal(
                        "unterminated block comment",
                        Span::new(start, self.pos, line, column),
                    ));
                    break;
                }
            }
        }
        self.push(TokenKind::Comment, start, line, column);
    }

    fn single_quoted(&mut self) {
        let (start, line, column) = self.mark();
        self.bump(); // opening quote
        loop {
            match self.peek() {
                // '' escapes a quote inside a single-quoted string
                Some('\'') if self.peek_at(1) == Some('\'') => {
                    self.bump();
                    self.bump();
                }
                Some('\'') => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
                None => {
                    self.diagnostics.push(Diagnostic::fatal(
                        "unterminated string literal",
                        Span::new(start, self.pos, line, column),
                    ));
                    break;
                }
            }
        }
        self.push(TokenKind::StringLiteral, start, line, column);
    }

    fn double_quoted(&mut self) {
        let (start, line, column) = self.mark();
        self.bump(); // opening quote
        loop {
            match self.peek() {
                // backtick escapes the next character
                Some('`') => {
                    self.bump();
                    self.bump();
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
                None => {
                    self.diagnostics.push(Diagnostic::fatal(
                        "unterminated string literal",
                        Span::new(start, self.pos, line, column),
                    ));
                    break;
                }
            }
        }
        self.push(TokenKind::StringLiteral, start, line, column);
    }

    fn dollar(&mut self) {
        let (start, line, column) = self.mark();
        self.bump(); // $
        match self.peek() {
            Some('(') => {
                self.bump();
                self.push(TokenKind::DollarParen, start, line, column);
            }
            Some('{') => {
                self.bump();
                loop {
                    match self.peek() {
                        Some('}') => {
                            self.bump();
                            break;
                        }
                        Some(_) => {
                            self.bump();
                        }
                        None => {
                            self.diagnostics.push(Diagnostic::fatal(
                                "unterminated braced variable",
                                Span::new(start, self.pos, line, column),
                            ));
                            break;
                        }
                    }
                }
                self.push(TokenKind::Variable, start, line, column);
            }
            _ => {
                while let Some(c) = self.peek() {
                    if c.is_alphanumeric() || c == '_' || c == ':' {
                        self.bump();
                    } else {
                        break;
                    }
                }
                self.push(TokenKind::Variable, start, line, column);
            }
        }
    }

    fn dash(&mut self) {
        let (start, line, column) = self.mark();
        self.bump(); // -
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                while let Some(c) = self.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        self.bump();
                    } else {
                        break;
                    }
                }
                let word = &self.src[start..self.pos];
                let kind = if COMPARISON_OPERATORS.contains(&word.to_ascii_lowercase().as_str()) {
                    TokenKind::Operator
                } else {
                    TokenKind::Parameter
                };
                self.push(kind, start, line, column);
            }
            Some(c) if c.is_ascii_digit() => {
                self.consume_number();
                self.push(TokenKind::Number, start, line, column);
            }
            _ => self.push(TokenKind::Operator, start, line, column),
        }
    }

    fn number(&mut self) {
        let (start, line, column) = self.mark();
        self.consume_number();
        self.push(TokenKind::Number, start, line, column);
    }

    fn consume_number(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.bump();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.bump();
                } else {
                    break;
                }
            }
        }
    }

    fn bare_word(&mut self) {
        let (start, line, column) = self.mark();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '\\' | '/' | '~') {
                self.bump();
            } else {
                break;
            }
        }
        let word = &self.src[start..self.pos];
        let kind = if KEYWORDS.contains(&word.to_ascii_lowercase().as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::BareWord
        };
        self.push(kind, start, line, column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::TokenKind;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn command_with_parameter_and_path() {
        let (tokens, diags) = tokenize("gci -Path C:\\");
        assert!(diags.is_empty());
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["gci", "-Path", "C:\\"]);
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::BareWord, TokenKind::Parameter, TokenKind::BareWord]
        );
    }

    #[test]
    fn comparison_operators_are_not_parameters() {
        assert_eq!(
            kinds("$a -eq 1"),
            vec![TokenKind::Variable, TokenKind::Operator, TokenKind::Number]
        );
    }

    #[test]
    fn strings_capture_quotes_and_escapes() {
        let (tokens, diags) = tokenize("'it''s' \"a `\" b\"");
        assert!(diags.is_empty());
        assert_eq!(tokens[0].text, "'it''s'");
        assert_eq!(tokens[1].text, "\"a `\" b\"");
    }

    #[test]
    fn unterminated_string_reports_fatal() {
        let (_, diags) = tokenize("\"never closed");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, ir::DiagnosticSeverity::Fatal);
    }

    #[test]
    fn keywords_and_blocks() {
        assert_eq!(
            kinds("try { } catch { }"),
            vec![
                TokenKind::Keyword,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Keyword,
                TokenKind::LBrace,
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn spans_are_byte_accurate() {
        let (tokens, _) = tokenize("gci | cat");
        assert_eq!(tokens[0].span.start, 0);
        assert_eq!(tokens[0].span.end, 3);
        assert_eq!(tokens[1].span.start, 4);
        assert_eq!(tokens[2].span.start, 6);
        assert_eq!(tokens[2].span.end, 9);
    }

    #[test]
    fn line_tracking_across_newlines() {
        let (tokens, _) = tokenize("gci\ncat");
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[2].span.line, 2);
        assert_eq!(tokens[2].span.column, 1);
    }
}
