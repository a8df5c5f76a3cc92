pub mod token;

use crate::scanner::token::{Token, TokenKind};
use crate::span::Span;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ScanError {
    pub span: Span,
    pub message: String,
}

/// Turns source text into a flat token stream.
///
/// One left-to-right pass, no backtracking. Newlines collapse into a single
/// `Line` token, `#` starts a comment that runs to end of line, and the stream
/// always ends with exactly one `Eof`. Scanning stops at the first error; a
/// failed scan produces no token stream at all.
pub struct Scanner {
    source: Vec<char>,
    tokens: Vec<Token>,
    error: Option<ScanError>,
    start: usize,
    current: usize,
    line: usize,
    line_start: usize,
    keywords: HashMap<String, TokenKind>,
}

impl Scanner {
    pub fn new(source: impl Into<String>, keywords: &HashMap<String, TokenKind>) -> Self {
        Scanner {
            source: source.into().chars().collect(),
            tokens: Vec::new(),
            error: None,
            start: 0,
            current: 0,
            line: 1,
            line_start: 0,
            keywords: keywords.clone(),
        }
    }

    pub fn scan_tokens(mut self) -> Result<Vec<Token>, ScanError> {
        while !self.is_at_end() && self.error.is_none() {
            self.start = self.current;
            self.scan_token();
        }

        if let Some(error) = self.error.take() {
            return Err(error);
        }

        let span = Span::new(self.line, self.col_of(self.current), 0);
        self.tokens.push(Token::new(TokenKind::Eof, "", span));
        Ok(self.tokens)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '[' => self.add_token(TokenKind::LeftBracket),
            ']' => self.add_token(TokenKind::RightBracket),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),

            '+' => self.add_token(TokenKind::Plus),
            '*' => self.add_token(TokenKind::Star),
            '/' => self.add_token(TokenKind::Slash),
            '%' => self.add_token(TokenKind::Percent),

            // '-' is ambiguous: directly before a digit it starts a negative
            // numeric literal, anywhere else it is subtraction.
            '-' => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.handle_number();
                } else {
                    self.add_token(TokenKind::Minus);
                }
            }

            '=' => {
                let kind = if self.match_char('=') {
                    TokenKind::Equal
                } else {
                    TokenKind::Assign
                };
                self.add_token(kind);
            }

            '<' => {
                let kind = if self.match_char('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }

            '>' => {
                let kind = if self.match_char('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }

            // Only the pair '!=' is defined; a lone '!' is not an operator.
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::NotEqual);
                } else {
                    self.report_error("unrecognized character '!' (did you mean '!='?)");
                }
            }

            '&' => self.add_token(TokenKind::Amp),
            '|' => self.add_token(TokenKind::Pipe),

            // Comment runs to end of line; the newline itself is handled next pass.
            '#' => {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            }

            ' ' | '\r' | '\t' => {}

            '\n' => {
                self.line += 1;
                self.line_start = self.current;

                // Blank lines produce no extra tokens.
                let last_is_line = self
                    .tokens
                    .last()
                    .is_some_and(|t| t.kind == TokenKind::Line);
                if !last_is_line {
                    self.add_token(TokenKind::Line);
                }
            }

            '"' | '\'' => self.handle_string(c),

            c if c.is_ascii_digit() => self.handle_number(),

            c if c.is_alphabetic() || c == '_' => self.handle_identifier(),

            c => self.report_error(format!("unrecognized character '{}'", c)),
        }
    }

    fn advance(&mut self) -> char {
        let ch = self.source[self.current];
        self.current += 1;
        ch
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.current).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.source.get(self.current + 1).copied()
    }

    fn match_char(&mut self, expected: char) -> bool {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.current += 1;
                true
            }
            _ => false,
        }
    }

    fn handle_string(&mut self, quote: char) {
        while self.peek().is_some_and(|c| c != quote) {
            if self.peek() == Some('\n') {
                self.line += 1;
                self.line_start = self.current + 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.report_error("unterminated string literal");
            return;
        }

        self.advance(); // closing quote

        let value: String = self.source[self.start + 1..self.current - 1]
            .iter()
            .collect();
        self.add_token(TokenKind::Str(value));
    }

    fn handle_number(&mut self) {
        // First char (digit or leading '-') is already consumed.
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') {
            if self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
                self.advance(); // consume '.'
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            } else {
                // "3." has a dot but no fractional digits
                self.advance();
                self.report_error("invalid float format");
                return;
            }
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        match text.parse::<f64>() {
            Ok(value) => self.add_token(TokenKind::Num(value)),
            Err(_) => self.report_error(format!("invalid number '{}'", text)),
        }
    }

    fn handle_identifier(&mut self) {
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let kind = self
            .keywords
            .get(&text)
            .cloned()
            .unwrap_or(TokenKind::Identifier);
        self.add_token(kind);
    }

    fn col_of(&self, pos: usize) -> usize {
        pos.saturating_sub(self.line_start) + 1
    }

    fn add_token(&mut self, kind: TokenKind) {
        let text: String = self.source[self.start..self.current].iter().collect();
        let span = Span::new(self.line, self.col_of(self.start), self.current - self.start);
        self.tokens.push(Token::new(kind, text, span));
    }

    fn report_error(&mut self, message: impl Into<String>) {
        if self.error.is_some() {
            return;
        }
        let span = Span::new(self.line, self.col_of(self.start), self.current - self.start);
        self.error = Some(ScanError {
            span,
            message: message.into(),
        });
    }
}
