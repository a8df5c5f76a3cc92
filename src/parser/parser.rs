use crate::parser::ast::{BinaryOp, Expr, ExprKind, LogicalOp, Program, Stmt, StmtKind};
use crate::scanner::token::{Token, TokenKind};
use crate::span::Span;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

/// Recursive-descent parser over the scanner's token stream.
///
/// Statements end at a `Line` token (or the end of file); blocks are
/// `do ... end`. The first unexpected token aborts the parse — there is no
/// recovery and no partial program.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    // utility methods
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_next(&self) -> &Token {
        if self.current + 1 < self.tokens.len() {
            &self.tokens[self.current + 1]
        } else {
            // the Eof sentinel
            &self.tokens[self.tokens.len() - 1]
        }
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn match_any(&mut self, kinds: &[TokenKind]) -> bool {
        for k in kinds {
            if self.check(k.clone()) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn skip_lines(&mut self) {
        while self.check(TokenKind::Line) {
            self.advance();
        }
    }

    fn error_expected(&self, expected: &str) -> ParseError {
        let current = self.peek();
        let found = match current.kind {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Line => "a newline".to_string(),
            _ => format!("{} '{}'", current.kind.describe(), current.text),
        };
        ParseError {
            span: current.span,
            message: format!("expected {}, found {}", expected, found),
        }
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<&Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_expected(expected))
        }
    }

    /// Statements are newline-terminated; the last one may end at Eof.
    fn end_of_stmt(&mut self) -> Result<(), ParseError> {
        if self.check(TokenKind::Line) {
            self.advance();
            Ok(())
        } else if self.is_at_end() {
            Ok(())
        } else {
            Err(self.error_expected("newline"))
        }
    }

    pub fn parse(mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();

        self.skip_lines();
        while !self.is_at_end() {
            body.push(self.statement()?);
            self.skip_lines();
        }

        Ok(Program { body })
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        let span = self.peek().span;
        let kind = self.peek().kind.clone();

        match kind {
            // An identifier directly followed by '=' is an assignment;
            // any other identifier starts a bare function call.
            TokenKind::Identifier => {
                if self.peek_next().kind == TokenKind::Assign {
                    let name = self.advance().text.clone();
                    self.advance(); // consume '='
                    let value = self.expression()?;
                    self.end_of_stmt()?;
                    Ok(Stmt {
                        kind: StmtKind::Var { name, value },
                        span,
                    })
                } else {
                    self.bare_call(span)
                }
            }

            TokenKind::If => self.if_stmt(span),

            TokenKind::Loop => {
                self.advance();
                let condition = self.expression()?;
                let body = self.block()?;
                Ok(Stmt {
                    kind: StmtKind::Loop { condition, body },
                    span,
                })
            }

            TokenKind::For => {
                self.advance();
                let varname = self
                    .consume(TokenKind::Identifier, "loop variable name")?
                    .text
                    .clone();
                let amount = self.expression()?;
                let body = self.block()?;
                Ok(Stmt {
                    kind: StmtKind::For {
                        varname,
                        amount,
                        body,
                    },
                    span,
                })
            }

            TokenKind::Fn => self.fn_stmt(span),

            _ => {
                let expr = self.expression()?;
                self.end_of_stmt()?;
                Ok(Stmt {
                    kind: StmtKind::Expr(expr),
                    span,
                })
            }
        }
    }

    fn if_stmt(&mut self, span: Span) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'if'
        let condition = self.expression()?;
        let body = self.block()?;

        let alternate = if self.check(TokenKind::Else) {
            self.advance();
            if self.check(TokenKind::If) {
                // else-if chains nest as a single-statement alternate
                let nested_span = self.peek().span;
                Some(vec![self.if_stmt(nested_span)?])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };

        Ok(Stmt {
            kind: StmtKind::If {
                condition,
                body,
                alternate,
            },
            span,
        })
    }

    fn fn_stmt(&mut self, span: Span) -> Result<Stmt, ParseError> {
        self.advance(); // consume 'fn'
        let name = self
            .consume(TokenKind::Identifier, "function name")?
            .text
            .clone();

        self.consume(TokenKind::LeftParen, "'('")?;
        let mut params: Vec<Rc<str>> = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let param = self.consume(TokenKind::Identifier, "parameter name")?;
                params.push(Rc::from(param.text.as_str()));
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "')'")?;

        let body: Rc<[Stmt]> = self.block()?.into();

        Ok(Stmt {
            kind: StmtKind::Func { name, params, body },
            span,
        })
    }

    /// Newline-terminated call at statement position: `forward 100, 50`.
    fn bare_call(&mut self, span: Span) -> Result<Stmt, ParseError> {
        let name = self.advance().text.clone();
        let mut args = Vec::new();

        if !self.check(TokenKind::Line) && !self.is_at_end() {
            loop {
                args.push(self.expression()?);
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.end_of_stmt()?;

        Ok(Stmt {
            kind: StmtKind::Expr(Expr {
                kind: ExprKind::Call { name, args },
                span,
            }),
            span,
        })
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.consume(TokenKind::Do, "'do'")?;
        self.end_of_stmt()?;

        let mut body = Vec::new();
        self.skip_lines();
        while !self.check(TokenKind::End) && !self.is_at_end() {
            body.push(self.statement()?);
            self.skip_lines();
        }

        self.consume(TokenKind::End, "'end'")?;
        self.end_of_stmt()?;

        Ok(body)
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.conditional()
    }

    /// `&` and `|` share the loosest precedence level.
    fn conditional(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.logical()?;

        while self.match_any(&[TokenKind::Pipe, TokenKind::Amp]) {
            let token = self.previous();
            let span = token.span;
            let op = match token.kind {
                TokenKind::Pipe => LogicalOp::Or,
                _ => LogicalOp::And,
            };
            let right = self.logical()?;
            left = Expr {
                kind: ExprKind::Logical {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            };
        }

        Ok(left)
    }

    fn logical(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.additive()?;

        while self.match_any(&[
            TokenKind::Equal,
            TokenKind::NotEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
        ]) {
            let token = self.previous();
            let span = token.span;
            let op = match token.kind {
                TokenKind::Equal => LogicalOp::Equal,
                TokenKind::NotEqual => LogicalOp::NotEqual,
                TokenKind::Less => LogicalOp::Less,
                TokenKind::LessEqual => LogicalOp::LessEqual,
                TokenKind::Greater => LogicalOp::Greater,
                _ => LogicalOp::GreaterEqual,
            };
            let right = self.additive()?;
            left = Expr {
                kind: ExprKind::Logical {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            };
        }

        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.multiplicative()?;

        while self.match_any(&[TokenKind::Plus, TokenKind::Minus]) {
            let token = self.previous();
            let span = token.span;
            let op = match token.kind {
                TokenKind::Plus => BinaryOp::Add,
                _ => BinaryOp::Sub,
            };
            let right = self.multiplicative()?;
            left = Expr {
                kind: ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            };
        }

        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.primary()?;

        while self.match_any(&[TokenKind::Star, TokenKind::Slash, TokenKind::Percent]) {
            let token = self.previous();
            let span = token.span;
            let op = match token.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => BinaryOp::Rem,
            };
            let right = self.primary()?;
            left = Expr {
                kind: ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            };
        }

        Ok(left)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        let span = token.span;

        match token.kind {
            TokenKind::Num(value) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Num(value),
                    span,
                })
            }
            TokenKind::Str(value) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Str(Rc::from(value.as_str())),
                    span,
                })
            }
            TokenKind::Bool(value) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Bool(value),
                    span,
                })
            }
            TokenKind::Identifier => {
                let name = self.advance().text.clone();
                Ok(Expr {
                    kind: ExprKind::Identifier(name),
                    span,
                })
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LeftBracket => self.bracket_call(span),
            TokenKind::Eof => Err(ParseError {
                span,
                message: "unexpected end of input in expression".to_string(),
            }),
            _ => Err(self.error_expected("an expression")),
        }
    }

    /// Expression-position call: `[name a, b]`, usable inside larger
    /// expressions. An empty argument list is allowed for zero-arity
    /// functions like `[xcor]`.
    fn bracket_call(&mut self, span: Span) -> Result<Expr, ParseError> {
        self.advance(); // consume '['
        let name = self
            .consume(TokenKind::Identifier, "function name")?
            .text
            .clone();

        let mut args = Vec::new();
        if !self.check(TokenKind::RightBracket) {
            loop {
                args.push(self.expression()?);
                if self.check(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightBracket, "']'")?;

        Ok(Expr {
            kind: ExprKind::Call { name, args },
            span,
        })
    }
}
