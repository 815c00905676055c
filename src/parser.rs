//! Parser for Bamboo
//!
//! Top-down operator precedence (Pratt) parser. Each token kind may have a
//! prefix handler, an infix handler, or both; `parse_expression` climbs
//! precedence levels by folding infix handlers onto the left operand.
//!
//! Parsing never stops at the first problem. Diagnostics are collected,
//! the failed statement is dropped and the parser resumes at the next
//! statement boundary.

use std::rc::Rc;

use crate::ast::{Block, Expr, FunctionLiteral, Identifier, InfixOp, PrefixOp, Program, Stmt};
use crate::error::{ParseError, ParseErrorKind, ParseErrors};
use crate::lexer::Lexer;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenKind};

/// Binding power of operators, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Equals,      // == !=
    LessGreater, // < >
    Sum,         // + -
    Product,     // * /
    Prefix,      // -x !x
    Call,        // f(x)
    Index,       // a[i]
}

impl Precedence {
    pub fn of(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
            TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Asterisk | TokenKind::Slash => Precedence::Product,
            TokenKind::LeftParen => Precedence::Call,
            TokenKind::LeftBracket => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }
}

type PrefixParseFn<'a> = fn(&mut Parser<'a>) -> Option<Expr>;
type InfixParseFn<'a> = fn(&mut Parser<'a>, Expr) -> Option<Expr>;

/// The parser state
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur: Token,
    peek: Token,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    /// Create a new parser pulling tokens from `lexer`
    pub fn new(mut lexer: Lexer<'a>) -> Self {
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            cur,
            peek,
            errors: Vec::new(),
        }
    }

    pub fn from_source(source: &'a str) -> Self {
        Self::new(Lexer::new(source))
    }

    /// Diagnostics collected so far, in the order they were detected
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Parse a whole program and fail if any diagnostic was raised
    pub fn parse(&mut self) -> Result<Program, ParseErrors> {
        let program = self.parse_program();
        if self.errors.is_empty() {
            Ok(program)
        } else {
            tracing::warn!(count = self.errors.len(), "parse failed");
            Err(ParseErrors(self.errors.clone()))
        }
    }

    /// Parse every statement up to end of input. The returned program may
    /// be partial when `errors()` is non-empty.
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();

        while !self.cur_is(TokenKind::Eof) {
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize(),
            }
            self.next_token();
        }

        Program::new(statements)
    }

    // ==================== Statements ====================

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Ident if self.peek_is(TokenKind::Assign) => self.parse_assign_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Stmt> {
        self.expect_peek(TokenKind::Ident)?;
        let name = Identifier::new(self.cur.literal.clone());

        self.expect_peek(TokenKind::Assign)?;
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolons();

        Some(Stmt::Let { name, value })
    }

    fn parse_assign_statement(&mut self) -> Option<Stmt> {
        let name = Identifier::new(self.cur.literal.clone());
        self.next_token(); // consume name, cur is '='
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolons();

        Some(Stmt::Assign { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        self.next_token(); // consume 'return'

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolons();

        Some(Stmt::Return { value })
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
        Some(Stmt::Expr { expr })
    }

    /// Parse `{ stmt* }` with the current token on the opening brace.
    /// Leaves the current token on the closing brace.
    fn parse_block(&mut self) -> Block {
        let mut statements = Vec::new();
        self.next_token();

        while !self.cur_is(TokenKind::RightBrace) && !self.cur_is(TokenKind::Eof) {
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => {
                    self.synchronize();
                    if self.cur_is(TokenKind::RightBrace) {
                        break;
                    }
                }
            }
            self.next_token();
        }

        if self.cur_is(TokenKind::Eof) {
            self.push_error(
                ParseErrorKind::ExpectedToken { expected: TokenKind::RightBrace, got: TokenKind::Eof },
                self.cur.span,
            );
        }

        Block::new(statements)
    }

    // ==================== Expressions ====================

    /// Parse an expression whose operators all bind tighter than `precedence`
    pub fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        ensure_sufficient_stack(|| self.parse_pratt(precedence))
    }

    fn parse_pratt(&mut self, precedence: Precedence) -> Option<Expr> {
        let Some(prefix) = Self::prefix_parse_fn(self.cur.kind) else {
            self.push_error(ParseErrorKind::NoPrefixParseFn(self.cur.kind), self.cur.span);
            return None;
        };
        let mut left = prefix(self)?;

        while !self.peek_is(TokenKind::Semicolon) && precedence < self.peek_precedence() {
            let Some(infix) = Self::infix_parse_fn(self.peek.kind) else {
                return Some(left);
            };
            self.next_token();
            left = infix(self, left)?;
        }

        Some(left)
    }

    fn prefix_parse_fn(kind: TokenKind) -> Option<PrefixParseFn<'a>> {
        let f: PrefixParseFn<'a> = match kind {
            TokenKind::Ident => Self::parse_identifier,
            TokenKind::Int => Self::parse_integer_literal,
            TokenKind::String => Self::parse_string_literal,
            TokenKind::True | TokenKind::False => Self::parse_boolean,
            TokenKind::Bang | TokenKind::Minus => Self::parse_prefix_expression,
            TokenKind::LeftParen => Self::parse_grouped_expression,
            TokenKind::If => Self::parse_if_expression,
            TokenKind::While => Self::parse_while_expression,
            TokenKind::Function => Self::parse_function_literal,
            TokenKind::LeftBracket => Self::parse_array_literal,
            TokenKind::LeftBrace => Self::parse_hash_literal,
            _ => return None,
        };
        Some(f)
    }

    fn infix_parse_fn(kind: TokenKind) -> Option<InfixParseFn<'a>> {
        let f: InfixParseFn<'a> = match kind {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Asterisk
            | TokenKind::Slash
            | TokenKind::Eq
            | TokenKind::NotEq
            | TokenKind::Lt
            | TokenKind::Gt => Self::parse_infix_expression,
            TokenKind::LeftParen => Self::parse_call_expression,
            TokenKind::LeftBracket => Self::parse_index_expression,
            _ => return None,
        };
        Some(f)
    }

    fn parse_identifier(&mut self) -> Option<Expr> {
        Some(Expr::Ident(Identifier::new(self.cur.literal.clone())))
    }

    fn parse_integer_literal(&mut self) -> Option<Expr> {
        match self.cur.literal.parse::<i64>() {
            Ok(value) => Some(Expr::Integer(value)),
            Err(_) => {
                self.push_error(ParseErrorKind::InvalidInteger(self.cur.literal.clone()), self.cur.span);
                None
            }
        }
    }

    fn parse_string_literal(&mut self) -> Option<Expr> {
        Some(Expr::String(self.cur.literal.clone()))
    }

    fn parse_boolean(&mut self) -> Option<Expr> {
        Some(Expr::Bool(self.cur_is(TokenKind::True)))
    }

    fn parse_prefix_expression(&mut self) -> Option<Expr> {
        let op = match self.cur.kind {
            TokenKind::Bang => PrefixOp::Not,
            _ => PrefixOp::Neg,
        };
        self.next_token();

        let operand = self.parse_expression(Precedence::Prefix)?;
        Some(Expr::Prefix { op, operand: Box::new(operand) })
    }

    fn parse_infix_expression(&mut self, left: Expr) -> Option<Expr> {
        let op = match self.cur.kind {
            TokenKind::Plus => InfixOp::Add,
            TokenKind::Minus => InfixOp::Sub,
            TokenKind::Asterisk => InfixOp::Mul,
            TokenKind::Slash => InfixOp::Div,
            TokenKind::Eq => InfixOp::Eq,
            TokenKind::NotEq => InfixOp::NotEq,
            TokenKind::Lt => InfixOp::Lt,
            _ => InfixOp::Gt,
        };
        // Recursing with our own precedence keeps equal-precedence
        // operators left-associative.
        let precedence = self.cur_precedence();
        self.next_token();

        let right = self.parse_expression(precedence)?;
        Some(Expr::Infix {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParen)?;
        Some(expr)
    }

    fn parse_if_expression(&mut self) -> Option<Expr> {
        self.expect_peek(TokenKind::LeftParen)?;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParen)?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let consequence = self.parse_block();

        let alternative = if self.peek_is(TokenKind::Else) {
            self.next_token();
            self.expect_peek(TokenKind::LeftBrace)?;
            Some(self.parse_block())
        } else {
            None
        };

        Some(Expr::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_while_expression(&mut self) -> Option<Expr> {
        self.expect_peek(TokenKind::LeftParen)?;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParen)?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let body = self.parse_block();

        Some(Expr::While {
            condition: Box::new(condition),
            body,
        })
    }

    fn parse_function_literal(&mut self) -> Option<Expr> {
        self.expect_peek(TokenKind::LeftParen)?;
        let params = self.parse_function_parameters()?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let body = self.parse_block();

        Some(Expr::Function(Rc::new(FunctionLiteral { params, body })))
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<Identifier>> {
        let mut params = Vec::new();

        if self.peek_is(TokenKind::RightParen) {
            self.next_token();
            return Some(params);
        }

        loop {
            self.expect_peek(TokenKind::Ident)?;
            params.push(Identifier::new(self.cur.literal.clone()));
            if !self.peek_is(TokenKind::Comma) {
                break;
            }
            self.next_token();
        }

        self.expect_peek(TokenKind::RightParen)?;
        Some(params)
    }

    fn parse_call_expression(&mut self, callee: Expr) -> Option<Expr> {
        let args = self.parse_expression_list(TokenKind::RightParen)?;
        Some(Expr::Call {
            callee: Box::new(callee),
            args,
        })
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        let elements = self.parse_expression_list(TokenKind::RightBracket)?;
        Some(Expr::Array(elements))
    }

    /// Comma-separated expressions closed by `end`, current token on the opener
    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut list = Vec::new();

        if self.peek_is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;
        Some(list)
    }

    fn parse_index_expression(&mut self, collection: Expr) -> Option<Expr> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightBracket)?;

        Some(Expr::Index {
            collection: Box::new(collection),
            index: Box::new(index),
        })
    }

    fn parse_hash_literal(&mut self) -> Option<Expr> {
        let mut pairs = Vec::new();

        while !self.peek_is(TokenKind::RightBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;

            self.expect_peek(TokenKind::Colon)?;
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if !self.peek_is(TokenKind::RightBrace) {
                self.expect_peek(TokenKind::Comma)?;
            }
        }

        self.expect_peek(TokenKind::RightBrace)?;
        Some(Expr::Hash(pairs))
    }

    // ==================== Helpers ====================

    fn next_token(&mut self) {
        let next = self.lexer.next_token();
        self.cur = std::mem::replace(&mut self.peek, next);
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur.is(kind)
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.is(kind)
    }

    fn cur_precedence(&self) -> Precedence {
        Precedence::of(self.cur.kind)
    }

    fn peek_precedence(&self) -> Precedence {
        Precedence::of(self.peek.kind)
    }

    /// Advance if the next token is `kind`, otherwise record a diagnostic
    fn expect_peek(&mut self, kind: TokenKind) -> Option<()> {
        if self.peek_is(kind) {
            self.next_token();
            Some(())
        } else {
            self.push_error(
                ParseErrorKind::ExpectedToken { expected: kind, got: self.peek.kind },
                self.peek.span,
            );
            None
        }
    }

    fn skip_semicolons(&mut self) {
        while self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
    }

    /// Skip the remains of a failed statement. Stops on a `;`, or just
    /// before a closing brace or end of input, so the caller's loop can
    /// resume with the following statement.
    fn synchronize(&mut self) {
        while !matches!(self.cur.kind, TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof)
            && !matches!(self.peek.kind, TokenKind::RightBrace | TokenKind::Eof)
        {
            self.next_token();
        }
    }

    fn push_error(&mut self, kind: ParseErrorKind, span: crate::token::Span) {
        tracing::debug!(line = span.line, column = span.column, error = %kind, "parse error");
        self.errors.push(ParseError::new(kind, span));
    }
}
