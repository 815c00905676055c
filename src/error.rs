//! Error types for Bamboo
//!
//! Parse failures are structured diagnostics with source locations. Runtime
//! failures are ordinary `Value::Error` values; `RuntimeError` only owns
//! their wording.

use crate::token::{Span, TokenKind};
use crate::value::ValueType;
use std::fmt;
use thiserror::Error;

/// Parse error kinds
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("expected next token to be {expected}, got {got} instead")]
    ExpectedToken { expected: TokenKind, got: TokenKind },

    #[error("no prefix parse function for {0} found")]
    NoPrefixParseFn(TokenKind),

    #[error("could not parse {0:?} as integer")]
    InvalidInteger(String),
}

/// A parse diagnostic with location information
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub source_line: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            source_line: None,
        }
    }

    /// The bare human-readable message, without location
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn with_source(mut self, source: &str) -> Self {
        if self.span.line > 0 {
            self.source_line = source.lines().nth(self.span.line - 1).map(str::to_string);
        }
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}:{}] Error: {}", self.span.line, self.span.column, self.kind)?;

        if let Some(ref line) = self.source_line {
            write!(f, "\n  | {}", line)?;
            write!(f, "\n  | {}^", " ".repeat(self.span.column.saturating_sub(1)))?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Every diagnostic collected while parsing one program, in detection order
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} parse error(s)", .0.len())]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ParseError::message).collect()
    }

    pub fn with_source(self, source: &str) -> Self {
        Self(self.0.into_iter().map(|e| e.with_source(source)).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.0.iter()
    }
}

/// Runtime error messages carried by `Value::Error`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("type mismatch: {0} {1} {2}")]
    TypeMismatch(ValueType, String, ValueType),

    #[error("unknown operator: {0} {1} {2}")]
    UnknownInfixOperator(ValueType, String, ValueType),

    #[error("unknown operator: {0}{1}")]
    UnknownPrefixOperator(String, ValueType),

    #[error("identifier not found: {0}")]
    IdentifierNotFound(String),

    #[error("not a function: {0}")]
    NotCallable(ValueType),

    #[error("unusable as hash key: {0}")]
    UnusableHashKey(ValueType),

    #[error("index operator not supported: {0}")]
    IndexNotSupported(ValueType),

    #[error("stack overflow")]
    StackOverflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("wrong number of arguments. got={got}, want={want}")]
    WrongArity { got: usize, want: String },

    #[error("argument to `{builtin}` not supported, got {got}")]
    UnsupportedArgument { builtin: &'static str, got: ValueType },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_error_messages() {
        let err = ParseError::new(
            ParseErrorKind::ExpectedToken { expected: TokenKind::RightParen, got: TokenKind::Eof },
            Span::new(4, 4, 1, 5),
        );
        assert_eq!(err.message(), "expected next token to be ), got EOF instead");
        assert_eq!(err.to_string(), "[line 1:5] Error: expected next token to be ), got EOF instead");

        let err = ParseErrorKind::InvalidInteger("99999999999999999999".into());
        assert_eq!(err.to_string(), "could not parse \"99999999999999999999\" as integer");
    }

    #[test]
    fn test_with_source_points_at_column() {
        let err = ParseError::new(ParseErrorKind::NoPrefixParseFn(TokenKind::Illegal), Span::new(6, 7, 2, 3))
            .with_source("let a = 1;\nx @ y");
        assert_eq!(
            err.to_string(),
            "[line 2:3] Error: no prefix parse function for ILLEGAL found\n  | x @ y\n  |   ^"
        );
    }

    #[test]
    fn test_runtime_messages() {
        let err = RuntimeError::TypeMismatch(ValueType::Integer, "+".into(), ValueType::String);
        assert_eq!(err.to_string(), "type mismatch: INTEGER + STRING");
        let err = RuntimeError::UnknownPrefixOperator("-".into(), ValueType::Boolean);
        assert_eq!(err.to_string(), "unknown operator: -BOOLEAN");
        let err = RuntimeError::WrongArity { got: 2, want: "1".into() };
        assert_eq!(err.to_string(), "wrong number of arguments. got=2, want=1");
    }
}
