use std::fmt::Display;

use itertools::Itertools;
use scanner::{Line, ScanError, Token, TokenKind};

/// A static error found before anything is executed.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[error("[line {line}] Error{location}: {message}")]
pub struct LoxError {
    pub line: Line,
    pub location: String,
    pub message: String,
}

impl LoxError {
    pub fn at_token(token: &Token, message: impl Into<String>) -> Self {
        let location = match token.kind {
            TokenKind::Eof => " at end".to_string(),
            _ => format!(" at '{}'", token.lexeme()),
        };
        Self { line: token.line(), location, message: message.into() }
    }
}

impl From<ScanError> for LoxError {
    fn from(e: ScanError) -> Self {
        Self { line: e.line(), location: String::new(), message: e.to_string() }
    }
}

#[derive(thiserror::Error, Debug, Default, PartialEq, derive_more::Deref, derive_more::DerefMut)]
pub struct LoxErrors(pub Vec<LoxError>);

impl From<LoxError> for LoxErrors {
    fn from(e: LoxError) -> Self {
        Self(vec![e])
    }
}

impl From<Vec<ScanError>> for LoxErrors {
    fn from(errors: Vec<ScanError>) -> Self {
        Self(errors.into_iter().map(LoxError::from).collect())
    }
}

impl Display for LoxErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join("\n"))
    }
}

pub type Result<T> = std::result::Result<T, LoxError>;
