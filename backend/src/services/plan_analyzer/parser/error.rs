//! Error types for plan parsing

use thiserror::Error;

/// The payload itself is unusable (a caller programming error)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Plan input is missing")]
    Missing,

    #[error("Unexpected plan input type: {0}")]
    UnexpectedType(&'static str),
}

/// Resource limits hit while parsing; callers fail closed on these
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Plan has {lines} lines, limit is {limit}")]
    TooManyLines { lines: usize, limit: usize },

    #[error("Plan nesting exceeds depth limit {limit} at line {line}")]
    TooDeep { limit: usize, line: usize },
}

pub type InputResult<T> = Result<T, InputError>;
pub type ParseResult<T> = Result<T, ParseError>;
