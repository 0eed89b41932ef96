use thiserror::Error;

use crate::parser::ParseError;

/// Everything that can go wrong while evaluating a script.
///
/// Absent properties and NaN arithmetic are values, not errors; they never
/// show up here.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("runtime error: {0}")]
    Runtime(String),

    /// Explicit binding to something that cannot act as a context (a number, a string...).
    #[error("invalid binding target: cannot use a {0} as a context")]
    InvalidBindingTarget(&'static str),

    #[error("{0} is not a function")]
    NotCallable(String),

    #[error("{0} is not defined")]
    UnknownName(String),

    /// Strict mode: the context is absent and the body touched one of its properties.
    #[error("cannot access property '{key}' of an absent context")]
    AbsentContext { key: String },
}

impl From<ParseError> for EvalError {
    fn from(e: ParseError) -> Self {
        EvalError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
