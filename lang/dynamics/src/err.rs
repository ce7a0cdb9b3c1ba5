use crate::syntax::{Value, VarName};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum EvalError {
    #[error("unbound variable `{0}`")]
    Unbound(VarName),
    #[error("{op}: expected {expected}, found {found}")]
    TypeMismatch { op: String, expected: &'static str, found: &'static str },
    #[error("{func}: expected {expected} arguments, got {found}")]
    Arity { func: String, expected: usize, found: usize },
    #[error("{func}: unexpected keyword argument `:{keyword}`")]
    UnexpectedKeyword { func: String, keyword: VarName },
    #[error("{func}: missing argument `{param}`")]
    MissingArgument { func: String, param: VarName },
    #[error("a {0} is not callable")]
    NotCallable(&'static str),
    #[error("promise forced while it was already being forced")]
    RecursiveForce,
    #[error("continuation invoked after an error left the activation that captured it")]
    ContinuationInvalidated,
    #[error("continuation expects {expected} values, got {found}")]
    ContinuationArity { expected: usize, found: usize },
    #[error("escape continuation invoked outside of its extent")]
    EscapeOutsideExtent,
    /// unwinding towards the `call-ec` point with the same tag
    #[error("escape to a `call-ec` point that is no longer running")]
    Escape { tag: usize, value: Value },
    #[error("jump record consumed twice")]
    JumpConsumed,
    #[error("a {0} cannot be used as a memoization key")]
    Unhashable(&'static str),
    #[error("division by zero")]
    DivisionByZero,
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("assertion failed: {left} != {right}")]
    AssertionFailed { left: String, right: String },
    #[error("{0}")]
    Raised(String),
    #[error("{0}")]
    Unsupported(&'static str),
    #[error("output error: {0}")]
    Output(String),
}

impl EvalError {
    /// Errors that unwind on purpose; they leave continuations valid.
    pub fn is_escape(&self) -> bool {
        matches!(self, EvalError::Escape { .. })
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
