use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{location}: unrecognized token `{text}`")]
    InvalidToken { location: String, text: String },
    #[error("{location}: invalid integer literal `{text}`")]
    InvalidInt { location: String, text: String },
    #[error("{location}: unknown escape `\\{escape}` in string literal")]
    InvalidEscape { location: String, escape: char },
    #[error("{location}: unbalanced `)`")]
    Unbalanced { location: String },
    #[error("{location}: `(` is never closed ({depth} open at end of input)")]
    UnclosedParen { location: String, depth: usize },
    #[error("{location}: malformed `{form}`: {reason}")]
    Malformed { location: String, form: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ParseError>;
