use crate::registry::DecoratorKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StaticsError {
    #[error("unknown decorator `{name}`")]
    UnknownDecorator { name: String },
    #[error("decorator `{0}` is not registered")]
    UnregisteredKind(DecoratorKind),
    #[error("decorator `{0}` is registered twice")]
    DuplicateRegistration(DecoratorKind),
    #[error("decorators `{kind}` and `{other}` both claim position {position}")]
    ConflictingPosition { kind: DecoratorKind, other: DecoratorKind, position: u32 },
    #[error(
        "`trampolined` (position {trampolined}) must wrap `call-ec` (position {call_ec}) from the outside"
    )]
    EscapeOutsideTrampoline { trampolined: u32, call_ec: u32 },
    #[error("the decorator registry is already installed")]
    RegistryInstalled,
    #[error("misplaced `capture` in {func}: {reason}")]
    CapturePlacement { func: String, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, StaticsError>;
