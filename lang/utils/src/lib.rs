#![allow(clippy::style)]
#![allow(clippy::useless_format)]

pub mod arena;
pub mod span;

pub mod prelude {
    /// Source code location.
    pub use crate::span::{Cursor2, FileInfo, Sp, Span};
    /// Data structures.
    pub use crate::arena::*;
}
