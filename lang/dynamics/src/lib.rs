//! Runs transformed bounce programs.
//!
//! Tail calls evaluate to jump records which a trampoline runs in constant
//! stack space. Continuations are ordinary callables over the rest of a
//! function body, and call-by-need bodies pass promises around instead of
//! values.

#![allow(clippy::style)]
#![allow(clippy::useless_format)]

pub mod syntax;
pub use syntax::{Callable, Value, Variant};
pub mod jump;
pub use jump::diagnostics;
pub mod promise;
mod apply;
mod trampoline;
pub use trampoline::Step;
pub mod eval;
pub use eval::{Frame, Runtime};
mod builtin;
pub mod fmt;
pub mod err;
pub use err::*;

#[cfg(test)]
mod tests;
