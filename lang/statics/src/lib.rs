//! Static passes of bounce: everything that happens between parsing and
//! running a program.

/// Tail-position analysis of function bodies.
pub mod analyzer;
pub use analyzer::{analyze, TailKind, TailPosition, TailPositions};
/// The decorator ordering registry.
pub mod registry;
pub use registry::{DecoratorKind, DecoratorRecord, DecoratorRegistry};
/// Tail-call and continuation-passing rewrites, plus decoration.
pub mod transform;
pub use transform::{transform, Transformed, Transformer, CC};

pub mod err;
pub use err::*;

#[cfg(test)]
mod tests;
