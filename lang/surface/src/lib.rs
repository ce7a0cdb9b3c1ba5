//! Reading `.bnc` source text into the syntax arena.

pub mod textual {
    /// Logos-based lexer and token definitions.
    pub mod lexer;
    pub use lexer::*;
    /// S-expression reader over the token stream.
    pub mod reader;
    pub use reader::*;
    /// Literal escape expansion helpers.
    pub mod escape;
}

/// Elaboration of s-expressions into `bounce_syntax::Program`.
pub mod elab;
pub use elab::Elaborator;

pub mod err;
pub use err::*;


use bounce_syntax::Program;
use bounce_utils::span::FileInfo;
use std::{path::PathBuf, rc::Rc};

/// Parse a whole program.
pub fn parse(source: &str, path: Option<PathBuf>) -> Result<Program> {
    let info = FileInfo::new(source, path.map(Rc::new));
    let forms = textual::Reader::new(source, &info).read_all()?;
    log::trace!("read {} toplevel forms from `{}`", forms.len(), info.path().display());
    Elaborator::new(&info).run(forms)
}
