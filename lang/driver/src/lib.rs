//! Runs bounce programs end to end: configuration, parsing, transformation
//! and evaluation.

pub mod conf;
pub mod err;


pub use conf::Conf;
pub use err::*;

use bounce_dynamics::{diagnostics, Runtime, Value};
use bounce_statics::{DecoratorRegistry, Transformed};
use bounce_syntax::{Formatter, Ugly, VarName};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub struct Driver {
    /// configuration
    pub conf: Conf,
    /// the process-wide registry every transformation consults
    registry: &'static DecoratorRegistry,
    escapes: Vec<VarName>,
}

impl Driver {
    /// Installs the configured decorator table process-wide; a driver whose
    /// table disagrees with the installed one is rejected.
    pub fn new(conf: Conf) -> Result<Self> {
        let registry = conf.registry()?.install()?;
        let escapes = conf.escapes();
        diagnostics::set_warn_unconsumed(conf.warn_unconsumed_jumps);
        Ok(Driver { conf, registry, escapes })
    }

    /// A driver configured from [`Conf::discover`].
    pub fn discover(conf: Option<&Path>) -> Result<Self> {
        Self::new(Conf::discover(conf)?)
    }

    pub fn registry(&self) -> &'static DecoratorRegistry {
        self.registry
    }

    /// Parse and transform without running anything.
    pub fn check_source(&self, source: &str, path: Option<PathBuf>) -> Result<Transformed> {
        let program = bounce_surface::parse(source, path)?;
        let transformed = bounce_statics::transform(program, self.registry, &self.escapes)?;
        log::debug!(
            "transformed {} toplevel forms, {} functions",
            transformed.program.top.len(),
            transformed.program.fns.len()
        );
        Ok(transformed)
    }

    pub fn run_source(
        &self, source: &str, path: Option<PathBuf>, output: Box<dyn Write>,
    ) -> Result<Value> {
        let transformed = self.check_source(source, path)?;
        let mut runtime = Runtime::new(transformed, output);
        Ok(runtime.run()?)
    }

    pub fn check_file(&self, path: &Path) -> Result<Transformed> {
        let source = read(path)?;
        self.check_source(&source, Some(path.to_path_buf()))
    }

    pub fn run_file(&self, path: &Path, output: Box<dyn Write>) -> Result<Value> {
        log::info!("running `{}`", path.display());
        let source = read(path)?;
        self.run_source(&source, Some(path.to_path_buf()), output)
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| DriverError::Io(path.to_path_buf(), err))
}

/// The transformed program as source text, followed by the wrappers each
/// decorated function ends up with. `width` selects the pretty layout; without
/// it every toplevel form takes one line.
pub fn dump(transformed: &Transformed, width: Option<usize>) -> String {
    let program = &transformed.program;
    let f = Formatter::new(program);
    let mut s = match width {
        | Some(width) => f.render(width) + "\n",
        | None => program.top.iter().map(|top| top.ugly(&f) + "\n").collect(),
    };
    for (id, def) in program.functions() {
        let kinds = transformed.decorations_of(&id);
        if kinds.is_empty() {
            continue;
        }
        let name = match &def.name {
            | Some(name) => name.plain().to_string(),
            | None => format!("fn {}", id.concise()),
        };
        let kinds: Vec<_> = kinds.iter().map(|kind| kind.name()).collect();
        s += &format!("; {}: {}\n", name, kinds.join(" "));
    }
    s
}
