use crate::err::*;
use bounce_statics::{DecoratorKind, DecoratorRegistry, StaticsError};
use bounce_syntax::VarName;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Contents of a `bounce.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Conf {
    /// names whose calls the analyzer treats as escapes
    pub escape_names: Vec<String>,
    pub warn_unconsumed_jumps: bool,
    /// position overrides, by decorator name
    pub decorators: BTreeMap<String, u32>,
}

impl Default for Conf {
    fn default() -> Self {
        Conf {
            escape_names: vec!["ec".to_string(), "brk".to_string()],
            warn_unconsumed_jumps: true,
            decorators: BTreeMap::new(),
        }
    }
}

impl Conf {
    pub const FILE: &'static str = "bounce.toml";

    pub fn parse(text: &str, path: impl Into<PathBuf>) -> Result<Self> {
        toml::from_str(text).map_err(|err| DriverError::Conf(path.into(), err))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|err| DriverError::Io(path.to_path_buf(), err))?;
        log::debug!("loaded configuration from `{}`", path.display());
        Self::parse(&text, path)
    }

    /// An explicit path, else `./bounce.toml` when present, else the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = Path::new(Self::FILE);
        if local.exists() {
            return Self::load(local);
        }
        log::warn!("no `{}` found; using the default configuration", Self::FILE);
        Ok(Self::default())
    }

    pub fn escapes(&self) -> Vec<VarName> {
        self.escape_names.iter().map(VarName::from).collect()
    }

    /// Every known decorator, at its default position unless overridden.
    pub fn registry(&self) -> Result<DecoratorRegistry> {
        if let Some(name) =
            self.decorators.keys().find(|name| DecoratorKind::from_name(name).is_none())
        {
            Err(StaticsError::UnknownDecorator { name: name.clone() })?
        }
        let mut registry = DecoratorRegistry::new();
        for kind in DecoratorKind::ALL {
            let position = match self.decorators.get(kind.name()) {
                | Some(position) => *position,
                | None => kind.default_position(),
            };
            registry.register(kind, position)?;
        }
        registry.validate()?;
        Ok(registry)
    }
}
