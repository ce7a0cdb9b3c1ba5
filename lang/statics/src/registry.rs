//! The process-wide table that decides how control-flow wrappers nest.
//!
//! Each [`DecoratorKind`] is registered with a position; lower positions are
//! applied further out. [`DecoratorRegistry::order_for`] turns any set of kinds
//! into the single nesting order, outermost first.

use crate::err::*;
use bounce_syntax::DecoratorName;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use std::fmt;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum DecoratorKind {
    Memoize,
    Trampolined,
    Looped,
    CallEc,
    Continuations,
    Lazy,
}

impl DecoratorKind {
    pub const ALL: [DecoratorKind; 6] = [
        DecoratorKind::Memoize,
        DecoratorKind::Trampolined,
        DecoratorKind::Looped,
        DecoratorKind::CallEc,
        DecoratorKind::Continuations,
        DecoratorKind::Lazy,
    ];

    /// The name used after `:decorators` and in `bounce.toml`.
    pub fn name(&self) -> &'static str {
        match self {
            | DecoratorKind::Memoize => "memoize",
            | DecoratorKind::Trampolined => "trampolined",
            | DecoratorKind::Looped => "looped",
            | DecoratorKind::CallEc => "call-ec",
            | DecoratorKind::Continuations => "continuations",
            | DecoratorKind::Lazy => "lazy",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn default_position(&self) -> u32 {
        match self {
            | DecoratorKind::Memoize => 10,
            | DecoratorKind::Trampolined => 20,
            | DecoratorKind::Looped => 30,
            | DecoratorKind::CallEc => 40,
            | DecoratorKind::Continuations => 50,
            | DecoratorKind::Lazy => 60,
        }
    }
}

impl fmt::Display for DecoratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoratorRecord {
    pub kind: DecoratorKind,
    pub position: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecoratorRegistry {
    records: IndexMap<DecoratorKind, DecoratorRecord>,
}

static REGISTRY: OnceCell<DecoratorRegistry> = OnceCell::new();

impl DecoratorRegistry {
    /// An empty registry; every kind has to be registered explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in DecoratorKind::ALL {
            let record = DecoratorRecord { kind, position: kind.default_position() };
            registry.records.insert(kind, record);
        }
        registry
    }

    pub fn register(&mut self, kind: DecoratorKind, position: u32) -> Result<()> {
        if self.records.contains_key(&kind) {
            Err(StaticsError::DuplicateRegistration(kind))?
        }
        if let Some(other) = self.records.values().find(|record| record.position == position) {
            Err(StaticsError::ConflictingPosition { kind, other: other.kind, position })?
        }
        log::trace!("registered decorator `{}` at {}", kind, position);
        self.records.insert(kind, DecoratorRecord { kind, position });
        Ok(())
    }

    pub fn record(&self, kind: DecoratorKind) -> Option<&DecoratorRecord> {
        self.records.get(&kind)
    }

    pub fn records(&self) -> impl Iterator<Item = &DecoratorRecord> {
        self.records.values()
    }

    /// Resolve a decorator written in source.
    pub fn lookup(&self, name: &DecoratorName) -> Result<DecoratorKind> {
        match DecoratorKind::from_name(name.plain()) {
            | Some(kind) if self.records.contains_key(&kind) => Ok(kind),
            | _ => Err(StaticsError::UnknownDecorator { name: name.plain().to_string() }),
        }
    }

    /// The nesting order of `kinds`, outermost first. Duplicates collapse.
    pub fn order_for(
        &self, kinds: impl IntoIterator<Item = DecoratorKind>,
    ) -> Result<Vec<DecoratorKind>> {
        let mut ordered = Vec::new();
        for kind in kinds {
            let record = self.record(kind).ok_or(StaticsError::UnregisteredKind(kind))?;
            if !ordered.iter().any(|other: &DecoratorRecord| other.kind == kind) {
                ordered.push(*record);
            }
        }
        ordered.sort_by_key(|record| record.position);
        Ok(ordered.into_iter().map(|record| record.kind).collect())
    }

    /// Checks the orderings the runtime relies on.
    pub fn validate(&self) -> Result<()> {
        let trampolined = self.record(DecoratorKind::Trampolined);
        let call_ec = self.record(DecoratorKind::CallEc);
        if let (Some(trampolined), Some(call_ec)) = (trampolined, call_ec) {
            if trampolined.position >= call_ec.position {
                Err(StaticsError::EscapeOutsideTrampoline {
                    trampolined: trampolined.position,
                    call_ec: call_ec.position,
                })?
            }
        }
        Ok(())
    }

    /// Make this registry the process-wide one. The first installation (or
    /// first read through [`DecoratorRegistry::global`]) wins; installing an
    /// equal table again hands back the installed one, a different table is
    /// an error.
    pub fn install(self) -> Result<&'static DecoratorRegistry> {
        self.validate()?;
        let global = REGISTRY.get_or_init(|| {
            log::debug!("installed decorator registry");
            self.clone()
        });
        if *global == self { Ok(global) } else { Err(StaticsError::RegistryInstalled) }
    }

    pub fn global() -> &'static DecoratorRegistry {
        REGISTRY.get_or_init(DecoratorRegistry::with_defaults)
    }
}
