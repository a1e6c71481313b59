//! Declarative translation between domain entities and application models.
//!
//! # Responsibility
//! - Register named, directional profiles keyed by `(source, target)` types.
//! - Translate single values and ordered sequences through those profiles.
//!
//! # Invariants
//! - At most one profile per `(source, target)` pair.
//! - Translation is pure and all-or-nothing: a failure yields no output.

pub mod profiles;

use std::any::{type_name, Any, TypeId};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use profiles::{register_default_profiles, APPLICATION_TO_DOMAIN, DOMAIN_TO_APPLICATION};

pub type MapResult<T> = Result<T, MappingError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    ProfileNotFound {
        source: &'static str,
        target: &'static str,
    },
    DuplicateProfile {
        name: &'static str,
        existing: &'static str,
    },
    /// A required target attribute has no source value.
    MissingAttribute {
        profile: &'static str,
        attribute: &'static str,
    },
    /// A source value cannot be represented in the target type.
    IncompatibleAttribute {
        profile: &'static str,
        attribute: &'static str,
        reason: String,
    },
}

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProfileNotFound { source, target } => {
                write!(f, "no mapping profile from `{source}` to `{target}`")
            }
            Self::DuplicateProfile { name, existing } => write!(
                f,
                "profile `{name}` maps the same types as registered profile `{existing}`"
            ),
            Self::MissingAttribute { profile, attribute } => {
                write!(f, "{profile}: required attribute `{attribute}` is missing")
            }
            Self::IncompatibleAttribute {
                profile,
                attribute,
                reason,
            } => write!(f, "{profile}: attribute `{attribute}` is incompatible: {reason}"),
        }
    }
}

impl Error for MappingError {}

/// Translation function of one profile.
pub type Translate<S, T> = fn(&S) -> MapResult<T>;

struct RegisteredProfile {
    name: &'static str,
    translate: Box<dyn Any + Send + Sync>,
}

/// Registry of translation profiles resolved by source/target type pair.
#[derive(Default)]
pub struct Mapper {
    profiles: BTreeMap<(TypeId, TypeId), RegisteredProfile>,
}

impl Mapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the `S -> T` profile named `name`.
    pub fn register<S: 'static, T: 'static>(
        &mut self,
        name: &'static str,
        translate: Translate<S, T>,
    ) -> MapResult<()> {
        let key = (TypeId::of::<S>(), TypeId::of::<T>());
        if let Some(existing) = self.profiles.get(&key) {
            return Err(MappingError::DuplicateProfile {
                name,
                existing: existing.name,
            });
        }

        self.profiles.insert(
            key,
            RegisteredProfile {
                name,
                translate: Box::new(translate),
            },
        );
        Ok(())
    }

    /// Translates one value.
    pub fn map<S: 'static, T: 'static>(&self, source: &S) -> MapResult<T> {
        let translate = self.resolve::<S, T>()?;
        translate(source)
    }

    /// Translates a sequence in order; any failure discards the whole result.
    pub fn map_all<S: 'static, T: 'static>(&self, sources: &[S]) -> MapResult<Vec<T>> {
        let translate = self.resolve::<S, T>()?;
        sources.iter().map(translate).collect()
    }

    /// Name of the `S -> T` profile, if registered.
    pub fn profile_name<S: 'static, T: 'static>(&self) -> Option<&'static str> {
        self.profiles
            .get(&(TypeId::of::<S>(), TypeId::of::<T>()))
            .map(|profile| profile.name)
    }

    /// Names of every registered profile.
    pub fn profile_names(&self) -> Vec<&'static str> {
        let mut names = self
            .profiles
            .values()
            .map(|profile| profile.name)
            .collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    fn resolve<S: 'static, T: 'static>(&self) -> MapResult<Translate<S, T>> {
        self.profiles
            .get(&(TypeId::of::<S>(), TypeId::of::<T>()))
            .and_then(|profile| profile.translate.downcast_ref::<Translate<S, T>>())
            .copied()
            .ok_or(MappingError::ProfileNotFound {
                source: type_name::<S>(),
                target: type_name::<T>(),
            })
    }
}
