//! Container configuration: where the store lives and how long contexts live.

use crate::db::DEFAULT_BUSY_TIMEOUT;
use std::path::PathBuf;
use std::time::Duration;

/// Location of the SQLite store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StoreTarget {
    /// Private in-memory database, one per opened context.
    #[default]
    InMemory,
    File(PathBuf),
}

impl StoreTarget {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }
}

/// Lifetime of the persistence context handed out by the container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContextLifetime {
    /// One context for the whole container, shared by every scope.
    ///
    /// The context state is guarded by a mutex, but writes staged by
    /// concurrent scopes land in the same pending set and are committed
    /// together by whichever scope commits first. Sharing a singleton
    /// between concurrent writers is unsafe unless the callers serialize
    /// their units of work themselves.
    #[default]
    Singleton,
    /// A fresh context per scope, released when the scope ends.
    Scoped,
}

/// Options for `Container`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    pub store: StoreTarget,
    pub lifetime: ContextLifetime,
    /// SQLite busy timeout for file-backed stores.
    pub busy_timeout: Duration,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            store: StoreTarget::default(),
            lifetime: ContextLifetime::default(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

impl ContainerConfig {
    pub fn singleton(store: StoreTarget) -> Self {
        Self {
            store,
            lifetime: ContextLifetime::Singleton,
            ..Self::default()
        }
    }

    pub fn scoped(store: StoreTarget) -> Self {
        Self {
            store,
            lifetime: ContextLifetime::Scoped,
            ..Self::default()
        }
    }
}
