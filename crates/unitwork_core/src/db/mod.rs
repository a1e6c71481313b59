//! SQLite store driver: connection bootstrap and entity table registry.
//!
//! # Responsibility
//! - Open and configure SQLite connections for persistence contexts.
//! - Create tables for every entity registered in the `StoreModel`.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and all entity tables present.
//! - Only identifiers validated by `StoreModel` are interpolated into SQL.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory, DEFAULT_BUSY_TIMEOUT};
pub use schema::{EntityDescriptor, StoreModel};

pub type DbResult<T> = Result<T, DbError>;

/// Store-level failure. Surfaced to callers as a persistence error.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// A table or column name is not a plain SQL identifier.
    InvalidIdentifier(String),
    /// The same table was registered twice in one store model.
    DuplicateEntity(&'static str),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidIdentifier(value) => write!(f, "invalid SQL identifier `{value}`"),
            Self::DuplicateEntity(table) => {
                write!(f, "entity table `{table}` is already registered")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidIdentifier(_) | Self::DuplicateEntity(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
