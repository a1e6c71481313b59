//! Errors shared by persistence contexts, repositories and scopes.

use crate::db::DbError;
use crate::model::entity::ValidationError;
use crate::query::QueryError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Operation attempted on something that can no longer serve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidStateError {
    /// The context or repository was released.
    Released {
        target: &'static str,
        context_id: Uuid,
    },
    /// A scoped context was requested outside any scope.
    NoActiveScope,
    /// A thread panicked while holding the context state.
    Poisoned(Uuid),
}

impl Display for InvalidStateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Released { target, context_id } => {
                write!(f, "{target} for context {context_id} was already released")
            }
            Self::NoActiveScope => {
                write!(f, "scoped persistence context requested outside of a scope")
            }
            Self::Poisoned(context_id) => {
                write!(f, "persistence context {context_id} state is poisoned")
            }
        }
    }
}

impl Error for InvalidStateError {}

/// Error returned by context, repository and container operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    /// The store rejected a read or the commit; nothing was applied.
    Persistence(DbError),
    Query(QueryError),
    InvalidState(InvalidStateError),
    /// The entity type is not part of the context's store model.
    UnknownEntity(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "persistence failure: {err}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::InvalidState(err) => write!(f, "{err}"),
            Self::UnknownEntity(table) => {
                write!(f, "entity `{table}` is not registered in the store model")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::Query(err) => Some(err),
            Self::InvalidState(err) => Some(err),
            Self::UnknownEntity(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Persistence(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(DbError::Sqlite(value))
    }
}

impl From<QueryError> for RepoError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}

impl From<InvalidStateError> for RepoError {
    fn from(value: InvalidStateError) -> Self {
        Self::InvalidState(value)
    }
}
