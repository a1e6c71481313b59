//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and the shared unit of work per use case.
//! - Translate between application models and domain entities at the boundary.
//!
//! # Invariants
//! - Each mutating use case commits exactly once.
//! - Errors propagate unchanged; services never retry.

use crate::error::RepoError;
use crate::mapping::MappingError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod person_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Repo(RepoError),
    Mapping(MappingError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Mapping(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Mapping(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<MappingError> for ServiceError {
    fn from(value: MappingError) -> Self {
        Self::Mapping(value)
    }
}

impl From<crate::db::DbError> for ServiceError {
    fn from(value: crate::db::DbError) -> Self {
        Self::Repo(value.into())
    }
}
