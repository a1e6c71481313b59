//! Generic repository and unit-of-work core over SQLite.
//!
//! Repositories stage writes on a persistence context shared by everything
//! resolved within one scope; services commit that context once per use case
//! and translate entities to application models through the mapping layer.

pub mod config;
pub mod container;
pub mod context;
pub mod db;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{ContainerConfig, ContextLifetime, StoreTarget};
pub use container::{Container, DefaultPersonService, Scope};
pub use context::{DbContext, EntitySet, UnitOfWork};
pub use db::{DbError, StoreModel};
pub use error::{InvalidStateError, RepoError, RepoResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use mapping::{MapResult, Mapper, MappingError};
pub use model::entity::{Entity, EntityId, ValidationError};
pub use model::person::{Person, PersonModel, PERSON_NAME_MAX_CHARS};
pub use query::{CompareOp, Predicate, QueryError};
pub use repo::person_repo::PersonRepository;
pub use repo::repository::{ContextOwnership, Repository, RepositoryBase};
pub use service::person_service::PersonService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
