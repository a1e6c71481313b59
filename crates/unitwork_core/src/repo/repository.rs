//! Generic repository contract and its context-backed implementation.
//!
//! # Invariants
//! - `add`/`update` call `Entity::validate()` before staging.
//! - `delete` of an absent identity stages nothing.
//! - Reads return committed state ordered by identity.

use crate::context::DbContext;
use crate::error::RepoResult;
use crate::model::entity::{Entity, EntityId, ValidationError};
use crate::query::Predicate;
use log::{debug, warn};
use std::marker::PhantomData;
use std::sync::Arc;

/// CRUD contract, identical for every entity type.
pub trait Repository<E: Entity> {
    /// Stages a new record. The entity must not carry an identity yet.
    fn add(&self, entity: &E) -> RepoResult<()>;
    /// Stages an upsert keyed by identity; identities must be positive.
    fn update(&self, entity: &E) -> RepoResult<()>;
    /// Stages removal when the record exists; otherwise does nothing.
    fn delete(&self, id: EntityId) -> RepoResult<()>;
    fn get_by_id(&self, id: EntityId) -> RepoResult<Option<E>>;
    fn get_all(&self) -> RepoResult<Vec<E>>;
    fn find(&self, predicate: &Predicate) -> RepoResult<Vec<E>>;
    /// Releases the repository, and its context when exclusively owned.
    fn release(&mut self) -> RepoResult<()>;
}

/// Whether a repository may release the context it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextOwnership {
    /// The context belongs to a scope; other repositories may still use it.
    Shared,
    /// The repository created or was handed sole ownership of the context.
    Exclusive,
}

/// `Repository` implementation over a `DbContext`, one instance per entity type.
pub struct RepositoryBase<E: Entity> {
    context: Arc<DbContext>,
    ownership: ContextOwnership,
    released: bool,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> RepositoryBase<E> {
    /// Creates a repository over a context shared with the rest of a scope.
    pub fn new(context: Arc<DbContext>) -> Self {
        Self::with_ownership(context, ContextOwnership::Shared)
    }

    /// Creates a repository that owns `context` and releases it with itself.
    pub fn owning(context: Arc<DbContext>) -> Self {
        Self::with_ownership(context, ContextOwnership::Exclusive)
    }

    pub fn with_ownership(context: Arc<DbContext>, ownership: ContextOwnership) -> Self {
        Self {
            context,
            ownership,
            released: false,
            _entity: PhantomData,
        }
    }

    pub fn context(&self) -> &Arc<DbContext> {
        &self.context
    }

    pub fn ownership(&self) -> ContextOwnership {
        self.ownership
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn ensure_active(&self) -> RepoResult<()> {
        if self.released {
            return Err(self.context.released_error("repository"));
        }
        Ok(())
    }
}

impl<E: Entity> Repository<E> for RepositoryBase<E> {
    fn add(&self, entity: &E) -> RepoResult<()> {
        self.ensure_active()?;
        if let Some(id) = entity.id() {
            return Err(ValidationError::PreassignedIdentity(id).into());
        }
        entity.validate()?;
        self.context.set::<E>().add(entity)
    }

    fn update(&self, entity: &E) -> RepoResult<()> {
        self.ensure_active()?;
        if let Some(id) = entity.id().filter(|id| *id <= 0) {
            return Err(ValidationError::NonPositiveIdentity(id).into());
        }
        entity.validate()?;
        self.context.set::<E>().add_or_update(entity)
    }

    fn delete(&self, id: EntityId) -> RepoResult<()> {
        self.ensure_active()?;
        let set = self.context.set::<E>();
        if set.find(id)?.is_none() {
            debug!(
                "event=repo_delete module=repo status=skipped table={} id={} reason=not_found",
                E::TABLE,
                id
            );
            return Ok(());
        }
        set.remove(id)
    }

    fn get_by_id(&self, id: EntityId) -> RepoResult<Option<E>> {
        self.ensure_active()?;
        self.context.set::<E>().find(id)
    }

    fn get_all(&self) -> RepoResult<Vec<E>> {
        self.ensure_active()?;
        self.context.set::<E>().to_list()
    }

    fn find(&self, predicate: &Predicate) -> RepoResult<Vec<E>> {
        self.ensure_active()?;
        self.context.set::<E>().filter(predicate)
    }

    fn release(&mut self) -> RepoResult<()> {
        self.ensure_active()?;
        self.released = true;
        match self.ownership {
            ContextOwnership::Shared => Ok(()),
            ContextOwnership::Exclusive => self.context.release(),
        }
    }
}

impl<E: Entity> Drop for RepositoryBase<E> {
    fn drop(&mut self) {
        if self.released
            || self.ownership == ContextOwnership::Shared
            || self.context.is_released()
        {
            return;
        }
        if let Err(err) = self.context.release() {
            warn!(
                "event=repo_drop module=repo status=error table={} context_id={} error={}",
                E::TABLE,
                self.context.id(),
                err
            );
        }
    }
}
