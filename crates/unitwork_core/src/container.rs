//! Composition root: wires contexts, repositories and services per scope.
//!
//! # Responsibility
//! - Own persistence context lifetime (`Singleton` or `Scoped`).
//! - Hand the same context instance to every contract resolved in one scope.
//!
//! # Invariants
//! - The commit contract and the context contract resolve to one instance,
//!   inside a scope and (for `Singleton`) outside any scope.
//! - A scope releases only a context it opened, exactly once.
//! - Repositories and services resolved here never own their context.

use crate::config::{ContainerConfig, ContextLifetime};
use crate::context::{DbContext, UnitOfWork};
use crate::db::StoreModel;
use crate::error::{InvalidStateError, RepoError, RepoResult};
use crate::mapping::{register_default_profiles, Mapper};
use crate::model::entity::Entity;
use crate::model::person::Person;
use crate::repo::repository::RepositoryBase;
use crate::service::person_service::PersonService;
use crate::service::ServiceResult;
use log::{error, info};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Person service as resolved by the container.
pub type DefaultPersonService = PersonService<RepositoryBase<Person>>;

pub struct Container {
    config: ContainerConfig,
    model: Arc<StoreModel>,
    mapper: Arc<Mapper>,
    singleton: OnceCell<Arc<DbContext>>,
}

impl Container {
    pub fn new(config: ContainerConfig, model: StoreModel, mapper: Mapper) -> Self {
        Self {
            config,
            model: Arc::new(model),
            mapper: Arc::new(mapper),
            singleton: OnceCell::new(),
        }
    }

    /// Container with `Person` registered and the default mapping profiles.
    pub fn bootstrap(config: ContainerConfig) -> ServiceResult<Self> {
        let model = StoreModel::new().with::<Person>()?;
        let mut mapper = Mapper::new();
        register_default_profiles(&mut mapper)?;
        Ok(Self::new(config, model, mapper))
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn mapper(&self) -> Arc<Mapper> {
        Arc::clone(&self.mapper)
    }

    pub fn model(&self) -> Arc<StoreModel> {
        Arc::clone(&self.model)
    }

    /// Context contract outside any scope.
    ///
    /// # Errors
    /// - `InvalidState(NoActiveScope)` with the `Scoped` lifetime.
    /// - `InvalidState(Released)` when the singleton was released.
    pub fn resolve_context(&self) -> RepoResult<Arc<DbContext>> {
        match self.config.lifetime {
            ContextLifetime::Scoped => Err(InvalidStateError::NoActiveScope.into()),
            ContextLifetime::Singleton => self.singleton_context(),
        }
    }

    /// Commit contract outside any scope; same instance as `resolve_context`.
    pub fn resolve_unit_of_work(&self) -> RepoResult<Arc<dyn UnitOfWork>> {
        let context: Arc<dyn UnitOfWork> = self.resolve_context()?;
        Ok(context)
    }

    /// Person service over the singleton context.
    pub fn resolve_person_service(&self) -> RepoResult<DefaultPersonService> {
        let context = self.resolve_context()?;
        Ok(person_service(context, self.mapper()))
    }

    /// Starts a scope holding one context for every resolution inside it.
    pub fn begin_scope(&self) -> RepoResult<Scope<'_>> {
        let (context, owns_context) = match self.config.lifetime {
            ContextLifetime::Scoped => (Arc::new(self.open_context()?), true),
            ContextLifetime::Singleton => (self.singleton_context()?, false),
        };
        Ok(Scope::new(self, context, owns_context))
    }

    /// Runs `work` inside a fresh scope and ends the scope on every exit path.
    ///
    /// An error from `work` wins over an error from ending the scope.
    pub fn with_scope<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Scope<'_>) -> Result<T, E>,
        E: From<RepoError>,
    {
        let scope = self.begin_scope()?;
        let result = work(&scope);
        let ended = scope.end();
        let value = result?;
        ended?;
        Ok(value)
    }

    fn singleton_context(&self) -> RepoResult<Arc<DbContext>> {
        let context = self
            .singleton
            .get_or_try_init(|| self.open_context().map(Arc::new))?;
        if context.is_released() {
            return Err(context.released_error("singleton persistence context"));
        }
        Ok(Arc::clone(context))
    }

    fn open_context(&self) -> RepoResult<DbContext> {
        DbContext::open(
            &self.config.store,
            self.config.busy_timeout,
            Arc::clone(&self.model),
        )
    }
}

/// Unit-of-work boundary sharing one persistence context.
///
/// Ending or dropping the scope releases a scope-owned context.
pub struct Scope<'c> {
    id: Uuid,
    container: &'c Container,
    context: Arc<DbContext>,
    owns_context: bool,
    started_at: Instant,
    closed: bool,
}

impl<'c> Scope<'c> {
    fn new(container: &'c Container, context: Arc<DbContext>, owns_context: bool) -> Self {
        let id = Uuid::new_v4();
        info!(
            "event=scope_begin module=container status=ok scope_id={} context_id={} owns_context={}",
            id,
            context.id(),
            owns_context
        );
        Self {
            id,
            container,
            context,
            owns_context,
            started_at: Instant::now(),
            closed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether ending this scope releases its context.
    pub fn owns_context(&self) -> bool {
        self.owns_context
    }

    pub fn resolve_context(&self) -> Arc<DbContext> {
        Arc::clone(&self.context)
    }

    pub fn resolve_unit_of_work(&self) -> Arc<dyn UnitOfWork> {
        self.resolve_context()
    }

    /// Generic repository for `E` over this scope's context.
    pub fn repository<E: Entity>(&self) -> RepositoryBase<E> {
        RepositoryBase::new(self.resolve_context())
    }

    pub fn person_repository(&self) -> RepositoryBase<Person> {
        self.repository::<Person>()
    }

    pub fn person_service(&self) -> DefaultPersonService {
        person_service(self.resolve_context(), self.container.mapper())
    }

    /// Ends the scope, surfacing a failure to release its context.
    pub fn end(mut self) -> RepoResult<()> {
        self.close()
    }

    fn close(&mut self) -> RepoResult<()> {
        self.closed = true;
        let released = if self.owns_context && !self.context.is_released() {
            self.context.release()
        } else {
            Ok(())
        };

        match &released {
            Ok(()) => info!(
                "event=scope_end module=container status=ok scope_id={} context_id={} duration_ms={}",
                self.id,
                self.context.id(),
                self.started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=scope_end module=container status=error scope_id={} context_id={} error={}",
                self.id,
                self.context.id(),
                err
            ),
        }
        released
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.close();
        }
    }
}

fn person_service(context: Arc<DbContext>, mapper: Arc<Mapper>) -> DefaultPersonService {
    let unit_of_work: Arc<dyn UnitOfWork> = context.clone();
    PersonService::new(unit_of_work, RepositoryBase::new(context), mapper)
}
