//! Persistence context: one connection plus the writes staged against it.
//!
//! # Responsibility
//! - Own the store connection for the lifetime of a scope.
//! - Buffer writes from every repository sharing the context.
//! - Flush buffered writes in one transaction on `commit`.
//!
//! # Invariants
//! - Staged writes never reach the store before `commit`.
//! - `commit` applies all staged writes or none, in staging order; the
//!   staged batch is consumed by every commit attempt.
//! - The connection is closed exactly once, by `release` or on drop.
//! - Every operation after `release` fails with `InvalidState`.

mod set;
mod staging;

pub use set::EntitySet;

use crate::config::StoreTarget;
use crate::db::{open_db, open_db_in_memory, DbError, EntityDescriptor, StoreModel};
use crate::error::{InvalidStateError, RepoError, RepoResult};
use crate::model::entity::Entity;
use log::{debug, error, info, warn};
use rusqlite::Connection;
use staging::StagedWrite;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Narrow commit-only contract of a persistence context.
pub trait UnitOfWork: Send + Sync {
    /// Flushes every staged write atomically and returns the affected row count.
    fn commit(&self) -> RepoResult<usize>;

    /// Identity of the underlying context, stable for its lifetime.
    fn context_id(&self) -> Uuid;
}

struct ContextState {
    conn: Option<Connection>,
    pending: Vec<StagedWrite>,
}

/// SQLite-backed persistence context.
///
/// Shared by reference (`Arc<DbContext>`) among every repository of a scope.
pub struct DbContext {
    id: Uuid,
    model: Arc<StoreModel>,
    state: Mutex<ContextState>,
}

impl DbContext {
    /// Opens a connection to `store` and creates the model's tables.
    pub fn open(
        store: &StoreTarget,
        busy_timeout: Duration,
        model: Arc<StoreModel>,
    ) -> RepoResult<Self> {
        let conn = match store {
            StoreTarget::InMemory => open_db_in_memory(&model)?,
            StoreTarget::File(path) => open_db(path, &model, busy_timeout)?,
        };
        Ok(Self::from_connection(conn, model))
    }

    /// Wraps an already prepared connection.
    pub fn from_connection(conn: Connection, model: Arc<StoreModel>) -> Self {
        let id = Uuid::new_v4();
        info!(
            "event=context_open module=context status=ok context_id={} tables={}",
            id,
            model.tables().len()
        );
        Self {
            id,
            model,
            state: Mutex::new(ContextState {
                conn: Some(conn),
                pending: Vec::new(),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn model(&self) -> &StoreModel {
        &self.model
    }

    /// Typed handle over `E`'s table. Every handle shares this context's state.
    pub fn set<E: Entity>(&self) -> EntitySet<'_, E> {
        EntitySet::new(self)
    }

    /// Number of writes waiting for the next commit.
    pub fn pending_count(&self) -> RepoResult<usize> {
        let state = self.open_state()?;
        Ok(state.pending.len())
    }

    /// Drops every staged write without touching the store.
    pub fn discard_changes(&self) -> RepoResult<usize> {
        let mut state = self.open_state()?;
        let discarded = state.pending.len();
        state.pending.clear();
        debug!(
            "event=context_discard module=context status=ok context_id={} discarded={}",
            self.id, discarded
        );
        Ok(discarded)
    }

    pub fn is_released(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.conn.is_none())
            .unwrap_or(true)
    }

    /// Closes the connection and discards staged writes.
    ///
    /// # Errors
    /// - `InvalidState` when already released.
    /// - `Persistence` when SQLite reports a failure while closing; the
    ///   context counts as released regardless.
    pub fn release(&self) -> RepoResult<()> {
        let mut state = self.lock()?;
        let conn = state
            .conn
            .take()
            .ok_or_else(|| self.released_error("persistence context"))?;
        let discarded = state.pending.len();
        state.pending.clear();
        drop(state);

        if discarded > 0 {
            warn!(
                "event=context_release module=context status=discarded context_id={} discarded={}",
                self.id, discarded
            );
        }

        match conn.close() {
            Ok(()) => {
                info!(
                    "event=context_release module=context status=ok context_id={}",
                    self.id
                );
                Ok(())
            }
            Err((_conn, err)) => {
                error!(
                    "event=context_release module=context status=error context_id={} error={}",
                    self.id, err
                );
                Err(DbError::Sqlite(err).into())
            }
        }
    }

    pub(crate) fn descriptor(&self, table: &'static str) -> RepoResult<&EntityDescriptor> {
        self.model
            .descriptor(table)
            .ok_or(RepoError::UnknownEntity(table))
    }

    pub(crate) fn stage(&self, write: StagedWrite) -> RepoResult<()> {
        let mut state = self.open_state()?;
        state.pending.push(write);
        Ok(())
    }

    pub(crate) fn with_connection<T>(
        &self,
        read: impl FnOnce(&Connection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let state = self.lock()?;
        let conn = state
            .conn
            .as_ref()
            .ok_or_else(|| self.released_error("persistence context"))?;
        read(conn)
    }

    pub(crate) fn released_error(&self, target: &'static str) -> RepoError {
        InvalidStateError::Released {
            target,
            context_id: self.id,
        }
        .into()
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, ContextState>> {
        self.state
            .lock()
            .map_err(|_| RepoError::from(InvalidStateError::Poisoned(self.id)))
    }

    fn open_state(&self) -> RepoResult<MutexGuard<'_, ContextState>> {
        let state = self.lock()?;
        if state.conn.is_none() {
            return Err(self.released_error("persistence context"));
        }
        Ok(state)
    }
}

impl UnitOfWork for DbContext {
    fn commit(&self) -> RepoResult<usize> {
        let started_at = Instant::now();
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let conn = state
            .conn
            .as_mut()
            .ok_or_else(|| self.released_error("persistence context"))?;

        if state.pending.is_empty() {
            debug!(
                "event=context_commit module=context status=ok context_id={} staged=0 affected=0",
                self.id
            );
            return Ok(0);
        }

        let staged = std::mem::take(&mut state.pending);
        match apply_staged(conn, &staged) {
            Ok(affected) => {
                info!(
                    "event=context_commit module=context status=ok context_id={} staged={} affected={} duration_ms={}",
                    self.id,
                    staged.len(),
                    affected,
                    started_at.elapsed().as_millis()
                );
                Ok(affected)
            }
            Err(err) => {
                error!(
                    "event=context_commit module=context status=error context_id={} staged={} duration_ms={} error_code=commit_rolled_back error={}",
                    self.id,
                    staged.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    fn context_id(&self) -> Uuid {
        self.id
    }
}

impl Drop for DbContext {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if state.conn.take().is_none() {
            return;
        }
        if !state.pending.is_empty() {
            warn!(
                "event=context_release module=context status=discarded trigger=drop context_id={} discarded={}",
                self.id,
                state.pending.len()
            );
        }
        debug!(
            "event=context_release module=context status=ok trigger=drop context_id={}",
            self.id
        );
    }
}

fn apply_staged(conn: &mut Connection, staged: &[StagedWrite]) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    let mut affected = 0;
    for write in staged {
        affected += write.execute(&tx)?;
    }
    tx.commit()?;
    Ok(affected)
}
