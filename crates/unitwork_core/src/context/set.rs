//! Typed view over one entity table of a persistence context.

use crate::context::staging::StagedWrite;
use crate::context::DbContext;
use crate::error::RepoResult;
use crate::model::entity::{Entity, EntityId, ID_COLUMN};
use crate::query::Predicate;
use rusqlite::params_from_iter;
use std::marker::PhantomData;

/// Handle returned by `DbContext::set`.
///
/// Writes are staged on the owning context; reads hit committed store state
/// immediately. The set does not validate entities.
pub struct EntitySet<'ctx, E: Entity> {
    context: &'ctx DbContext,
    _entity: PhantomData<fn() -> E>,
}

impl<'ctx, E: Entity> EntitySet<'ctx, E> {
    pub(crate) fn new(context: &'ctx DbContext) -> Self {
        Self {
            context,
            _entity: PhantomData,
        }
    }

    /// Stages an insert; the store assigns the identity on commit.
    pub fn add(&self, entity: &E) -> RepoResult<()> {
        let descriptor = self.context.descriptor(E::TABLE)?;
        self.context.stage(StagedWrite::Insert {
            table: descriptor.table,
            columns: descriptor.columns,
            values: entity.values(),
        })
    }

    /// Stages an insert-or-overwrite keyed by identity.
    ///
    /// Entities without identity are staged as plain inserts.
    pub fn add_or_update(&self, entity: &E) -> RepoResult<()> {
        let Some(id) = entity.id() else {
            return self.add(entity);
        };
        let descriptor = self.context.descriptor(E::TABLE)?;
        self.context.stage(StagedWrite::Upsert {
            table: descriptor.table,
            columns: descriptor.columns,
            id,
            values: entity.values(),
        })
    }

    /// Stages removal of the record with `id`.
    pub fn remove(&self, id: EntityId) -> RepoResult<()> {
        let descriptor = self.context.descriptor(E::TABLE)?;
        self.context.stage(StagedWrite::Delete {
            table: descriptor.table,
            id,
        })
    }

    pub fn find(&self, id: EntityId) -> RepoResult<Option<E>> {
        let mut found = self.filter(&Predicate::eq(ID_COLUMN, id))?;
        Ok(found.pop())
    }

    pub fn to_list(&self) -> RepoResult<Vec<E>> {
        self.filter(&Predicate::All)
    }

    /// Materializes every committed record matching `predicate`, by identity.
    pub fn filter(&self, predicate: &Predicate) -> RepoResult<Vec<E>> {
        let descriptor = self.context.descriptor(E::TABLE)?;
        let filter = predicate.to_sql(descriptor)?;
        let select_list = std::iter::once(ID_COLUMN)
            .chain(descriptor.columns.iter().copied())
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {select_list} FROM {} WHERE {} ORDER BY {ID_COLUMN} ASC;",
            descriptor.table,
            filter.clause
        );

        self.context.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(filter.binds.iter()))?;
            let mut entities = Vec::new();

            while let Some(row) = rows.next()? {
                entities.push(E::from_row(row)?);
            }

            Ok(entities)
        })
    }
}
