//! Entity table registry and idempotent table creation.
//!
//! # Responsibility
//! - Record which entity types a store serves, with their table shape.
//! - Reject identifiers that are unsafe to interpolate into SQL.
//! - Create registered tables on connection bootstrap.
//!
//! # Invariants
//! - Table DDL is applied in registration order inside one transaction.
//! - DDL statements are `CREATE ... IF NOT EXISTS`; there is no versioning.

use crate::db::{DbError, DbResult};
use crate::model::entity::{Entity, ID_COLUMN};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Table shape of one registered entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub schema: &'static str,
}

impl EntityDescriptor {
    /// Returns whether `column` is the identity or a declared attribute.
    pub fn has_column(&self, column: &str) -> bool {
        column == ID_COLUMN || self.columns.contains(&column)
    }
}

/// Set of entity types a store serves.
#[derive(Debug, Clone, Default)]
pub struct StoreModel {
    entities: Vec<EntityDescriptor>,
}

impl StoreModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers entity `E`, validating its table and column identifiers.
    pub fn register<E: Entity>(&mut self) -> DbResult<()> {
        validate_identifier(E::TABLE)?;
        for column in E::COLUMNS {
            validate_identifier(column)?;
        }
        if self.descriptor(E::TABLE).is_some() {
            return Err(DbError::DuplicateEntity(E::TABLE));
        }

        self.entities.push(EntityDescriptor {
            table: E::TABLE,
            columns: E::COLUMNS,
            schema: E::SCHEMA,
        });
        Ok(())
    }

    /// Builder-style variant of `register`.
    pub fn with<E: Entity>(mut self) -> DbResult<Self> {
        self.register::<E>()?;
        Ok(self)
    }

    pub fn descriptor(&self, table: &str) -> Option<&EntityDescriptor> {
        self.entities.iter().find(|entity| entity.table == table)
    }

    pub fn tables(&self) -> Vec<&'static str> {
        self.entities.iter().map(|entity| entity.table).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Creates every registered table on `conn` in one transaction.
pub fn apply_schema(conn: &mut Connection, model: &StoreModel) -> DbResult<()> {
    let tx = conn.transaction()?;
    for entity in &model.entities {
        if let Err(err) = tx.execute_batch(entity.schema) {
            error!(
                "event=schema_apply module=db status=error table={} error={}",
                entity.table, err
            );
            return Err(err.into());
        }
    }
    tx.commit()?;

    info!(
        "event=schema_apply module=db status=ok tables={}",
        model.entities.len()
    );
    Ok(())
}

fn validate_identifier(value: &str) -> DbResult<()> {
    if IDENTIFIER_RE.is_match(value) {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::validate_identifier;

    #[test]
    fn plain_identifiers_are_accepted() {
        assert!(validate_identifier("person").is_ok());
        assert!(validate_identifier("_audit_log2").is_ok());
    }

    #[test]
    fn identifiers_with_sql_syntax_are_rejected() {
        assert!(validate_identifier("person; DROP TABLE person").is_err());
        assert!(validate_identifier("2fast").is_err());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("nome\"").is_err());
    }
}
