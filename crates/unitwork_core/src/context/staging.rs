//! Buffered writes waiting for the next commit.

use crate::model::entity::{EntityId, ID_COLUMN};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

/// One mutation staged in a persistence context.
///
/// Table and column names come from a validated `StoreModel` descriptor.
#[derive(Debug, Clone)]
pub(crate) enum StagedWrite {
    Insert {
        table: &'static str,
        columns: &'static [&'static str],
        values: Vec<Value>,
    },
    Upsert {
        table: &'static str,
        columns: &'static [&'static str],
        id: EntityId,
        values: Vec<Value>,
    },
    Delete {
        table: &'static str,
        id: EntityId,
    },
}

impl StagedWrite {
    /// Runs the write on `conn` and returns the affected row count.
    pub(crate) fn execute(&self, conn: &Connection) -> rusqlite::Result<usize> {
        match self {
            Self::Insert {
                table,
                columns,
                values,
            } => {
                if columns.is_empty() {
                    return conn.execute(&format!("INSERT INTO {table} DEFAULT VALUES;"), []);
                }
                let sql = format!(
                    "INSERT INTO {table} ({}) VALUES ({});",
                    columns.join(", "),
                    placeholders(columns.len())
                );
                conn.execute(&sql, params_from_iter(values.iter()))
            }
            Self::Upsert {
                table,
                columns,
                id,
                values,
            } => {
                let on_conflict = if columns.is_empty() {
                    "DO NOTHING".to_string()
                } else {
                    let assignments = columns
                        .iter()
                        .map(|column| format!("{column} = excluded.{column}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("DO UPDATE SET {assignments}")
                };
                let column_list = std::iter::once(ID_COLUMN)
                    .chain(columns.iter().copied())
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!(
                    "INSERT INTO {table} ({column_list}) VALUES ({})
                     ON CONFLICT({ID_COLUMN}) {on_conflict};",
                    placeholders(columns.len() + 1)
                );
                let binds = std::iter::once(Value::Integer(*id)).chain(values.iter().cloned());
                conn.execute(&sql, params_from_iter(binds))
            }
            Self::Delete { table, id } => conn.execute(
                &format!("DELETE FROM {table} WHERE {ID_COLUMN} = ?1;"),
                [*id],
            ),
        }
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
