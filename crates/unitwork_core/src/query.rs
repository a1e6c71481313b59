//! Declarative entity predicates and their SQLite rendering.
//!
//! # Responsibility
//! - Express filters as data so the store evaluates them natively.
//! - Render predicates into parameterized `WHERE` clauses.
//!
//! # Invariants
//! - Values are always bound, never interpolated.
//! - Column names are checked against the entity descriptor before rendering.

use crate::db::EntityDescriptor;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Not;

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    UnknownColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownColumn { table, column } => {
                write!(f, "unknown column `{column}` on `{table}`")
            }
        }
    }
}

impl Error for QueryError {}

/// Comparison operator for `Predicate::Compare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Scalar accepted as a predicate operand.
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Integer(self)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Integer(i64::from(self))
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Integer(i64::from(self))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Real(self)
    }
}

/// Boolean expression over entity attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every record.
    All,
    Compare {
        column: &'static str,
        op: CompareOp,
        value: Value,
    },
    /// Case-sensitive substring match.
    Contains {
        column: &'static str,
        needle: String,
    },
    /// Case-sensitive prefix match.
    StartsWith {
        column: &'static str,
        prefix: String,
    },
    IsNull(&'static str),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

/// Rendered `WHERE` clause with its bound values in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilter {
    pub clause: String,
    pub binds: Vec<Value>,
}

impl Predicate {
    pub fn eq(column: &'static str, value: impl IntoValue) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn ne(column: &'static str, value: impl IntoValue) -> Self {
        Self::compare(column, CompareOp::Ne, value)
    }

    pub fn lt(column: &'static str, value: impl IntoValue) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    pub fn le(column: &'static str, value: impl IntoValue) -> Self {
        Self::compare(column, CompareOp::Le, value)
    }

    pub fn gt(column: &'static str, value: impl IntoValue) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    pub fn ge(column: &'static str, value: impl IntoValue) -> Self {
        Self::compare(column, CompareOp::Ge, value)
    }

    pub fn compare(column: &'static str, op: CompareOp, value: impl IntoValue) -> Self {
        Self::Compare {
            column,
            op,
            value: value.into_value(),
        }
    }

    pub fn contains(column: &'static str, needle: impl Into<String>) -> Self {
        Self::Contains {
            column,
            needle: needle.into(),
        }
    }

    pub fn starts_with(column: &'static str, prefix: impl Into<String>) -> Self {
        Self::StartsWith {
            column,
            prefix: prefix.into(),
        }
    }

    pub fn is_null(column: &'static str) -> Self {
        Self::IsNull(column)
    }

    pub fn and(self, other: Predicate) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Renders this predicate for the table described by `entity`.
    pub fn to_sql(&self, entity: &EntityDescriptor) -> QueryResult<SqlFilter> {
        let mut filter = SqlFilter {
            clause: String::new(),
            binds: Vec::new(),
        };
        self.render(entity, &mut filter)?;
        Ok(filter)
    }

    fn render(&self, entity: &EntityDescriptor, out: &mut SqlFilter) -> QueryResult<()> {
        match self {
            Self::All => out.clause.push_str("1 = 1"),
            Self::Compare { column, op, value } => {
                let column = checked_column(entity, column)?;
                out.clause.push_str(&format!("{column} {} ?", op.as_sql()));
                out.binds.push(value.clone());
            }
            Self::Contains { column, needle } => {
                let column = checked_column(entity, column)?;
                out.clause.push_str(&format!("instr({column}, ?) > 0"));
                out.binds.push(Value::Text(needle.clone()));
            }
            Self::StartsWith { column, prefix } => {
                let column = checked_column(entity, column)?;
                out.clause
                    .push_str(&format!("substr({column}, 1, length(?)) = ?"));
                out.binds.push(Value::Text(prefix.clone()));
                out.binds.push(Value::Text(prefix.clone()));
            }
            Self::IsNull(column) => {
                let column = checked_column(entity, column)?;
                out.clause.push_str(&format!("{column} IS NULL"));
            }
            Self::And(left, right) => render_binary(entity, out, left, "AND", right)?,
            Self::Or(left, right) => render_binary(entity, out, left, "OR", right)?,
            Self::Not(inner) => {
                out.clause.push_str("NOT (");
                inner.render(entity, out)?;
                out.clause.push(')');
            }
        }
        Ok(())
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        Predicate::Not(Box::new(self))
    }
}

fn render_binary(
    entity: &EntityDescriptor,
    out: &mut SqlFilter,
    left: &Predicate,
    keyword: &str,
    right: &Predicate,
) -> QueryResult<()> {
    out.clause.push('(');
    left.render(entity, out)?;
    out.clause.push_str(&format!(" {keyword} "));
    right.render(entity, out)?;
    out.clause.push(')');
    Ok(())
}

fn checked_column(
    entity: &EntityDescriptor,
    column: &'static str,
) -> QueryResult<&'static str> {
    if entity.has_column(column) {
        Ok(column)
    } else {
        Err(QueryError::UnknownColumn {
            table: entity.table,
            column,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Predicate, QueryError};
    use crate::db::EntityDescriptor;
    use rusqlite::types::Value;

    fn person() -> EntityDescriptor {
        EntityDescriptor {
            table: "person",
            columns: &["nome"],
            schema: "",
        }
    }

    #[test]
    fn equality_binds_value() {
        let filter = Predicate::eq("nome", "TESTE").to_sql(&person()).unwrap();
        assert_eq!(filter.clause, "nome = ?");
        assert_eq!(filter.binds, vec![Value::Text("TESTE".to_string())]);
    }

    #[test]
    fn nested_combinators_are_parenthesized_in_order() {
        let predicate = Predicate::contains("nome", "TE")
            .and(!Predicate::eq("id", 3_i64))
            .or(Predicate::is_null("nome"));
        let filter = predicate.to_sql(&person()).unwrap();

        assert_eq!(
            filter.clause,
            "((instr(nome, ?) > 0 AND NOT (id = ?)) OR nome IS NULL)"
        );
        assert_eq!(
            filter.binds,
            vec![Value::Text("TE".to_string()), Value::Integer(3)]
        );
    }

    #[test]
    fn prefix_binds_prefix_twice() {
        let filter = Predicate::starts_with("nome", "TES")
            .to_sql(&person())
            .unwrap();
        assert_eq!(filter.clause, "substr(nome, 1, length(?)) = ?");
        assert_eq!(filter.binds.len(), 2);
    }

    #[test]
    fn unknown_column_is_rejected_before_rendering() {
        let err = Predicate::eq("email", "x")
            .and(Predicate::All)
            .to_sql(&person())
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownColumn {
                table: "person",
                column: "email"
            }
        );
    }
}
