//! Entity contract shared by every persisted record type.
//!
//! # Responsibility
//! - Declare, per entity type, the table shape the store adapter needs.
//! - Keep attribute enumeration explicit instead of reflective.
//!
//! # Invariants
//! - `COLUMNS` excludes the identity column, which is always `id`.
//! - `values()` yields exactly one value per `COLUMNS` entry, in order.
//! - `from_row` reads rows selected as `id` followed by `COLUMNS`.

use rusqlite::types::Value;
use rusqlite::Row;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned integer identity.
pub type EntityId = i64;

/// Name of the identity column for every entity table.
pub const ID_COLUMN: &str = "id";

/// Attribute-level validation failure raised before staging a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required attribute is missing or blank.
    MissingAttribute(&'static str),
    /// A bounded attribute exceeds its maximum length.
    TooLong {
        attribute: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
    /// `add` received an entity that already carries an identity.
    PreassignedIdentity(EntityId),
    /// `update` received an identity the store never assigns.
    NonPositiveIdentity(EntityId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAttribute(attribute) => {
                write!(f, "required attribute `{attribute}` is missing")
            }
            Self::TooLong {
                attribute,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "attribute `{attribute}` has {actual_chars} chars; maximum is {max_chars}"
            ),
            Self::PreassignedIdentity(id) => write!(
                f,
                "entity already carries identity {id}; new entities get their id from the store"
            ),
            Self::NonPositiveIdentity(id) => {
                write!(f, "identity {id} is invalid; store identities are positive")
            }
        }
    }
}

impl Error for ValidationError {}

/// Persisted record type with an integer identity.
///
/// Implementors describe their own table; the store adapter never inspects
/// fields at runtime.
pub trait Entity: Clone + Send + 'static {
    /// Table name. Must be a plain SQL identifier.
    const TABLE: &'static str;
    /// Attribute columns in `values()` order, without `id`.
    const COLUMNS: &'static [&'static str];
    /// Idempotent DDL creating the table (`CREATE TABLE IF NOT EXISTS ...`).
    const SCHEMA: &'static str;

    /// Identity, `None` until the store assigned one.
    fn id(&self) -> Option<EntityId>;

    /// Checks required attributes and bounds.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Attribute values aligned with `COLUMNS`.
    fn values(&self) -> Vec<Value>;

    /// Builds one entity from a row selected as `id, COLUMNS...`.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}
