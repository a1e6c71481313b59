//! Person entity and its application model.
//!
//! # Invariants
//! - `nome` is required, non-blank and at most `PERSON_NAME_MAX_CHARS` chars.
//! - `PersonModel` mirrors `Person` but tolerates absent fields on the wire;
//!   completeness is enforced when it is translated back to `Person`.

use crate::model::entity::{Entity, EntityId, ValidationError};
use crate::query::Predicate;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Maximum length of `Person::nome`, mirrored by the table CHECK constraint.
pub const PERSON_NAME_MAX_CHARS: usize = 100;

/// Domain record for a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Store-assigned identity.
    pub id: Option<EntityId>,
    pub nome: String,
}

impl Person {
    /// Creates an unsaved person.
    pub fn new(nome: impl Into<String>) -> Self {
        Self {
            id: None,
            nome: nome.into(),
        }
    }

    /// Creates a person with a known identity, e.g. for upserts.
    pub fn with_id(id: EntityId, nome: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            nome: nome.into(),
        }
    }

    /// Exact match on `nome`.
    pub fn name_equals(nome: &str) -> Predicate {
        Predicate::eq("nome", nome)
    }

    /// Substring match on `nome`.
    pub fn name_contains(fragment: &str) -> Predicate {
        Predicate::contains("nome", fragment)
    }
}

impl Entity for Person {
    const TABLE: &'static str = "person";
    const COLUMNS: &'static [&'static str] = &["nome"];
    const SCHEMA: &'static str = "CREATE TABLE IF NOT EXISTS person (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nome VARCHAR(100) NOT NULL CHECK (length(nome) <= 100)
);";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.nome.trim().is_empty() {
            return Err(ValidationError::MissingAttribute("nome"));
        }

        let chars = self.nome.chars().count();
        if chars > PERSON_NAME_MAX_CHARS {
            return Err(ValidationError::TooLong {
                attribute: "nome",
                max_chars: PERSON_NAME_MAX_CHARS,
                actual_chars: chars,
            });
        }

        Ok(())
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Text(self.nome.clone())]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            nome: row.get("nome")?,
        })
    }
}

/// Application-facing projection of `Person`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonModel {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub nome: Option<String>,
}

impl PersonModel {
    /// Creates a model for a person not yet stored.
    pub fn named(nome: impl Into<String>) -> Self {
        Self {
            id: None,
            nome: Some(nome.into()),
        }
    }
}
