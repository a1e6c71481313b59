//! Domain entities and their application-facing projections.
//!
//! # Responsibility
//! - Define the `Entity` contract every persisted record type implements.
//! - Keep domain records and application models as distinct types.
//!
//! # Invariants
//! - Entity identity is assigned by the store and never rewritten.
//! - Application models never alias entity instances; they are translated.

pub mod entity;
pub mod person;
