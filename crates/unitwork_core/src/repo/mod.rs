//! Repository layer: generic CRUD over any registered entity type.
//!
//! # Responsibility
//! - Define one CRUD contract shared by every entity type.
//! - Validate entities before staging writes on the shared context.
//!
//! # Invariants
//! - Repositories never commit; committing is the unit of work's job.
//! - A repository releases its context only when it exclusively owns it.

pub mod person_repo;
pub mod repository;
