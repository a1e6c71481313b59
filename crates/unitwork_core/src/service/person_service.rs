//! Person use-case service.
//!
//! # Responsibility
//! - Expose person CRUD in terms of `PersonModel`.
//! - Stage through the repository and flush through the shared unit of work.
//!
//! # Invariants
//! - `add`, `update` and `delete` each call `commit` exactly once, after
//!   the repository call succeeded.
//! - Reads never commit.

use crate::context::UnitOfWork;
use crate::mapping::Mapper;
use crate::model::entity::EntityId;
use crate::model::person::{Person, PersonModel};
use crate::query::Predicate;
use crate::repo::person_repo::PersonRepository;
use crate::repo::repository::Repository;
use crate::service::ServiceResult;
use std::sync::Arc;

/// Use-case service over a person repository and its scope's unit of work.
pub struct PersonService<R: PersonRepository> {
    unit_of_work: Arc<dyn UnitOfWork>,
    repo: R,
    mapper: Arc<Mapper>,
}

impl<R: PersonRepository> PersonService<R> {
    pub fn new(unit_of_work: Arc<dyn UnitOfWork>, repo: R, mapper: Arc<Mapper>) -> Self {
        Self {
            unit_of_work,
            repo,
            mapper,
        }
    }

    /// Adds a new person and returns the committed row count.
    pub fn add(&self, person: &PersonModel) -> ServiceResult<usize> {
        let entity = self.mapper.map::<PersonModel, Person>(person)?;
        self.repo.add(&entity)?;
        Ok(self.unit_of_work.commit()?)
    }

    /// Overwrites (or inserts under its identity) one person.
    pub fn update(&self, person: &PersonModel) -> ServiceResult<usize> {
        let entity = self.mapper.map::<PersonModel, Person>(person)?;
        self.repo.update(&entity)?;
        Ok(self.unit_of_work.commit()?)
    }

    /// Deletes the person identified by the model; absent people are ignored.
    pub fn delete(&self, person: &PersonModel) -> ServiceResult<usize> {
        let entity = self.mapper.map::<PersonModel, Person>(person)?;
        if let Some(id) = entity.id {
            self.repo.delete(id)?;
        }
        Ok(self.unit_of_work.commit()?)
    }

    pub fn get_by_id(&self, id: EntityId) -> ServiceResult<Option<PersonModel>> {
        match self.repo.get_by_id(id)? {
            Some(person) => Ok(Some(self.mapper.map::<Person, PersonModel>(&person)?)),
            None => Ok(None),
        }
    }

    pub fn get_all(&self) -> ServiceResult<Vec<PersonModel>> {
        let people = self.repo.get_all()?;
        Ok(self.mapper.map_all::<Person, PersonModel>(&people)?)
    }

    pub fn find(&self, predicate: &Predicate) -> ServiceResult<Vec<PersonModel>> {
        let people = self.repo.find(predicate)?;
        Ok(self.mapper.map_all::<Person, PersonModel>(&people)?)
    }

    /// People whose name contains `fragment`.
    pub fn get_by_name(&self, fragment: &str) -> ServiceResult<Vec<PersonModel>> {
        let people = self.repo.get_by_name(fragment)?;
        Ok(self.mapper.map_all::<Person, PersonModel>(&people)?)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Releases the underlying repository.
    pub fn release(&mut self) -> ServiceResult<()> {
        Ok(self.repo.release()?)
    }
}
