//! Person-specific queries layered on the generic repository.

use crate::error::RepoResult;
use crate::model::person::Person;
use crate::repo::repository::{Repository, RepositoryBase};

/// Generic person CRUD plus name lookups.
pub trait PersonRepository: Repository<Person> {
    /// People whose `nome` contains `fragment` (case-sensitive).
    fn get_by_name(&self, fragment: &str) -> RepoResult<Vec<Person>> {
        self.find(&Person::name_contains(fragment))
    }
}

impl PersonRepository for RepositoryBase<Person> {}
