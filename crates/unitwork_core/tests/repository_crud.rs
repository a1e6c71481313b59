use rusqlite::types::Value;
use rusqlite::Row;
use std::sync::Arc;
use unitwork_core::db::DEFAULT_BUSY_TIMEOUT;
use unitwork_core::mapping::register_default_profiles;
use unitwork_core::{
    Container, ContainerConfig, ContextOwnership, DbContext, DbError, Entity, EntityId,
    InvalidStateError, Mapper, Person, PersonRepository, Predicate, QueryError, RepoError,
    Repository, RepositoryBase, StoreModel, StoreTarget, UnitOfWork, ValidationError,
};

/// Second entity type with a uniqueness constraint the repository cannot check.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Label {
    id: Option<EntityId>,
    name: String,
}

impl Label {
    fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }
}

impl Entity for Label {
    const TABLE: &'static str = "label";
    const COLUMNS: &'static [&'static str] = &["name"];
    const SCHEMA: &'static str = "CREATE TABLE IF NOT EXISTS label (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingAttribute("name"));
        }
        Ok(())
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Text(self.name.clone())]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            name: row.get("name")?,
        })
    }
}

fn container() -> Container {
    let model = StoreModel::new()
        .with::<Person>()
        .unwrap()
        .with::<Label>()
        .unwrap();
    let mut mapper = Mapper::new();
    register_default_profiles(&mut mapper).unwrap();
    Container::new(ContainerConfig::default(), model, mapper)
}

fn names(people: &[Person]) -> Vec<&str> {
    people.iter().map(|person| person.nome.as_str()).collect()
}

#[test]
fn crud_scenario_is_visible_only_after_each_commit() {
    let container = container();
    let scope = container.begin_scope().unwrap();
    let repo = scope.person_repository();
    let unit_of_work = scope.resolve_unit_of_work();

    repo.add(&Person::new("TESTE-CRUD")).unwrap();
    assert!(repo.find(&Person::name_equals("TESTE-CRUD")).unwrap().is_empty());
    assert_eq!(unit_of_work.commit().unwrap(), 1);

    let found = repo.find(&Person::name_equals("TESTE-CRUD")).unwrap();
    assert_eq!(found.len(), 1);
    let mut person = found[0].clone();
    assert!(person.id.is_some());

    person.nome = "TESTE".to_string();
    repo.update(&person).unwrap();
    assert_eq!(unit_of_work.commit().unwrap(), 1);
    assert_eq!(repo.find(&Person::name_equals("TESTE")).unwrap().len(), 1);
    assert!(repo.find(&Person::name_equals("TESTE-CRUD")).unwrap().is_empty());

    person.nome = "TESTE-CRUD".to_string();
    repo.update(&person).unwrap();
    unit_of_work.commit().unwrap();
    repo.delete(person.id.unwrap()).unwrap();
    assert_eq!(unit_of_work.commit().unwrap(), 1);

    assert!(repo.find(&Person::name_equals("TESTE-CRUD")).unwrap().is_empty());
    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn delete_of_absent_identity_is_a_noop() {
    let container = container();
    let scope = container.begin_scope().unwrap();
    let repo = scope.person_repository();
    let context = scope.resolve_context();

    repo.delete(404).unwrap();
    assert_eq!(context.pending_count().unwrap(), 0);
    assert_eq!(context.commit().unwrap(), 0);

    repo.add(&Person::new("present")).unwrap();
    repo.delete(404).unwrap();
    assert_eq!(context.commit().unwrap(), 1);
}

#[test]
fn update_with_unknown_identity_inserts_under_that_identity() {
    let container = container();
    let scope = container.begin_scope().unwrap();
    let repo = scope.person_repository();

    repo.update(&Person::with_id(42, "upserted")).unwrap();
    assert_eq!(scope.resolve_unit_of_work().commit().unwrap(), 1);

    let loaded = repo.get_by_id(42).unwrap().unwrap();
    assert_eq!(loaded, Person::with_id(42, "upserted"));
}

#[test]
fn update_without_identity_inserts_new_record() {
    let container = container();
    let scope = container.begin_scope().unwrap();
    let repo = scope.person_repository();

    repo.update(&Person::new("fresh")).unwrap();
    scope.resolve_unit_of_work().commit().unwrap();

    let all = repo.get_all().unwrap();
    assert_eq!(names(&all), vec!["fresh"]);
    assert!(all[0].id.is_some());
}

#[test]
fn add_rejects_invalid_or_identified_entities() {
    let container = container();
    let scope = container.begin_scope().unwrap();
    let repo = scope.person_repository();

    let blank = repo.add(&Person::new("  ")).unwrap_err();
    assert!(matches!(
        blank,
        RepoError::Validation(ValidationError::MissingAttribute("nome"))
    ));

    let too_long = repo.add(&Person::new("x".repeat(101))).unwrap_err();
    assert!(matches!(
        too_long,
        RepoError::Validation(ValidationError::TooLong { .. })
    ));

    let identified = repo.add(&Person::with_id(3, "has id")).unwrap_err();
    assert!(matches!(
        identified,
        RepoError::Validation(ValidationError::PreassignedIdentity(3))
    ));

    let update = repo.update(&Person::with_id(3, "")).unwrap_err();
    assert!(matches!(update, RepoError::Validation(_)));

    assert_eq!(scope.resolve_context().pending_count().unwrap(), 0);
}

#[test]
fn update_rejects_non_positive_identities() {
    let container = container();
    let scope = container.begin_scope().unwrap();
    let repo = scope.person_repository();

    for id in [0, -1] {
        let err = repo.update(&Person::with_id(id, "invalid id")).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ValidationError::NonPositiveIdentity(rejected)) if rejected == id
        ));
    }

    assert_eq!(scope.resolve_context().pending_count().unwrap(), 0);
    assert_eq!(scope.resolve_unit_of_work().commit().unwrap(), 0);
    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn reads_are_ordered_by_identity() {
    let container = container();
    let scope = container.begin_scope().unwrap();
    let repo = scope.person_repository();

    repo.update(&Person::with_id(30, "thirty")).unwrap();
    repo.update(&Person::with_id(10, "ten")).unwrap();
    repo.update(&Person::with_id(20, "twenty")).unwrap();
    scope.resolve_unit_of_work().commit().unwrap();

    assert_eq!(
        names(&repo.get_all().unwrap()),
        vec!["ten", "twenty", "thirty"]
    );
    assert_eq!(
        names(&repo.find(&Predicate::ge("id", 20_i64)).unwrap()),
        vec!["twenty", "thirty"]
    );
    assert!(repo.get_by_id(11).unwrap().is_none());
}

#[test]
fn get_by_name_matches_case_sensitive_substrings() {
    let container = container();
    let scope = container.begin_scope().unwrap();
    let repo = scope.person_repository();

    for nome in ["Maria Silva", "Joao Silva", "silvana", "Pedro"] {
        repo.add(&Person::new(nome)).unwrap();
    }
    scope.resolve_unit_of_work().commit().unwrap();

    assert_eq!(
        names(&repo.get_by_name("Silva").unwrap()),
        vec!["Maria Silva", "Joao Silva"]
    );
    assert_eq!(names(&repo.get_by_name("silva").unwrap()), vec!["silvana"]);
    assert!(repo.get_by_name("%").unwrap().is_empty());
}

#[test]
fn composed_predicates_filter_in_the_store() {
    let container = container();
    let scope = container.begin_scope().unwrap();
    let repo = scope.person_repository();

    for nome in ["TESTE-A", "TESTE-B", "OUTRO"] {
        repo.add(&Person::new(nome)).unwrap();
    }
    scope.resolve_unit_of_work().commit().unwrap();

    let predicate =
        Predicate::starts_with("nome", "TESTE").and(!Predicate::eq("nome", "TESTE-A"));
    assert_eq!(names(&repo.find(&predicate).unwrap()), vec!["TESTE-B"]);

    let either = Person::name_equals("OUTRO").or(Person::name_equals("TESTE-A"));
    assert_eq!(
        names(&repo.find(&either).unwrap()),
        vec!["TESTE-A", "OUTRO"]
    );
}

#[test]
fn unknown_predicate_column_is_a_query_error() {
    let container = container();
    let scope = container.begin_scope().unwrap();

    let err = scope
        .person_repository()
        .find(&Predicate::eq("email", "a@b.c"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Query(QueryError::UnknownColumn {
            table: "person",
            column: "email"
        })
    ));
}

#[test]
fn commit_applies_nothing_when_one_write_violates_a_constraint() {
    let container = container();
    let scope = container.begin_scope().unwrap();
    let people = scope.person_repository();
    let labels = scope.repository::<Label>();
    let unit_of_work = scope.resolve_unit_of_work();

    labels.add(&Label::new("taken")).unwrap();
    unit_of_work.commit().unwrap();

    people.add(&Person::new("staged before the conflict")).unwrap();
    labels.add(&Label::new("fresh")).unwrap();
    labels.add(&Label::new("taken")).unwrap();

    let err = unit_of_work.commit().unwrap_err();
    assert!(matches!(err, RepoError::Persistence(DbError::Sqlite(_))));

    assert!(people.get_all().unwrap().is_empty());
    let label_names = labels
        .get_all()
        .unwrap()
        .into_iter()
        .map(|label| label.name)
        .collect::<Vec<_>>();
    assert_eq!(label_names, vec!["taken".to_string()]);

    // The failed batch is gone; the context keeps working.
    assert_eq!(scope.resolve_context().pending_count().unwrap(), 0);
    people.add(&Person::new("after rollback")).unwrap();
    assert_eq!(unit_of_work.commit().unwrap(), 1);
}

#[test]
fn store_check_constraint_rolls_back_unvalidated_set_writes() {
    let container = container();
    let context = container.resolve_context().unwrap();
    let people = context.set::<Person>();

    people.add(&Person::new("valid")).unwrap();
    people.add(&Person::new("y".repeat(150))).unwrap();

    assert!(matches!(
        context.commit().unwrap_err(),
        RepoError::Persistence(_)
    ));
    assert!(people.to_list().unwrap().is_empty());
}

#[test]
fn releasing_a_shared_repository_keeps_the_context_open() {
    let container = container();
    let scope = container.begin_scope().unwrap();
    let mut first = scope.person_repository();
    let second = scope.person_repository();
    assert_eq!(first.ownership(), ContextOwnership::Shared);

    first.release().unwrap();

    assert!(first.is_released());
    assert!(!scope.resolve_context().is_released());
    second.add(&Person::new("still works")).unwrap();
    assert_eq!(scope.resolve_unit_of_work().commit().unwrap(), 1);

    let err = first.get_all().unwrap_err();
    assert!(matches!(
        err,
        RepoError::InvalidState(InvalidStateError::Released {
            target: "repository",
            ..
        })
    ));
    assert!(first.release().is_err());
}

#[test]
fn releasing_an_owning_repository_closes_its_context() {
    let context = Arc::new(open_person_context());
    let mut repo = RepositoryBase::<Person>::owning(Arc::clone(&context));

    repo.add(&Person::new("owned")).unwrap();
    context.commit().unwrap();
    repo.release().unwrap();

    assert!(context.is_released());
    assert!(context.commit().is_err());
}

#[test]
fn dropping_an_owning_repository_closes_its_context() {
    let context = Arc::new(open_person_context());
    {
        let _repo = RepositoryBase::<Person>::owning(Arc::clone(&context));
    }
    assert!(context.is_released());

    let shared_context = Arc::new(open_person_context());
    {
        let _repo = RepositoryBase::<Person>::new(Arc::clone(&shared_context));
    }
    assert!(!shared_context.is_released());
}

#[test]
fn generic_repository_serves_any_registered_entity() {
    let container = container();
    let scope = container.begin_scope().unwrap();
    let labels = scope.repository::<Label>();

    labels.add(&Label::new("alpha")).unwrap();
    labels.add(&Label::new("beta")).unwrap();
    assert_eq!(scope.resolve_unit_of_work().commit().unwrap(), 2);

    let beta = labels
        .find(&Predicate::eq("name", "beta"))
        .unwrap()
        .pop()
        .unwrap();
    labels.delete(beta.id.unwrap()).unwrap();
    scope.resolve_unit_of_work().commit().unwrap();

    let remaining = labels.get_all().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "alpha");
}

fn open_person_context() -> DbContext {
    let model = StoreModel::new().with::<Person>().unwrap();
    DbContext::open(&StoreTarget::InMemory, DEFAULT_BUSY_TIMEOUT, Arc::new(model)).unwrap()
}
