//! CLI smoke entry point.
//!
//! Runs one add/update/delete cycle inside a single scope and prints each
//! step, against an in-memory store or the SQLite file given as first argument.
//! Set `UNITWORK_LOG_DIR` to an absolute path to enable file logging.

use std::process::ExitCode;
use unitwork_core::{
    core_version, default_log_level, init_logging, Container, ContainerConfig,
    DefaultPersonService, PersonModel, ServiceError, StoreTarget,
};

const PERSON_NAME: &str = "TESTE-CRUD";

fn main() -> ExitCode {
    let store = match std::env::args().nth(1) {
        Some(path) => StoreTarget::file(path),
        None => StoreTarget::InMemory,
    };
    println!("unitwork_core version={}", core_version());

    if let Ok(log_dir) = std::env::var("UNITWORK_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match run(ContainerConfig::scoped(store)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            eprintln!("unitwork error: added person `{PERSON_NAME}` was not found");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("unitwork error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `false` when the person just added cannot be found again.
fn run(config: ContainerConfig) -> Result<bool, ServiceError> {
    let container = Container::bootstrap(config)?;

    container.with_scope(|scope| -> Result<bool, ServiceError> {
        let service = scope.person_service();

        let added = service.add(&PersonModel::named(PERSON_NAME))?;
        println!("add affected={added}");

        let Some(mut person) = find_first(&service, PERSON_NAME)? else {
            return Ok(false);
        };
        person.nome = Some("TESTE".to_string());
        println!("update affected={}", service.update(&person)?);
        println!("delete affected={}", service.delete(&person)?);
        println!("remaining={}", service.get_all()?.len());
        Ok(true)
    })
}

fn find_first(
    service: &DefaultPersonService,
    name: &str,
) -> Result<Option<PersonModel>, ServiceError> {
    Ok(service.get_by_name(name)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::{find_first, run, PERSON_NAME};
    use unitwork_core::{Container, ContainerConfig, PersonModel, StoreTarget};

    #[test]
    fn smoke_cycle_succeeds_in_memory() {
        assert!(run(ContainerConfig::scoped(StoreTarget::InMemory)).unwrap());
    }

    #[test]
    fn missing_person_is_reported_instead_of_defaulted() {
        let container = Container::bootstrap(ContainerConfig::default()).unwrap();
        let service = container.resolve_person_service().unwrap();

        assert!(find_first(&service, PERSON_NAME).unwrap().is_none());

        service.add(&PersonModel::named(PERSON_NAME)).unwrap();
        let found = find_first(&service, PERSON_NAME).unwrap().unwrap();
        assert!(found.id.is_some());
    }
}
