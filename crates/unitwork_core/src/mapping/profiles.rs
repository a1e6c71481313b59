//! Mapping profiles between `Person` and `PersonModel`.

use crate::mapping::{MapResult, Mapper, MappingError};
use crate::model::person::{Person, PersonModel};

/// Profile translating domain entities into application models.
pub const DOMAIN_TO_APPLICATION: &str = "DomainToApplicationProfile";
/// Profile translating application models into domain entities.
pub const APPLICATION_TO_DOMAIN: &str = "ApplicationToDomainProfile";

/// Registers both person profiles on `mapper`.
pub fn register_default_profiles(mapper: &mut Mapper) -> MapResult<()> {
    mapper.register::<Person, PersonModel>(DOMAIN_TO_APPLICATION, person_to_model)?;
    mapper.register::<PersonModel, Person>(APPLICATION_TO_DOMAIN, model_to_person)?;
    Ok(())
}

fn person_to_model(person: &Person) -> MapResult<PersonModel> {
    Ok(PersonModel {
        id: person.id,
        nome: Some(person.nome.clone()),
    })
}

fn model_to_person(model: &PersonModel) -> MapResult<Person> {
    if let Some(id) = model.id {
        if id <= 0 {
            return Err(MappingError::IncompatibleAttribute {
                profile: APPLICATION_TO_DOMAIN,
                attribute: "id",
                reason: format!("store identities are positive, got {id}"),
            });
        }
    }

    let nome = model.nome.clone().ok_or(MappingError::MissingAttribute {
        profile: APPLICATION_TO_DOMAIN,
        attribute: "nome",
    })?;

    Ok(Person { id: model.id, nome })
}
