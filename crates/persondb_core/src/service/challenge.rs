//! Fixed-argument walkthrough of the people use-cases.
//!
//! Each function runs one facade operation with the sample data and
//! constants of the guided exercise (John Doe, "hamburger", age 20, "Mary",
//! "burrito").

use crate::model::person::{NewPerson, Person, PersonWithoutAge};
use crate::repo::person_repo::{DeleteSummary, PersonRepository, RepoResult};
use crate::service::person_service::PersonService;

pub const FOOD_TO_ADD: &str = "hamburger";
pub const AGE_TO_SET: i64 = 20;
pub const NAME_TO_REMOVE: &str = "Mary";
pub const FOOD_TO_SEARCH: &str = "burrito";

/// The single person saved by `create_and_save_person`.
pub fn sample_person() -> NewPerson {
    NewPerson::new("John Doe")
        .with_age(30)
        .with_favorite_foods(["pizza", "pasta"])
}

/// The batch used by `create_many_people`.
pub fn sample_people() -> Vec<NewPerson> {
    vec![
        NewPerson::new("Alice")
            .with_age(25)
            .with_favorite_foods(["salad", "sushi"]),
        NewPerson::new("Bob")
            .with_age(40)
            .with_favorite_foods(["burgers", "steak"]),
        NewPerson::new("Charlie")
            .with_age(35)
            .with_favorite_foods(["pasta", "pizza"]),
    ]
}

pub fn create_and_save_person<R: PersonRepository>(
    service: &PersonService<R>,
) -> RepoResult<Person> {
    service.create_one(&sample_person())
}

pub fn create_many_people<R: PersonRepository>(
    service: &PersonService<R>,
) -> RepoResult<Vec<Person>> {
    service.create_many(&sample_people())
}

pub fn find_edit_then_save<R: PersonRepository>(
    service: &PersonService<R>,
    person_id: &str,
) -> RepoResult<Person> {
    service.append_favorite_food_by_id(person_id, FOOD_TO_ADD)
}

pub fn find_and_update<R: PersonRepository>(
    service: &PersonService<R>,
    person_name: &str,
) -> RepoResult<Person> {
    service.set_age_by_name(person_name, AGE_TO_SET)
}

pub fn remove_many_people<R: PersonRepository>(
    service: &PersonService<R>,
) -> RepoResult<DeleteSummary> {
    service.delete_many_by_name(NAME_TO_REMOVE)
}

pub fn query_chain_default<R: PersonRepository>(
    service: &PersonService<R>,
) -> RepoResult<Vec<PersonWithoutAge>> {
    service.query_chain(FOOD_TO_SEARCH)
}
