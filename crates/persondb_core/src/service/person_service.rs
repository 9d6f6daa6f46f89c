//! Person repository facade.
//!
//! # Responsibility
//! - Expose the ten people-collection use-cases as single entry points.
//! - Parse caller-provided ids and resolve "not found" explicitly.
//!
//! # Invariants
//! - Lookups that may legitimately miss return `Ok(None)`.
//! - Mutations that need a target return `RepoError::NotFound` when absent.
//! - `append_favorite_food_by_id` is read-then-write and not atomic; a
//!   concurrent writer between the two steps is overwritten (last write wins).

use crate::model::person::{NewPerson, Person, PersonId, PersonWithoutAge};
use crate::repo::person_repo::{
    DeleteSummary, PersonFilter, PersonLookup, PersonQuery, PersonRepository, PersonSort,
    RepoError, RepoResult,
};
use log::debug;

/// Maximum number of documents returned by `query_chain`.
pub const QUERY_CHAIN_LIMIT: u32 = 2;

/// Use-case facade over a person repository implementation.
pub struct PersonService<R: PersonRepository> {
    repo: R,
}

impl<R: PersonRepository> PersonService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Inserts one person and returns it with its assigned id.
    pub fn create_one(&self, person: &NewPerson) -> RepoResult<Person> {
        let stored = self.repo.insert_one(person)?;
        debug!(
            "event=person_create module=service status=ok id={}",
            stored.id
        );
        Ok(stored)
    }

    /// Inserts all people in one all-or-nothing batch.
    pub fn create_many(&self, people: &[NewPerson]) -> RepoResult<Vec<Person>> {
        let stored = self.repo.insert_many(people)?;
        debug!(
            "event=person_create_many module=service status=ok count={}",
            stored.len()
        );
        Ok(stored)
    }

    /// Returns every person with exactly this name, in insertion order.
    pub fn find_by_name(&self, name: &str) -> RepoResult<Vec<Person>> {
        self.repo.find(&PersonQuery {
            filter: PersonFilter::by_name(name),
            ..PersonQuery::default()
        })
    }

    pub fn find_one_by_favorite_food(&self, food: &str) -> RepoResult<Option<Person>> {
        self.repo.find_one(&PersonFilter::by_favorite_food(food))
    }

    /// Looks a person up by id.
    ///
    /// # Errors
    /// - `RepoError::MalformedId` (a query error) when `id` does not parse.
    pub fn find_by_id(&self, id: &str) -> RepoResult<Option<Person>> {
        let id = PersonId::parse(id)?;
        self.repo.find_by_id(id)
    }

    /// Appends `food` to the person's favorite foods and persists the document.
    pub fn append_favorite_food_by_id(&self, id: &str, food: &str) -> RepoResult<Person> {
        let id = PersonId::parse(id)?;
        let mut person = self
            .repo
            .find_by_id(id)?
            .ok_or(RepoError::NotFound(PersonLookup::Id(id)))?;

        person.push_favorite_food(food);
        let saved = self.repo.save(&person)?;
        debug!(
            "event=person_append_food module=service status=ok id={} food_count={}",
            saved.id,
            saved.favorite_foods.len()
        );
        Ok(saved)
    }

    /// Overwrites `age` on the first person with this name.
    pub fn set_age_by_name(&self, name: &str, age: i64) -> RepoResult<Person> {
        let updated = self
            .repo
            .find_one_and_set_age(&PersonFilter::by_name(name), age)?
            .ok_or_else(|| RepoError::NotFound(PersonLookup::Name(name.to_string())))?;
        debug!(
            "event=person_set_age module=service status=ok id={}",
            updated.id
        );
        Ok(updated)
    }

    /// Removes one person, returning the removed document when it existed.
    pub fn delete_by_id(&self, id: &str) -> RepoResult<Option<Person>> {
        let id = PersonId::parse(id)?;
        let removed = self.repo.delete_by_id(id)?;
        debug!(
            "event=person_delete module=service status=ok id={} found={}",
            id,
            removed.is_some()
        );
        Ok(removed)
    }

    pub fn delete_many_by_name(&self, name: &str) -> RepoResult<DeleteSummary> {
        let summary = self.repo.delete_many(&PersonFilter::by_name(name))?;
        debug!(
            "event=person_delete_many module=service status=ok deleted_count={}",
            summary.deleted_count
        );
        Ok(summary)
    }

    /// People who like `food`, sorted by name ascending, at most
    /// `QUERY_CHAIN_LIMIT` of them, without `age`.
    pub fn query_chain(&self, food: &str) -> RepoResult<Vec<PersonWithoutAge>> {
        self.repo.find_without_age(&PersonQuery {
            filter: PersonFilter::by_favorite_food(food),
            sort: Some(PersonSort::NameAsc),
            limit: Some(QUERY_CHAIN_LIMIT),
            offset: 0,
        })
    }
}
