//! Person domain model.
//!
//! # Responsibility
//! - Define the single document shape stored in the `people` collection.
//! - Provide write-side validation shared by every insert/update path.
//!
//! # Invariants
//! - `id` is assigned by the store on insert and never changes afterwards.
//! - `name` is required and must contain at least one non-whitespace char.
//! - `favorite_foods` keeps caller-provided order; duplicates are allowed.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Opaque store-assigned identifier for a stored person document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(Uuid);

impl PersonId {
    /// Allocates a fresh identifier. Only the store calls this on insert.
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a caller-provided identifier string.
    pub fn parse(value: &str) -> Result<Self, PersonIdError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| PersonIdError(value.to_string()))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Display for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PersonId {
    type Err = PersonIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Identifier text that does not parse as a person id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonIdError(pub String);

impl Display for PersonIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed person id `{}`", self.0)
    }
}

impl Error for PersonIdError {}

/// Write-side validation failures for person documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    /// `name` is missing or blank.
    MissingName,
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "person validation failed: `name` is required"),
        }
    }
}

impl Error for PersonValidationError {}

/// Insert payload: a person document before the store assigns its id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default)]
    pub favorite_foods: Vec<String>,
}

impl NewPerson {
    /// Creates a payload carrying only the required `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: None,
            favorite_foods: Vec::new(),
        }
    }

    pub fn with_age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_favorite_foods<I, S>(mut self, foods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.favorite_foods = foods.into_iter().map(Into::into).collect();
        self
    }

    /// Validates insert-time invariants.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        validate_name(&self.name)
    }

    pub(crate) fn into_person(self, id: PersonId) -> Person {
        Person {
            id,
            name: self.name,
            age: self.age,
            favorite_foods: self.favorite_foods,
        }
    }
}

/// Stored person document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default)]
    pub favorite_foods: Vec<String>,
}

impl Person {
    /// Validates the document before it is written back.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        validate_name(&self.name)
    }

    /// Appends one item at the end of `favorite_foods`.
    pub fn push_favorite_food(&mut self, food: impl Into<String>) {
        self.favorite_foods.push(food.into());
    }

    pub fn likes(&self, food: &str) -> bool {
        self.favorite_foods.iter().any(|item| item == food)
    }
}

/// Projection of a person document without the `age` field.
///
/// Returned by chained queries that exclude `age` from the output; the type
/// has no such field, so no result can carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonWithoutAge {
    pub id: PersonId,
    pub name: String,
    #[serde(default)]
    pub favorite_foods: Vec<String>,
}

impl From<Person> for PersonWithoutAge {
    fn from(value: Person) -> Self {
        Self {
            id: value.id,
            name: value.name,
            favorite_foods: value.favorite_foods,
        }
    }
}

fn validate_name(name: &str) -> Result<(), PersonValidationError> {
    if name.trim().is_empty() {
        return Err(PersonValidationError::MissingName);
    }
    Ok(())
}
