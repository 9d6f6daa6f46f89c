//! Person repository contracts and SQLite document-store implementation.
//!
//! # Responsibility
//! - Provide the primitive collection calls (insert, find, update, delete,
//!   chained query) over the `people` table.
//! - Keep SQL and JSON column encoding inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate documents before any SQL mutation.
//! - "First match" always means first in insertion order (`seq`).
//! - Read paths reject invalid persisted documents instead of masking them.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::person::{
    NewPerson, Person, PersonId, PersonIdError, PersonValidationError, PersonWithoutAge,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PEOPLE_TABLE: &str = "people";
const REQUIRED_COLUMNS: [&str; 5] = ["seq", "id", "name", "age", "favorite_foods"];
const RETURNING_SQL: &str = "RETURNING id, name, age, favorite_foods";

pub type RepoResult<T> = Result<T, RepoError>;

/// Coarse error classes surfaced to callers of the repository facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoErrorKind {
    /// Insert, update or delete failed (validation or store failure).
    Write,
    /// Read failed (malformed id, store failure, unreadable document).
    Query,
    /// A mutation required an existing document and none matched.
    NotFound,
}

/// Target of a lookup that came back empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonLookup {
    Id(PersonId),
    Name(String),
}

impl Display for PersonLookup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id={id}"),
            Self::Name(name) => write!(f, "name={name}"),
        }
    }
}

/// Repository error for person persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(PersonValidationError),
    Write(DbError),
    Query(DbError),
    MalformedId(PersonIdError),
    NotFound(PersonLookup),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    pub fn kind(&self) -> RepoErrorKind {
        match self {
            Self::Validation(_) | Self::Write(_) => RepoErrorKind::Write,
            Self::NotFound(_) => RepoErrorKind::NotFound,
            Self::Query(_)
            | Self::MalformedId(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => RepoErrorKind::Query,
        }
    }

    fn write(err: impl Into<DbError>) -> Self {
        Self::Write(err.into())
    }

    fn query(err: impl Into<DbError>) -> Self {
        Self::Query(err.into())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Write(err) => write!(f, "write failed: {err}"),
            Self::Query(err) => write!(f, "query failed: {err}"),
            Self::MalformedId(err) => write!(f, "{err}"),
            Self::NotFound(lookup) => write!(f, "person not found: {lookup}"),
            Self::InvalidData(message) => write!(f, "invalid persisted person data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Write(err) | Self::Query(err) => Some(err),
            Self::MalformedId(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PersonValidationError> for RepoError {
    fn from(value: PersonValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PersonIdError> for RepoError {
    fn from(value: PersonIdError) -> Self {
        Self::MalformedId(value)
    }
}

/// Equality filter over person documents. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonFilter {
    pub name: Option<String>,
    /// Matches documents whose `favorite_foods` contains this item.
    pub favorite_food: Option<String>,
}

impl PersonFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn by_favorite_food(food: impl Into<String>) -> Self {
        Self {
            favorite_food: Some(food.into()),
            ..Self::default()
        }
    }
}

/// Sort keys supported by chained queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonSort {
    NameAsc,
    NameDesc,
}

/// Filter + sort + limit options for multi-document reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonQuery {
    pub filter: PersonFilter,
    /// `None` keeps insertion order.
    pub sort: Option<PersonSort>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Outcome of a multi-document delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSummary {
    pub deleted_count: u64,
}

/// Repository interface for the people collection.
pub trait PersonRepository {
    fn insert_one(&self, person: &NewPerson) -> RepoResult<Person>;
    /// Inserts all documents or none of them.
    fn insert_many(&self, people: &[NewPerson]) -> RepoResult<Vec<Person>>;
    fn find(&self, query: &PersonQuery) -> RepoResult<Vec<Person>>;
    /// Same as `find`, with `age` left out of every returned document.
    fn find_without_age(&self, query: &PersonQuery) -> RepoResult<Vec<PersonWithoutAge>>;
    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>>;
    /// Overwrites a stored document by id.
    fn save(&self, person: &Person) -> RepoResult<Person>;
    /// Sets `age` on the first match and returns the updated document.
    fn find_one_and_set_age(&self, filter: &PersonFilter, age: i64)
        -> RepoResult<Option<Person>>;
    fn delete_by_id(&self, id: PersonId) -> RepoResult<Option<Person>>;
    fn delete_many(&self, filter: &PersonFilter) -> RepoResult<DeleteSummary>;

    fn find_one(&self, filter: &PersonFilter) -> RepoResult<Option<Person>> {
        let query = PersonQuery {
            filter: filter.clone(),
            limit: Some(1),
            ..PersonQuery::default()
        };
        Ok(self.find(&query)?.into_iter().next())
    }
}

/// SQLite-backed people repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema has
    ///   been tampered with.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn insert_validated(&self, person: &NewPerson) -> RepoResult<Person> {
        let stored = person.clone().into_person(PersonId::generate());
        self.conn
            .execute(
                "INSERT INTO people (id, name, age, favorite_foods)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    stored.id.to_string(),
                    stored.name.as_str(),
                    stored.age,
                    encode_foods(&stored.favorite_foods)?,
                ],
            )
            .map_err(RepoError::write)?;
        Ok(stored)
    }

    fn select_people<T>(
        &self,
        columns: &str,
        query: &PersonQuery,
        parse: impl Fn(&Row<'_>) -> RepoResult<T>,
    ) -> RepoResult<Vec<T>> {
        let mut bind_values = Vec::new();
        let mut sql = format!("SELECT {columns} FROM people WHERE 1 = 1");
        push_filter(&mut sql, &mut bind_values, &query.filter);

        match query.sort {
            Some(PersonSort::NameAsc) => sql.push_str(" ORDER BY name ASC, seq ASC"),
            Some(PersonSort::NameDesc) => sql.push_str(" ORDER BY name DESC, seq ASC"),
            None => sql.push_str(" ORDER BY seq ASC"),
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql).map_err(RepoError::query)?;
        let mut rows = stmt
            .query(params_from_iter(bind_values))
            .map_err(RepoError::query)?;
        let mut people = Vec::new();
        while let Some(row) = rows.next().map_err(RepoError::query)? {
            people.push(parse(row)?);
        }

        Ok(people)
    }

    /// Runs a mutating statement that returns at most one document.
    fn mutate_returning_one(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Option<Person>> {
        let mut stmt = self.conn.prepare(sql).map_err(RepoError::write)?;
        let mut rows = stmt
            .query(params_from_iter(bind_values))
            .map_err(RepoError::write)?;
        match rows.next().map_err(RepoError::write)? {
            Some(row) => Ok(Some(parse_person_row(row)?)),
            None => Ok(None),
        }
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn insert_one(&self, person: &NewPerson) -> RepoResult<Person> {
        person.validate()?;
        self.insert_validated(person)
    }

    fn insert_many(&self, people: &[NewPerson]) -> RepoResult<Vec<Person>> {
        for person in people {
            person.validate()?;
        }

        let tx = self.conn.unchecked_transaction().map_err(RepoError::write)?;
        let mut stored = Vec::with_capacity(people.len());
        for person in people {
            stored.push(self.insert_validated(person)?);
        }
        tx.commit().map_err(RepoError::write)?;

        Ok(stored)
    }

    fn find(&self, query: &PersonQuery) -> RepoResult<Vec<Person>> {
        self.select_people("id, name, age, favorite_foods", query, parse_person_row)
    }

    fn find_without_age(&self, query: &PersonQuery) -> RepoResult<Vec<PersonWithoutAge>> {
        self.select_people("id, name, favorite_foods", query, parse_projection_row)
    }

    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, age, favorite_foods
                 FROM people
                 WHERE id = ?1;",
            )
            .map_err(RepoError::query)?;
        let mut rows = stmt.query([id.to_string()]).map_err(RepoError::query)?;
        match rows.next().map_err(RepoError::query)? {
            Some(row) => Ok(Some(parse_person_row(row)?)),
            None => Ok(None),
        }
    }

    fn save(&self, person: &Person) -> RepoResult<Person> {
        person.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE people
                 SET
                    name = ?1,
                    age = ?2,
                    favorite_foods = ?3,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?4;",
                params![
                    person.name.as_str(),
                    person.age,
                    encode_foods(&person.favorite_foods)?,
                    person.id.to_string(),
                ],
            )
            .map_err(RepoError::write)?;

        if changed == 0 {
            return Err(RepoError::NotFound(PersonLookup::Id(person.id)));
        }

        Ok(person.clone())
    }

    fn find_one_and_set_age(
        &self,
        filter: &PersonFilter,
        age: i64,
    ) -> RepoResult<Option<Person>> {
        let mut bind_values = vec![Value::Integer(age)];
        let mut selector = "SELECT seq FROM people WHERE 1 = 1".to_string();
        push_filter(&mut selector, &mut bind_values, filter);

        let sql = format!(
            "UPDATE people
             SET
                age = ?,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE seq = ({selector} ORDER BY seq ASC LIMIT 1)
             {RETURNING_SQL};"
        );
        self.mutate_returning_one(&sql, bind_values)
    }

    fn delete_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let sql = format!("DELETE FROM people WHERE id = ? {RETURNING_SQL};");
        self.mutate_returning_one(&sql, vec![Value::Text(id.to_string())])
    }

    fn delete_many(&self, filter: &PersonFilter) -> RepoResult<DeleteSummary> {
        let mut bind_values = Vec::new();
        let mut sql = "DELETE FROM people WHERE 1 = 1".to_string();
        push_filter(&mut sql, &mut bind_values, filter);

        let deleted = self
            .conn
            .execute(&sql, params_from_iter(bind_values))
            .map_err(RepoError::write)?;

        Ok(DeleteSummary {
            deleted_count: deleted as u64,
        })
    }
}

fn push_filter(sql: &mut String, bind_values: &mut Vec<Value>, filter: &PersonFilter) {
    if let Some(name) = &filter.name {
        sql.push_str(" AND name = ?");
        bind_values.push(Value::Text(name.clone()));
    }
    if let Some(food) = &filter.favorite_food {
        sql.push_str(
            " AND EXISTS (SELECT 1 FROM json_each(people.favorite_foods) AS food WHERE food.value = ?)",
        );
        bind_values.push(Value::Text(food.clone()));
    }
}

fn encode_foods(foods: &[String]) -> RepoResult<String> {
    serde_json::to_string(foods)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode favorite_foods: {err}")))
}

fn decode_foods(raw: &str) -> RepoResult<Vec<String>> {
    serde_json::from_str(raw).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid favorite_foods value `{raw}` in people.favorite_foods: {err}"
        ))
    })
}

fn parse_id(row: &Row<'_>) -> RepoResult<PersonId> {
    let id_text: String = row.get("id").map_err(RepoError::query)?;
    PersonId::parse(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid id value `{id_text}` in people.id")))
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let foods_text: String = row.get("favorite_foods").map_err(RepoError::query)?;
    let person = Person {
        id: parse_id(row)?,
        name: row.get("name").map_err(RepoError::query)?,
        age: row.get("age").map_err(RepoError::query)?,
        favorite_foods: decode_foods(&foods_text)?,
    };
    person
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("{err} (id={})", person.id)))?;
    Ok(person)
}

fn parse_projection_row(row: &Row<'_>) -> RepoResult<PersonWithoutAge> {
    let foods_text: String = row.get("favorite_foods").map_err(RepoError::query)?;
    Ok(PersonWithoutAge {
        id: parse_id(row)?,
        name: row.get("name").map_err(RepoError::query)?,
        favorite_foods: decode_foods(&foods_text)?,
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn).map_err(RepoError::Query)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [PEOPLE_TABLE],
            |row| row.get(0),
        )
        .map_err(RepoError::query)?;
    if table_exists == 0 {
        return Err(RepoError::MissingRequiredTable(PEOPLE_TABLE));
    }

    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1);")
        .map_err(RepoError::query)?;
    let columns = stmt
        .query_map([PEOPLE_TABLE], |row| row.get::<_, String>(0))
        .map_err(RepoError::query)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(RepoError::query)?;

    for column in REQUIRED_COLUMNS {
        if !columns.iter().any(|existing| existing == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: PEOPLE_TABLE,
                column,
            });
        }
    }

    Ok(())
}
