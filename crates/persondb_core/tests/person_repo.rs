use persondb_core::db::migrations::latest_version;
use persondb_core::db::open_db_in_memory;
use persondb_core::{
    NewPerson, PersonFilter, PersonLookup, PersonQuery, PersonRepository, PersonSort, RepoError,
    RepoErrorKind, SqlitePersonRepository,
};
use rusqlite::Connection;

#[test]
fn insert_one_assigns_id_and_roundtrips() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let stored = repo
        .insert_one(&NewPerson::new("Alice").with_age(25).with_favorite_foods(["salad", "sushi"]))
        .unwrap();

    let loaded = repo.find_by_id(stored.id).unwrap().unwrap();
    assert_eq!(loaded, stored);
    assert_eq!(loaded.favorite_foods, vec!["salad", "sushi"]);
}

#[test]
fn insert_one_rejects_blank_name_as_write_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let err = repo.insert_one(&NewPerson::new("")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(err.kind(), RepoErrorKind::Write);
}

#[test]
fn insert_many_is_all_or_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let batch = vec![NewPerson::new("Alice"), NewPerson::new(" "), NewPerson::new("Bob")];
    assert!(repo.insert_many(&batch).is_err());
    assert!(repo.find(&PersonQuery::default()).unwrap().is_empty());

    let stored = repo
        .insert_many(&[NewPerson::new("Alice"), NewPerson::new("Bob")])
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_ne!(stored[0].id, stored[1].id);
    assert_eq!(repo.find(&PersonQuery::default()).unwrap(), stored);
}

#[test]
fn find_matches_favorite_food_exactly() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    repo.insert_one(&NewPerson::new("Alice").with_favorite_foods(["burrito bowl"]))
        .unwrap();
    let bob = repo
        .insert_one(&NewPerson::new("Bob").with_favorite_foods(["steak", "burrito"]))
        .unwrap();

    let query = PersonQuery {
        filter: PersonFilter::by_favorite_food("burrito"),
        ..PersonQuery::default()
    };
    let found = repo.find(&query).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, bob.id);
}

#[test]
fn find_one_returns_first_in_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let first = repo
        .insert_one(&NewPerson::new("Zed").with_favorite_foods(["pizza"]))
        .unwrap();
    repo.insert_one(&NewPerson::new("Amy").with_favorite_foods(["pizza"]))
        .unwrap();

    let found = repo
        .find_one(&PersonFilter::by_favorite_food("pizza"))
        .unwrap()
        .unwrap();
    assert_eq!(found.id, first.id);
    assert!(repo
        .find_one(&PersonFilter::by_favorite_food("kale"))
        .unwrap()
        .is_none());
}

#[test]
fn sorted_query_with_limit_and_offset_is_stable() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    repo.insert_many(&[
        NewPerson::new("Carol"),
        NewPerson::new("Alice"),
        NewPerson::new("Bob"),
    ])
    .unwrap();

    let query = PersonQuery {
        sort: Some(PersonSort::NameAsc),
        limit: Some(2),
        offset: 1,
        ..PersonQuery::default()
    };
    let names: Vec<_> = repo
        .find(&query)
        .unwrap()
        .into_iter()
        .map(|person| person.name)
        .collect();
    assert_eq!(names, vec!["Bob", "Carol"]);

    let descending = PersonQuery {
        sort: Some(PersonSort::NameDesc),
        offset: 2,
        ..PersonQuery::default()
    };
    let names: Vec<_> = repo
        .find(&descending)
        .unwrap()
        .into_iter()
        .map(|person| person.name)
        .collect();
    assert_eq!(names, vec!["Alice"]);
}

#[test]
fn save_overwrites_document_and_reports_missing_target() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let mut person = repo.insert_one(&NewPerson::new("Dana")).unwrap();
    person.age = Some(41);
    person.push_favorite_food("ramen");
    repo.save(&person).unwrap();
    assert_eq!(repo.find_by_id(person.id).unwrap().unwrap(), person);

    repo.delete_by_id(person.id).unwrap();
    let err = repo.save(&person).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(PersonLookup::Id(id)) if id == person.id));
}

#[test]
fn find_one_and_set_age_touches_only_first_match() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let stored = repo
        .insert_many(&[
            NewPerson::new("Bob").with_age(40).with_favorite_foods(["steak"]),
            NewPerson::new("Bob").with_age(50),
        ])
        .unwrap();

    let updated = repo
        .find_one_and_set_age(&PersonFilter::by_name("Bob"), 20)
        .unwrap()
        .unwrap();
    assert_eq!(updated.id, stored[0].id);
    assert_eq!(updated.age, Some(20));
    assert_eq!(updated.favorite_foods, vec!["steak"]);

    let second = repo.find_by_id(stored[1].id).unwrap().unwrap();
    assert_eq!(second.age, Some(50));

    assert!(repo
        .find_one_and_set_age(&PersonFilter::by_name("Nobody"), 20)
        .unwrap()
        .is_none());
}

#[test]
fn delete_by_id_returns_removed_document_once() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let stored = repo.insert_one(&NewPerson::new("Eve").with_age(22)).unwrap();
    assert_eq!(repo.delete_by_id(stored.id).unwrap(), Some(stored.clone()));
    assert_eq!(repo.delete_by_id(stored.id).unwrap(), None);
    assert!(repo.find_by_id(stored.id).unwrap().is_none());
}

#[test]
fn delete_many_reports_count() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    repo.insert_many(&[
        NewPerson::new("Mary"),
        NewPerson::new("Mary"),
        NewPerson::new("Mark"),
    ])
    .unwrap();

    let summary = repo.delete_many(&PersonFilter::by_name("Mary")).unwrap();
    assert_eq!(summary.deleted_count, 2);
    assert_eq!(repo.find(&PersonQuery::default()).unwrap().len(), 1);

    let summary = repo.delete_many(&PersonFilter::by_name("Mary")).unwrap();
    assert_eq!(summary.deleted_count, 0);
}

#[test]
fn corrupt_favorite_foods_column_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePersonRepository::try_new(&conn).unwrap();

    let stored = repo.insert_one(&NewPerson::new("Finn")).unwrap();
    conn.execute(
        "UPDATE people SET favorite_foods = '{\"not\":\"a list\"}' WHERE id = ?1;",
        [stored.id.to_string()],
    )
    .unwrap();

    let err = repo.find_by_id(stored.id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
    assert_eq!(err.kind(), RepoErrorKind::Query);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqlitePersonRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_people_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqlitePersonRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("people"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE people (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            age INTEGER
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqlitePersonRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "people",
            column: "favorite_foods"
        })
    ));
}
