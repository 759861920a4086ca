//! Runs against a live PostgreSQL server named by `DATABASE_URL`.
//!
//! `sqlx::test` creates a fresh database for every test, applies the
//! embedded migrations to it and drops it afterwards, so the application's
//! own database is never touched.

use database::repository::persist_person;
use database::{DbError, DbRepository};
use core_types::{Note, Person};
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn saved_person_gets_ids_for_itself_and_its_note(pool: PgPool) {
    let repo = DbRepository::new(pool);

    let person = repo
        .save_person_with_a_note("Andrii", "Hello everyone!")
        .await
        .unwrap();

    let person_id = person.id.expect("generated person id");
    assert_eq!(person.note_count(), 1);
    assert!(person.notes()[0].id.is_some());
    assert_eq!(person.notes()[0].person_id, Some(person_id));

    // A plain lookup leaves the relation unloaded.
    let loaded = repo.get_person_by_id(person_id).await.unwrap();
    assert_eq!(loaded.first_name, "Andrii");
    assert_eq!(loaded.note_count(), 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn lazily_loaded_notes_include_notes_added_by_id(pool: PgPool) {
    let repo = DbRepository::new(pool);

    let person = repo
        .save_person_with_a_note("Andrii", "Hello everyone!")
        .await
        .unwrap();
    let person_id = person.id.unwrap();
    let note = repo
        .add_note_by_person_id(person_id, "The second note :)")
        .await
        .unwrap();
    assert_eq!(note.person_id, Some(person_id));

    let loaded = repo.get_person_with_notes_by_id(person_id).await.unwrap();
    let bodies: Vec<_> = loaded.notes().iter().map(|n| n.body.as_str()).collect();
    assert_eq!(bodies, vec!["Hello everyone!", "The second note :)"]);
    assert!(loaded.notes().iter().all(|n| n.person_id == Some(person_id)));
}

#[sqlx::test(migrations = "./migrations")]
async fn join_fetch_agrees_with_lazy_load(pool: PgPool) {
    let repo = DbRepository::new(pool);

    let olena = repo.save_person_with_a_note("Olena", "first").await.unwrap();
    let olena_id = olena.id.unwrap();
    repo.add_note_by_person_id(olena_id, "second").await.unwrap();
    repo.save_person_with_a_note("Taras", "only").await.unwrap();

    let all = repo.get_all_persons_with_notes().await.unwrap();
    let names: Vec<_> = all.iter().map(|p| p.first_name.as_str()).collect();
    assert_eq!(names, vec!["Olena", "Taras"]);

    let lazy = repo.get_person_with_notes_by_id(olena_id).await.unwrap();
    assert_eq!(all[0].note_count(), 2);
    assert_eq!(all[0].notes(), lazy.notes());
    assert_eq!(all[1].note_count(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn make_all_persons_reactive_prefixes_once(pool: PgPool) {
    let repo = DbRepository::new(pool);

    let andrii = repo.save_person_with_a_note("Andrii", "note").await.unwrap();
    let taras = repo
        .save_person_with_a_note("Reactive Taras", "note")
        .await
        .unwrap();

    assert_eq!(repo.make_all_persons_reactive("Reactive").await.unwrap(), 1);
    assert_eq!(repo.make_all_persons_reactive("Reactive").await.unwrap(), 0);

    let andrii = repo.get_person_by_id(andrii.id.unwrap()).await.unwrap();
    let taras = repo.get_person_by_id(taras.id.unwrap()).await.unwrap();
    assert_eq!(andrii.first_name, "Reactive Andrii");
    assert_eq!(taras.first_name, "Reactive Taras");
}

#[sqlx::test(migrations = "./migrations")]
async fn demo_chain_reports_note_counts(pool: PgPool) {
    let repo = DbRepository::new(pool);

    let person = repo
        .save_person_with_a_note("Andrii", "Hello everyone!")
        .await
        .unwrap();
    repo.add_note_by_person_id(person.id.unwrap(), "The second note :)")
        .await
        .unwrap();
    repo.make_all_persons_reactive("Reactive").await.unwrap();

    let lines: Vec<_> = repo
        .get_all_persons_with_notes()
        .await
        .unwrap()
        .iter()
        .map(core_types::notes_summary_line)
        .collect();
    assert_eq!(lines, vec!["Reactive Andrii has 2 notes"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn removing_a_note_shrinks_the_collection(pool: PgPool) {
    let repo = DbRepository::new(pool);

    let person = repo.save_person_with_a_note("Andrii", "keep").await.unwrap();
    let person_id = person.id.unwrap();
    let extra = repo.add_note_by_person_id(person_id, "drop").await.unwrap();

    repo.remove_note_by_id(extra.id.unwrap()).await.unwrap();

    let loaded = repo.get_person_with_notes_by_id(person_id).await.unwrap();
    assert_eq!(loaded.note_count(), 1);
    assert_eq!(loaded.notes()[0].body, "keep");

    let again = repo.remove_note_by_id(extra.id.unwrap()).await;
    assert!(matches!(again, Err(DbError::NotFound { entity: "note", .. })));
}

#[sqlx::test(migrations = "./migrations")]
async fn missing_rows_are_reported_as_not_found(pool: PgPool) {
    let repo = DbRepository::new(pool);

    let missing = i64::MAX;
    assert!(matches!(
        repo.get_person_by_id(missing).await,
        Err(DbError::NotFound { entity: "person", .. })
    ));
    assert!(matches!(
        repo.add_note_by_person_id(missing, "orphan").await,
        Err(DbError::NotFound { entity: "person", .. })
    ));
}

#[sqlx::test(migrations = "./migrations")]
async fn failed_transaction_is_rolled_back(pool: PgPool) {
    let repo = DbRepository::new(pool);
    let mut person = Person::new("Ghost").add_note(Note::new("never stored"));

    let result: Result<(), DbError> = repo
        .sessions()
        .with_transaction(move |conn| {
            Box::pin(async move {
                persist_person(conn, &mut person).await?;
                Err::<(), DbError>(DbError::NotFound { entity: "person", id: 0 })
            })
        })
        .await;
    assert!(result.is_err());

    let persons: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM person")
        .fetch_one(repo.sessions().pool())
        .await
        .unwrap();
    let notes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM note")
        .fetch_one(repo.sessions().pool())
        .await
        .unwrap();
    assert_eq!((persons, notes), (0, 0));
}

#[sqlx::test(migrations = "./migrations")]
async fn invalid_entities_are_rejected_before_writing(pool: PgPool) {
    let repo = DbRepository::new(pool);

    let result = repo.save_person_with_a_note("   ", "body").await;
    assert!(matches!(result, Err(DbError::InvalidEntity(_))));

    let persons: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM person")
        .fetch_one(repo.sessions().pool())
        .await
        .unwrap();
    assert_eq!(persons, 0);
}
