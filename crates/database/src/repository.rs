use crate::session::SessionFactory;
use crate::DbError;
use core_types::{Note, Person};
use sqlx::postgres::PgPool;
use sqlx::{FromRow, PgConnection};
use std::collections::HashMap;

// ==============================================================================
// Row Types
// ==============================================================================

/// A row from the `person` table.
#[derive(Debug, Clone, FromRow)]
pub struct DbPerson {
    pub id: i64,
    pub first_name: String,
}

/// A row from the `note` table.
#[derive(Debug, Clone, FromRow)]
pub struct DbNote {
    pub id: i64,
    pub body: String,
    pub person_id: i64,
}

/// One row of `person LEFT JOIN note`. The note columns are NULL for a person
/// without notes.
#[derive(Debug, Clone, FromRow)]
pub struct PersonNoteRow {
    pub person_id: i64,
    pub first_name: String,
    pub note_id: Option<i64>,
    pub body: Option<String>,
}

impl From<DbPerson> for Person {
    fn from(row: DbPerson) -> Self {
        Person::from_row(row.id, row.first_name)
    }
}

impl From<DbNote> for Note {
    fn from(row: DbNote) -> Self {
        Note {
            id: Some(row.id),
            body: row.body,
            person_id: Some(row.person_id),
        }
    }
}

/// Folds joined rows into distinct persons, keeping first-seen order.
///
/// Rows whose note columns are NULL contribute the person with no notes.
pub fn assemble_persons(rows: Vec<PersonNoteRow>) -> Vec<Person> {
    let mut persons: Vec<Person> = Vec::new();
    let mut index_by_id: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let idx = *index_by_id.entry(row.person_id).or_insert_with(|| {
            persons.push(Person::from_row(row.person_id, row.first_name.clone()));
            persons.len() - 1
        });

        if let (Some(note_id), Some(body)) = (row.note_id, row.body) {
            persons[idx].push_note(Note {
                id: Some(note_id),
                body,
                person_id: Some(row.person_id),
            });
        }
    }

    persons
}

// ==============================================================================
// Statements
// ==============================================================================
// These run on whatever connection the caller holds, so they compose inside
// one session or transaction.

/// Inserts `person` and cascades the insert to every attached note.
/// Generated ids are written back into the entities.
pub async fn persist_person(conn: &mut PgConnection, person: &mut Person) -> Result<(), DbError> {
    person.validate()?;

    let person_id: i64 =
        sqlx::query_scalar("INSERT INTO person (first_name) VALUES ($1) RETURNING id")
            .bind(&person.first_name)
            .fetch_one(&mut *conn)
            .await?;
    person.assign_id(person_id);

    for note in person.notes_mut() {
        insert_note(&mut *conn, person_id, note).await?;
    }

    tracing::debug!(person_id, notes = person.note_count(), "Persisted person");
    Ok(())
}

/// Inserts a note for an already stored person.
///
/// Returns `NotFound` when no person has `person_id`.
pub async fn persist_note(
    conn: &mut PgConnection,
    person_id: i64,
    note: &mut Note,
) -> Result<(), DbError> {
    note.validate()?;
    insert_note(conn, person_id, note).await?;
    tracing::debug!(person_id, note_id = note.id, "Persisted note");
    Ok(())
}

async fn insert_note(conn: &mut PgConnection, person_id: i64, note: &mut Note) -> Result<(), DbError> {
    let note_id: i64 =
        sqlx::query_scalar("INSERT INTO note (body, person_id) VALUES ($1, $2) RETURNING id")
            .bind(&note.body)
            .bind(person_id)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db) = &e {
                    if db.is_foreign_key_violation() {
                        return DbError::NotFound { entity: "person", id: person_id };
                    }
                }
                DbError::from(e)
            })?;

    note.id = Some(note_id);
    note.person_id = Some(person_id);
    Ok(())
}

/// Loads a person without touching the notes relation.
pub async fn find_person(conn: &mut PgConnection, id: i64) -> Result<Option<Person>, DbError> {
    let row = sqlx::query_as::<_, DbPerson>("SELECT id, first_name FROM person WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(Person::from))
}

/// Initializes the lazy notes relation of an already loaded person.
pub async fn fetch_notes(conn: &mut PgConnection, person: &mut Person) -> Result<(), DbError> {
    let Some(person_id) = person.id else {
        // Never stored, so nothing can point at it.
        person.replace_notes(Vec::new());
        return Ok(());
    };

    let notes = sqlx::query_as::<_, DbNote>(
        "SELECT id, body, person_id FROM note WHERE person_id = $1 ORDER BY id",
    )
    .bind(person_id)
    .fetch_all(&mut *conn)
    .await?;

    person.replace_notes(notes.into_iter().map(Note::from).collect());
    Ok(())
}

/// Loads every person together with all of their notes in a single query.
pub async fn find_all_with_notes(conn: &mut PgConnection) -> Result<Vec<Person>, DbError> {
    let rows = sqlx::query_as::<_, PersonNoteRow>(
        r#"
        SELECT p.id AS person_id, p.first_name, n.id AS note_id, n.body
        FROM person AS p
        LEFT JOIN note AS n ON n.person_id = p.id
        ORDER BY p.id, n.id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(assemble_persons(rows))
}

pub async fn update_first_name(
    conn: &mut PgConnection,
    id: i64,
    first_name: &str,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE person SET first_name = $1 WHERE id = $2")
        .bind(first_name)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound { entity: "person", id });
    }
    Ok(())
}

pub async fn find_note(conn: &mut PgConnection, id: i64) -> Result<Option<Note>, DbError> {
    let row = sqlx::query_as::<_, DbNote>("SELECT id, body, person_id FROM note WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(Note::from))
}

pub async fn remove_note(conn: &mut PgConnection, id: i64) -> Result<(), DbError> {
    sqlx::query("DELETE FROM note WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// ==============================================================================
// Repository
// ==============================================================================

/// The `DbRepository` provides the high-level operations of the notes demo.
/// Each method opens its own session or transaction.
#[derive(Debug, Clone)]
pub struct DbRepository {
    sessions: SessionFactory,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            sessions: SessionFactory::new(pool),
        }
    }

    pub fn sessions(&self) -> &SessionFactory {
        &self.sessions
    }

    /// Creates a person owning a single note, both in one transaction.
    pub async fn save_person_with_a_note(
        &self,
        person_name: &str,
        note_text: &str,
    ) -> Result<Person, DbError> {
        let mut person = Person::new(person_name).add_note(Note::new(note_text));

        let person = self
            .sessions
            .with_transaction(move |conn| {
                Box::pin(async move {
                    persist_person(conn, &mut person).await?;
                    Ok::<_, DbError>(person)
                })
            })
            .await?;

        tracing::info!(person_id = person.id, "Saved person with a note");
        Ok(person)
    }

    /// Adds a note to a stored person, referring to it by id only.
    pub async fn add_note_by_person_id(&self, person_id: i64, note_text: &str) -> Result<Note, DbError> {
        let mut note = Note::new(note_text);

        let note = self
            .sessions
            .with_transaction(move |conn| {
                Box::pin(async move {
                    persist_note(conn, person_id, &mut note).await?;
                    Ok::<_, DbError>(note)
                })
            })
            .await?;

        tracing::info!(person_id, note_id = note.id, "Added note");
        Ok(note)
    }

    /// Fetches a person without its notes.
    pub async fn get_person_by_id(&self, id: i64) -> Result<Person, DbError> {
        self.sessions
            .with_session(move |conn| {
                Box::pin(async move {
                    find_person(conn, id)
                        .await?
                        .ok_or(DbError::NotFound { entity: "person", id })
                })
            })
            .await
    }

    /// Fetches a person, then loads its notes relation within the same session.
    pub async fn get_person_with_notes_by_id(&self, id: i64) -> Result<Person, DbError> {
        self.sessions
            .with_session(move |conn| {
                Box::pin(async move {
                    let mut person = find_person(&mut *conn, id)
                        .await?
                        .ok_or(DbError::NotFound { entity: "person", id })?;
                    fetch_notes(&mut *conn, &mut person).await?;
                    Ok::<_, DbError>(person)
                })
            })
            .await
    }

    /// Fetches all persons with their notes eagerly joined.
    pub async fn get_all_persons_with_notes(&self) -> Result<Vec<Person>, DbError> {
        self.sessions
            .with_session(|conn| Box::pin(find_all_with_notes(conn)))
            .await
    }

    /// Prepends `prefix` to the first name of every person that does not have
    /// it yet. Returns how many persons were renamed.
    pub async fn make_all_persons_reactive(&self, prefix: &str) -> Result<usize, DbError> {
        let prefix = prefix.to_owned();

        let renamed = self
            .sessions
            .with_transaction(move |conn| {
                Box::pin(async move {
                    let mut persons = find_all_with_notes(&mut *conn).await?;
                    let mut renamed: usize = 0;
                    for person in persons.iter_mut() {
                        if !person.apply_prefix(&prefix) {
                            continue;
                        }
                        if let Some(id) = person.id {
                            update_first_name(&mut *conn, id, &person.first_name).await?;
                            renamed += 1;
                        }
                    }
                    Ok::<_, DbError>(renamed)
                })
            })
            .await?;

        tracing::info!(renamed, "Applied name prefix");
        Ok(renamed)
    }

    /// Deletes a single note.
    pub async fn remove_note_by_id(&self, id: i64) -> Result<(), DbError> {
        self.sessions
            .with_transaction(move |conn| {
                Box::pin(async move {
                    let note = find_note(&mut *conn, id)
                        .await?
                        .ok_or(DbError::NotFound { entity: "note", id })?;
                    remove_note(&mut *conn, id).await?;
                    Ok::<_, DbError>(note)
                })
            })
            .await?;

        tracing::info!(note_id = id, "Removed note");
        Ok(())
    }

    /// Closes the underlying pool.
    pub async fn close(&self) {
        self.sessions.close().await;
    }
}
