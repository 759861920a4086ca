use crate::error::CoreError;
use std::fmt;

/// A person who owns any number of notes.
///
/// `id` is assigned by the database when the person is first persisted and is
/// `None` before that. The `notes` collection is the inverse side of the
/// relationship: the foreign key lives on [`Note::person_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: Option<i64>,
    pub first_name: String,
    notes: Vec<Note>,
}

/// A single text note belonging to a [`Person`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: Option<i64>,
    pub body: String,
    /// Back-reference to the owning person.
    pub person_id: Option<i64>,
}

impl Person {
    pub fn new(first_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            notes: Vec::new(),
        }
    }

    /// Builds a person from a stored row. The notes collection starts empty
    /// until it is explicitly loaded.
    pub fn from_row(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            first_name: first_name.into(),
            notes: Vec::new(),
        }
    }

    /// Attaches `note` to this person, pointing its back-reference here.
    pub fn add_note(mut self, note: Note) -> Self {
        self.push_note(note);
        self
    }

    /// In-place variant of [`Person::add_note`].
    pub fn push_note(&mut self, mut note: Note) {
        if self.id.is_some() {
            note.person_id = self.id;
        }
        self.notes.push(note);
    }

    /// Replaces the whole collection, e.g. after loading it from storage.
    pub fn replace_notes(&mut self, notes: Vec<Note>) {
        self.notes.clear();
        for note in notes {
            self.push_note(note);
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut [Note] {
        &mut self.notes
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// Assigns the generated id and propagates it to every attached note.
    pub fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
        for note in &mut self.notes {
            note.person_id = Some(id);
        }
    }

    /// Prepends `prefix` to the first name unless it already starts with it.
    /// Returns whether the name changed.
    pub fn apply_prefix(&mut self, prefix: &str) -> bool {
        if self.first_name.starts_with(prefix) {
            return false;
        }
        self.first_name = format!("{} {}", prefix, self.first_name);
        true
    }

    /// Checks the person and all attached notes before they are written.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.first_name.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "first_name".to_string(),
                "must not be empty".to_string(),
            ));
        }
        self.notes.iter().try_for_each(Note::validate)
    }
}

impl Note {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            id: None,
            body: body.into(),
            person_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.body.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "body".to_string(),
                "must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Renders an optional id the way the console output expects (`null` when unset).
struct DisplayId(Option<i64>);

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(id) => write!(f, "{}", id),
            None => f.write_str("null"),
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Person(id={}, firstName={}, notes=[",
            DisplayId(self.id),
            self.first_name
        )?;
        for (i, note) in self.notes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", note)?;
        }
        f.write_str("])")
    }
}

// The owner is left out to keep the output acyclic.
impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Note(id={}, body={})", DisplayId(self.id), self.body)
    }
}

/// One console line summarizing how many notes a person has.
pub fn notes_summary_line(person: &Person) -> String {
    format!("{} has {} notes", person.first_name, person.note_count())
}
