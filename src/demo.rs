use anyhow::Context;
use configuration::DemoSettings;
use core_types::{notes_summary_line, Person};
use database::DbRepository;

/// Runs the fixed demo scenario, printing results to stdout.
///
/// Each step opens its own session or transaction. The first failure stops
/// the chain.
pub async fn run(repo: &DbRepository, settings: &DemoSettings) -> anyhow::Result<()> {
    let person = repo
        .save_person_with_a_note(&settings.person_name, &settings.first_note)
        .await
        .context("Failed to save person with a note")?;
    let person_id = person
        .id
        .context("Saved person has no generated id")?;

    repo.add_note_by_person_id(person_id, &settings.second_note)
        .await
        .context("Failed to add the second note")?;

    let person = repo
        .get_person_with_notes_by_id(person_id)
        .await
        .context("Failed to load person with notes")?;
    println!("{}", person);

    repo.make_all_persons_reactive(&settings.reactive_prefix)
        .await
        .context("Failed to rename persons")?;

    let persons = repo
        .get_all_persons_with_notes()
        .await
        .context("Failed to load all persons")?;
    print_number_of_notes_per_person(&persons);

    Ok(())
}

pub fn print_number_of_notes_per_person(persons: &[Person]) {
    for person in persons {
        println!("{}", notes_summary_line(person));
    }
}
