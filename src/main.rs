use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use configuration::{Config, LogFormat};
use core_types::Person;
// Import database types directly from the database crate
use database::connection::{connect, run_migrations};
use database::repository::DbRepository;
use std::path::PathBuf;

mod demo;

/// The main entry point for the notes demo application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if there is one.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // An explicitly passed file must exist; the implicit `config.toml` may not.
    let mut config = match &cli.config {
        Some(path) => configuration::load_config_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => configuration::load_config().context("Failed to load configuration")?,
    };
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    let _log_guard = configuration::init_tracing(&config.logging)?;
    config.validate()?;

    // Initialize the database connection and run migrations
    let db_pool = connect(&config.database)
        .await
        .context("Failed to connect to the database")?;
    if config.database.run_migrations && !cli.skip_migrations {
        run_migrations(&db_pool)
            .await
            .context("Failed to run database migrations")?;
    }

    let repo = DbRepository::new(db_pool);

    // Execute the appropriate command
    let command = cli.command.unwrap_or(Commands::Demo);
    let result = run_command(command, &repo, &config).await;

    // The pool is closed whether or not the command succeeded. An error is
    // reported once, by the `anyhow` return from `main`.
    repo.close().await;
    result
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Persists and queries persons and their notes on PostgreSQL.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Without it, `config.toml` is
    /// used when present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured console log format.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Do not apply the embedded schema migrations at startup.
    #[arg(long)]
    skip_migrations: bool,

    /// Defaults to `demo` when omitted.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full demo: save, add a note, load, rename, summarize.
    Demo,
    /// Print one person with all of their notes.
    Show {
        #[arg(long)]
        id: i64,
    },
    /// Print every person with their note count.
    List,
    /// Add a note to an existing person.
    AddNote {
        #[arg(long)]
        person_id: i64,
        #[arg(long)]
        text: String,
    },
    /// Delete a single note.
    RemoveNote {
        #[arg(long)]
        id: i64,
    },
    /// Prefix every person's first name with the configured prefix.
    MakeReactive,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn run_command(command: Commands, repo: &DbRepository, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Demo => demo::run(repo, &config.demo).await,
        Commands::Show { id } => {
            let person = repo.get_person_with_notes_by_id(id).await?;
            println!("{}", person);
            Ok(())
        }
        Commands::List => {
            let persons = repo.get_all_persons_with_notes().await?;
            println!("{}", persons_table(&persons));
            Ok(())
        }
        Commands::AddNote { person_id, text } => {
            let note = repo.add_note_by_person_id(person_id, &text).await?;
            println!("{}", note);
            Ok(())
        }
        Commands::RemoveNote { id } => {
            repo.remove_note_by_id(id).await?;
            println!("Removed note {}", id);
            Ok(())
        }
        Commands::MakeReactive => {
            let renamed = repo
                .make_all_persons_reactive(&config.demo.reactive_prefix)
                .await?;
            println!("Renamed {} persons", renamed);
            Ok(())
        }
    }
}

fn persons_table(persons: &[Person]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Id", "First name", "Notes"]);

    for person in persons {
        let id = person.id.map(|id| id.to_string()).unwrap_or_default();
        table.add_row(vec![
            id,
            person.first_name.clone(),
            person.note_count().to_string(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use core_types::Note;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn demo_is_the_default_command() {
        let cli = Cli::parse_from(["reactive-notes"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
        assert!(!cli.skip_migrations);
    }

    #[test]
    fn explicit_config_path_is_kept() {
        let cli = Cli::parse_from(["reactive-notes", "--config", "staging.toml", "list"]);
        assert_eq!(cli.config, Some(PathBuf::from("staging.toml")));
        assert!(matches!(cli.command, Some(Commands::List)));
    }

    #[test]
    fn subcommands_parse_their_arguments() {
        let cli = Cli::parse_from([
            "reactive-notes",
            "--log-format",
            "compact",
            "add-note",
            "--person-id",
            "4",
            "--text",
            "hello",
        ]);
        assert_eq!(cli.log_format, Some(LogFormat::Compact));
        match cli.command {
            Some(Commands::AddNote { person_id, text }) => {
                assert_eq!(person_id, 4);
                assert_eq!(text, "hello");
            }
            _ => panic!("expected add-note"),
        }
    }

    #[test]
    fn table_lists_note_counts() {
        let persons = vec![
            Person::from_row(1, "Reactive Andrii")
                .add_note(Note::new("a"))
                .add_note(Note::new("b")),
            Person::from_row(2, "Olena"),
        ];

        let rendered = persons_table(&persons).to_string();
        assert!(rendered.contains("Reactive Andrii"));
        assert!(rendered.contains("Olena"));
        assert!(rendered.contains("First name"));
    }
}
