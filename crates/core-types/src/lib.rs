pub mod entities;
pub mod error;

// Re-export the core types to provide a clean public API.
pub use entities::{notes_summary_line, Note, Person};
pub use error::CoreError;
