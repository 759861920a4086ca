use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database configuration: {0}")]
    ConnectionConfigError(String),

    #[error("Database operation failed: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Refusing to persist invalid data: {0}")]
    InvalidEntity(#[from] CoreError),

    #[error("The requested {entity} with id {id} was not found in the database.")]
    NotFound { entity: &'static str, id: i64 },
}
