//! # Notes Database Crate
//!
//! This crate is the application's persistence layer for `Person` and `Note`
//! entities on PostgreSQL.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives here. The rest of the application works with
//!   `core-types` entities and never sees a row type.
//! - **Units of Work:** Every operation runs inside a session (one pooled
//!   connection) or a transaction opened by `SessionFactory`. Statements take a
//!   `&mut PgConnection`, so several of them compose inside one unit of work.
//! - **Asynchronous & Pooled:** All operations are asynchronous and share a
//!   connection pool (`PgPool`).
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: Applies the embedded schema migrations.
//! - `SessionFactory`: Runs closures inside a session or a transaction.
//! - `DbRepository`: High-level operations (e.g., `save_person_with_a_note`).
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;
pub mod session;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::DbRepository;
pub use session::SessionFactory;
