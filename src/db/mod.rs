//! Database persistence layer for games and user accounts.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only
mod users;

use diesel::Connection;
use diesel::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub use error::{DbError, DbErrorKind};
pub use models::{GameRecord, NewUser, PlayerStanding, User, UserProfile};
pub use repository::GameStore;
pub use users::UserStore;

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies any pending migrations to the database at the given path,
/// creating the database file if it does not exist.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or a migration fails.
pub fn run_migrations(db_path: &str) -> Result<(), DbError> {
    let mut conn = SqliteConnection::establish(db_path)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| DbError::new(format!("Migrations failed: {}", e)))?;
    Ok(())
}
