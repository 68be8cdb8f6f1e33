//! Typed errors for the shared database layer

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Errors surfaced while bootstrapping the database
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Connecting to the database or building the pool failed
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Applying the embedded migrations failed
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Missing or malformed connection settings
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
