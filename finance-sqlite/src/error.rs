use finance_api::{models::Failure, ports::AsFailure};
use thiserror::Error;

/// Errors produced by the SQLite backend.
///
/// Domain refusals are carried as [`Failure`]s. Constraint violations raised by
/// SQLite itself are translated into the matching failure as well, so callers
/// only ever see `Database` for genuine infrastructure trouble.
#[derive(Debug, Error)]
pub enum Error {
    /// A domain-level refusal
    #[error(transparent)]
    Failure(#[from] Failure),

    /// Error from SQLite operations
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// Error applying the schema migrations
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored JSON payload could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The exchange rate source could not be read
    #[error("rate source error: {0}")]
    RateSource(Box<dyn std::error::Error + Send + Sync>),

    /// A stored value is outside the domain of its type
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &value {
            if db.is_unique_violation() {
                return Self::Failure(Failure::Duplicate);
            }
            if db.is_foreign_key_violation() {
                return Self::Failure(Failure::InUse);
            }
        }
        Self::Database(value)
    }
}

impl AsFailure for Error {
    fn as_failure(&self) -> Option<&Failure> {
        match self {
            Self::Failure(failure) => Some(failure),
            _ => None,
        }
    }
}
