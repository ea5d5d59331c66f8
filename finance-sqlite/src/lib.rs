#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use finance_api::models::RateMarkup;
use sqlx::sqlite;
use std::{str::FromStr, time::Duration};
use tokio::try_join;

pub mod config;
mod error;
mod r#impl;
mod rows;

use config::SqliteConfig;
pub use error::Error;

/// SQLite database implementation of the finance repositories.
///
/// The struct holds separate reader and writer connection pools to one SQLite
/// database. The writer pool is capped to a single connection, so writes are
/// serialized and every transaction sees a consistent snapshot.
///
/// # Example
///
/// ```no_run
/// # use finance_sqlite::{Db, config::SqliteConfig};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Db::open(&SqliteConfig::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Db {
    /// Connection pool for read operations
    pub reader: sqlx::Pool<sqlx::Sqlite>,
    /// Connection pool for write operations (limited to 1 connection)
    pub writer: sqlx::Pool<sqlx::Sqlite>,
    /// Markups applied when storing newly fetched exchange rates
    pub markup: RateMarkup,
}

impl Db {
    /// Open a connection to the specified SQLite database.
    ///
    /// Creates a new database if one doesn't exist (when `create_if_missing` is
    /// true) and applies all pending migrations, which also seed the base
    /// currencies and catalogs.
    ///
    /// The database runs in WAL mode with foreign keys enforced.
    pub async fn open(config: &SqliteConfig) -> Result<Self, Error> {
        let db_path = config
            .database_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());

        let options =
            sqlite::SqliteConnectOptions::from_str(db_path.as_deref().unwrap_or(":memory:"))?
                .busy_timeout(Duration::from_secs(5))
                .foreign_keys(true)
                .journal_mode(sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlite::SqliteSynchronous::Normal)
                .pragma("temp_store", "memory")
                .create_if_missing(config.create_if_missing);

        let reader = sqlite::SqlitePoolOptions::new().connect_with(options.clone());
        let writer = sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options);

        let (reader, writer) = try_join!(reader, writer)?;

        sqlx::migrate!("./schema").run(&writer).await?;

        Ok(Self {
            reader,
            writer,
            markup: config.markup,
        })
    }
}
