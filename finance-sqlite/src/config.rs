//! Configuration types for the SQLite backend.

use finance_api::models::RateMarkup;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the SQLite backend.
///
/// # Examples
///
/// ```
/// use finance_sqlite::config::SqliteConfig;
/// use std::path::PathBuf;
///
/// // In-memory database (default)
/// let config = SqliteConfig::default();
///
/// // File-based database
/// let config = SqliteConfig {
///     database_path: Some(PathBuf::from("finance.db")),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqliteConfig {
    /// Database file path. If None, uses an in-memory database
    pub database_path: Option<PathBuf>,

    /// Whether to create the database if it doesn't exist
    #[serde(default = "default_true")]
    pub create_if_missing: bool,

    /// Markups applied over official rates when storing exchange rates
    #[serde(default)]
    pub markup: RateMarkup,
}

fn default_true() -> bool {
    true
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            create_if_missing: true,
            markup: RateMarkup::default(),
        }
    }
}
