//! Application configuration management.
//!
//! Configuration is merged from built-in defaults, an optional TOML file, and
//! environment variables, in increasing order of precedence.

use crate::{Cli, RefreshSchedule, cbr::CbrConfig, partners::PartnersConfig};
use serde::{Deserialize, Serialize};

/// The main application configuration that composes all component configs
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Web server configuration
    #[serde(default)]
    pub server: finance_axum::config::AxumConfig,

    /// Database configuration, including the rate markups
    #[serde(default)]
    pub database: finance_sqlite::config::SqliteConfig,

    /// Exchange rate loading
    #[serde(default)]
    pub rates: RatesConfig,

    /// The partner directory client
    #[serde(default)]
    pub partners: PartnersConfig,
}

/// Where rates come from and when they are loaded
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RatesConfig {
    /// The central bank endpoint and its request policy
    #[serde(flatten)]
    pub source: CbrConfig,

    /// How many days before today to load at startup (0 disables the backfill)
    #[serde(default = "default_backfill_days")]
    pub backfill_days: u32,

    /// How many days the backfill fetches at once
    #[serde(default = "default_backfill_concurrency")]
    pub backfill_concurrency: usize,

    /// The periodic refresh of today's rates
    #[serde(default)]
    pub refresh: RefreshSchedule,
}

fn default_backfill_days() -> u32 {
    30
}

fn default_backfill_concurrency() -> usize {
    8
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            source: CbrConfig::default(),
            backfill_days: default_backfill_days(),
            backfill_concurrency: default_backfill_concurrency(),
            refresh: RefreshSchedule::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file given by the CLI
    /// 3. Default values (lowest priority)
    ///
    /// Environment variables are mapped using the pattern
    /// `APP_<SECTION>__<KEY>` to `<section>.<key>`:
    ///
    /// ```bash
    /// export APP_DATABASE__DATABASE_PATH="/data/finance.db"
    /// export APP_RATES__BACKFILL_DAYS=7
    /// export APP_PARTNERS__URL="http://partners:8080"
    /// ```
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = &cli.config {
            if path.exists() {
                config = config.add_source(config::File::from(path.as_path()))
            } else {
                return Err(anyhow::anyhow!(
                    "Config file {} does not exist",
                    path.display()
                ));
            }
        }

        config = config.add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        config.build()?.try_deserialize().map_err(Into::into)
    }
}
