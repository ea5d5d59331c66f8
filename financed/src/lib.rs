#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod breaker;
pub mod cbr;
pub mod impls;
pub mod partners;

mod schedule;
pub use schedule::RefreshSchedule;

mod cli;
pub use cli::Cli;

mod config;
pub use config::{AppConfig, RatesConfig};
