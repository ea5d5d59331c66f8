#![warn(missing_docs)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

/// Domain models for the finance service.
///
/// These are the data-transfer objects shared between the service and its
/// consumers, along with the fixed-point money types and the [`models::Failure`]
/// enumeration of domain-level refusals.
pub mod models;

/// Interface traits for the finance service.
///
/// This module contains the "ports" in the hexagonal architecture pattern:
/// repository traits implemented by a storage backend, outbound traits for the
/// exchange-rate source and the partner directory, and the [`ports::Application`]
/// trait which ties them together for an API layer.
pub mod ports;
