//! rota-ingest library interface
//!
//! Normalization & domain-transformation engine for the service rota:
//! raw schedule rows in, validated canonical records and role-grouped
//! domain views out. Exposed as a library for integration testing and
//! for embedding behind other front ends.

pub mod column_map;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod sources;

pub use crate::config::{IngestSettings, TomlConfig};
pub use crate::ingest::{CheckResult, IngestService, RunOptions, RunResult, RunSummary};
pub use rota_common::{Error, Result};
