//! Runtime configuration.
//!
//! TOML-backed settings with a validation pass; missing files fall back to
//! defaults so the binary runs unconfigured.

mod settings;

pub use settings::{AutoquestConfig, PollingConfig, SnapshotConfig, TaskConfig};
