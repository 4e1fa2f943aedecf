//! # conduit-config
//!
//! Configuration management for conduit servers.
//! Supports layered config: defaults -> file -> env vars.

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_figment, ConfigError};
pub use schema::ConduitConfig;
