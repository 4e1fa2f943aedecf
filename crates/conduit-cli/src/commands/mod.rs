//! CLI command definitions.

pub mod inspect;
pub mod list;
pub mod serve;
