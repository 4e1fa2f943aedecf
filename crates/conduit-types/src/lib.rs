//! # conduit-types
//!
//! Domain types for conduit capability servers.
//! This crate contains pure data types with no I/O and no async
//! (serde is the only external dependency).

pub mod capability;
pub mod content;
pub mod error;

// Re-exports for convenience.
pub use capability::{
    build_input_schema, ArgumentSpec, CapabilityDescriptor, CapabilityKind, CapabilitySchema,
    PromptArgument,
};
pub use content::{CapabilityResponse, ContentItem};
pub use error::{ConduitError, DiagnosticError, ErrorKind};
