//! # conduit-registry
//!
//! The capability registry: named tools, URI-addressed resources and
//! prompts, each bound to a handler.
//!
//! Registration happens once through [`RegistryBuilder`]; the built
//! [`CapabilityRegistry`] is immutable and meant to be shared behind
//! an `Arc` by every dispatch.

pub mod error;
pub mod handler;
pub mod registry;
pub mod uri_template;

pub use error::RegistryError;
pub use handler::{
    from_fn, Arguments, CapabilityHandler, Continuation, HandlerFault, HandlerOutput,
    Invocation, SamplingRequest, SessionContext,
};
pub use registry::{CapabilityRegistry, RegistryBuilder, Resolved};
pub use uri_template::{TemplateError, UriTemplate};
