//! # conduit-mcp
//!
//! Capability dispatch and MCP method handling (APPLICATION layer).
//!
//! [`Dispatcher`] turns one capability request into a response or a
//! suspended sampling call. [`McpHandler`] sits on top of it and maps
//! JSON-RPC methods onto dispatches, guarded by the session state
//! machine in [`Session`].

mod dispatch;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod session;

pub use dispatcher::{CapabilityRequest, Dispatch, DispatchOptions, Dispatcher, PendingSampling};
pub use error::DispatchError;
pub use handler::{JsonRpcOutput, McpHandler, PendingCall, SamplingReply, Step};
pub use session::{Session, SessionState};
