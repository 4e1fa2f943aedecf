//! The two-state session machine: `Uninitialized → Ready`.

use std::sync::{Arc, OnceLock};

use conduit_registry::SessionContext;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No handshake yet; only `initialize` is serviced.
    Uninitialized,
    /// Handshake done; all methods are serviced.
    Ready,
}

/// Handshake state for one connection. Written once, read thereafter.
#[derive(Debug, Default)]
pub struct Session {
    context: OnceLock<Arc<SessionContext>>,
}

impl Session {
    /// A session awaiting its handshake.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        match self.context.get() {
            Some(_) => SessionState::Ready,
            None => SessionState::Uninitialized,
        }
    }

    /// Moves to `Ready`. Returns `false` if the handshake already happened,
    /// in which case the stored context is left untouched.
    pub fn establish(&self, context: SessionContext) -> bool {
        self.context.set(Arc::new(context)).is_ok()
    }

    /// The handshake facts, once `Ready`.
    pub fn context(&self) -> Option<Arc<SessionContext>> {
        self.context.get().cloned()
    }
}
