//! # conduit-servers
//!
//! The demo capability sets served by the `conduit` binary. Each one
//! registers its tools, resources and prompts into a fresh
//! [`CapabilityRegistry`] and names itself for the handshake.

pub mod earnings;
pub mod error;
pub mod forex;
pub mod git;
pub mod http;
pub mod locks;
pub mod notes;
pub mod orders;

use std::fmt;
use std::str::FromStr;

use conduit_config::ConduitConfig;
use conduit_registry::CapabilityRegistry;

pub use error::ServerError;

/// Which demo server to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerKind {
    Notes,
    Earnings,
    Forex,
    Orders,
    GitPrompts,
}

impl ServerKind {
    /// Every server, in listing order.
    pub const ALL: [ServerKind; 5] = [
        ServerKind::Notes,
        ServerKind::Earnings,
        ServerKind::Forex,
        ServerKind::Orders,
        ServerKind::GitPrompts,
    ];

    /// Command-line name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notes => "notes",
            Self::Earnings => "earnings",
            Self::Forex => "forex",
            Self::Orders => "orders",
            Self::GitPrompts => "git-prompts",
        }
    }

    /// Name advertised in the handshake.
    pub fn server_name(&self) -> &'static str {
        match self {
            Self::Notes => notes::SERVER_NAME,
            Self::Earnings => earnings::SERVER_NAME,
            Self::Forex => forex::SERVER_NAME,
            Self::Orders => orders::SERVER_NAME,
            Self::GitPrompts => git::SERVER_NAME,
        }
    }
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerKind {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ServerError::UnknownServer(s.to_string()))
    }
}

/// A built server: handshake identity plus its frozen registry.
pub struct DemoServer {
    pub name: &'static str,
    pub version: &'static str,
    pub registry: CapabilityRegistry,
}

/// Builds the registry for `kind` from `config`.
pub fn build(kind: ServerKind, config: &ConduitConfig) -> Result<DemoServer, ServerError> {
    let registry = match kind {
        ServerKind::Notes => notes::registry(&config.notes)?,
        ServerKind::Earnings => earnings::registry(&config.alpha_vantage)?,
        ServerKind::Forex => forex::registry(&config.alpha_vantage)?,
        ServerKind::Orders => orders::registry(&config.alpaca)?,
        ServerKind::GitPrompts => git::registry()?,
    };
    Ok(DemoServer {
        name: kind.server_name(),
        version: env!("CARGO_PKG_VERSION"),
        registry,
    })
}
