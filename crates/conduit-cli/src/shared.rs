//! Shared helpers used across CLI commands.
//!
//! Centralises loading configuration and turning a server kind into a
//! ready `McpHandler`, so every command builds servers the same way.

use std::sync::Arc;

use conduit_config::ConduitConfig;
use conduit_mcp::{DispatchOptions, McpHandler};
use conduit_servers::ServerKind;

use crate::output;

/// Loads layered configuration.
///
/// # Errors
///
/// Returns an error if the file or an environment override is malformed.
pub fn load_config(path: Option<&str>) -> anyhow::Result<ConduitConfig> {
    conduit_config::load_config(path).map_err(|e| output::report(e, "loading configuration"))
}

/// Dispatch settings from the `[server]` section.
pub fn dispatch_options(config: &ConduitConfig) -> DispatchOptions {
    DispatchOptions {
        request_timeout: config.server.request_timeout(),
        validation: config.server.validation,
    }
}

/// Builds `kind` and wraps it in a handler.
///
/// # Errors
///
/// Returns an error if a capability fails to register or an HTTP
/// client cannot be created.
pub fn build_handler(kind: ServerKind, config: &ConduitConfig) -> anyhow::Result<McpHandler> {
    let server = conduit_servers::build(kind, config)
        .map_err(|e| output::report(e, &format!("building the {kind} server")))?;
    Ok(McpHandler::new(
        server.name,
        server.version,
        Arc::new(server.registry),
        dispatch_options(config),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_protocol::schema::ValidationMode;
    use std::time::Duration;

    #[test]
    fn options_follow_server_section() {
        let mut config = ConduitConfig::default();
        config.server.request_timeout_secs = 7;
        config.server.validation = ValidationMode::Presence;
        let options = dispatch_options(&config);
        assert_eq!(options.request_timeout, Some(Duration::from_secs(7)));
        assert_eq!(options.validation, ValidationMode::Presence);
    }

    #[test]
    fn zero_timeout_means_no_deadline() {
        let mut config = ConduitConfig::default();
        config.server.request_timeout_secs = 0;
        assert_eq!(dispatch_options(&config).request_timeout, None);
    }

    #[test]
    fn every_server_yields_a_handler() {
        let config = ConduitConfig::default();
        for kind in ServerKind::ALL {
            let handler = build_handler(kind, &config).expect("handler");
            assert_eq!(handler.server_info().name, kind.server_name());
        }
    }
}
