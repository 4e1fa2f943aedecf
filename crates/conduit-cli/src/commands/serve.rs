//! `conduit serve` command.
//!
//! Runs one demo server over stdio until stdin closes or Ctrl-C.

use clap::Args;

use conduit_config::ConduitConfig;
use conduit_servers::ServerKind;
use conduit_transport_stdio::{McpServer, StdioTransport};

use crate::{output, shared};

/// Start an MCP server on stdin/stdout.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Server to run: notes, earnings, forex, orders or git-prompts.
    pub server: ServerKind,
}

/// Executes the serve command.
pub async fn execute(args: &ServeArgs, config: &ConduitConfig) -> anyhow::Result<()> {
    let handler = shared::build_handler(args.server, config)?;
    let transport = StdioTransport::stdio();
    let mut server = McpServer::new(transport, handler);
    tracing::info!(server = %args.server, "conduit MCP server ready on stdio");

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                return Err(output::report(e, "serving over stdio"));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    Ok(())
}
