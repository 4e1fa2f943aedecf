//! `conduit list` command.

use conduit_servers::ServerKind;

/// Prints each server name with its handshake identity.
pub fn execute() -> anyhow::Result<()> {
    for kind in ServerKind::ALL {
        println!("{:<12} {}", kind.as_str(), kind.server_name());
    }
    Ok(())
}
