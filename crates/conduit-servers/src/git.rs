//! The git-prompts server: a single commit-message prompt.

use conduit_registry::{from_fn, CapabilityRegistry, HandlerOutput};
use conduit_types::{CapabilityDescriptor, PromptArgument};

use crate::error::ServerError;

pub const SERVER_NAME: &str = "git-prompts-server";

pub fn commit_message_text(changes: &str) -> String {
    format!("Generate a Git commit message summarizing these changes:\n\n{changes}")
}

/// Registers `git-commit`.
pub fn registry() -> Result<CapabilityRegistry, ServerError> {
    let mut builder = CapabilityRegistry::builder();
    builder.register(
        CapabilityDescriptor::prompt(
            "git-commit",
            "Generate a Git commit message from a code diff or change summary",
            vec![PromptArgument::new(
                "changes",
                "Code diff or explanation of the changes made",
                true,
            )],
        ),
        from_fn(|inv| {
            let changes = inv.str_arg("changes").unwrap_or_default();
            Ok(HandlerOutput::Text(commit_message_text(changes)))
        }),
    )?;
    Ok(builder.build())
}
