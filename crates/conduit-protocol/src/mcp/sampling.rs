//! MCP sampling/createMessage types (server-to-client request).

use serde::{Deserialize, Serialize};

use super::prompts::Role;
use super::tools::ToolContent;

/// One message in a sampling conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingMessage {
    /// Speaker.
    pub role: Role,
    /// Message body.
    pub content: ToolContent,
}

/// Params of an outbound `sampling/createMessage` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageParams {
    /// Conversation to complete.
    pub messages: Vec<SamplingMessage>,
    /// Optional system prompt.
    #[serde(default, rename = "systemPrompt", skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Upper bound on generated tokens.
    #[serde(rename = "maxTokens")]
    pub max_tokens: u32,
}

/// The client's reply to `sampling/createMessage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageResult {
    /// Speaker of the generated message.
    pub role: Role,
    /// Generated content.
    pub content: ToolContent,
    /// Model that produced it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Why generation stopped.
    #[serde(default, rename = "stopReason", skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

impl CreateMessageResult {
    /// The generated text, or the text of an embedded resource.
    pub fn text(&self) -> &str {
        match &self.content {
            ToolContent::Text { text } => text,
            ToolContent::Resource { resource } => &resource.text,
        }
    }
}
