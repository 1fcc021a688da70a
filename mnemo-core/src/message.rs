//! The message model shared by every component: core memory, archive,
//! and the tool-calling contract between model and executor.

use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The rendered primer and pressure warnings.
    System,
    /// The human caller.
    Human,
    /// The language model.
    Ai,
    /// A tool-response message fed back to the model.
    Tool,
}

impl Role {
    /// Lowercase wire name, also used in the token-accounting encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::Human => "human",
            Role::Ai => "ai",
            Role::Tool => "tool",
        }
    }
}

/// One part of a message's payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// A tool call emitted by the model.
    ToolCall {
        /// Unique id the matching tool response must echo back.
        call_id: String,
        /// Name of the tool to invoke.
        name: String,
        /// Raw JSON-encoded argument string, as emitted by the model.
        arguments: String,
    },
    /// The executor's result for a previously emitted tool call.
    ToolResponse {
        /// Id of the call this responds to.
        call_id: String,
        /// Name of the tool that was invoked.
        name: String,
        /// Result content, always a plain string.
        content: String,
    },
}

impl Part {
    /// Shorthand for a text part.
    pub fn text(s: impl Into<String>) -> Self {
        Part::Text { text: s.into() }
    }
}

/// A role-tagged unit in the core-memory message queue, or in the
/// archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who authored this message.
    pub role: Role,
    /// Ordered payload.
    pub parts: Vec<Part>,
    /// Wall-clock creation time, used for archive ordering and for
    /// the "most-recent N" retention rule.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Message {
    /// Build a single-part text message stamped with the current time.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::text(text)],
            created_at: chrono::Utc::now(),
        }
    }

    /// `true` if every part is plain text (used to distinguish a
    /// final `ai` message from one still carrying tool calls).
    pub fn has_tool_calls(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, Part::ToolCall { .. }))
    }

    /// Concatenate the text of every text part. Tool-call and
    /// tool-response parts contribute nothing here — they're encoded
    /// separately by [`Message::encoded_len_source`].
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// The string fed to the tokenizer for budget accounting:
    /// `"<role>: <concatenated text>"`, with each tool-call part
    /// contributing `"<name> <arguments>"` instead of its (empty)
    /// text.
    pub fn encoded_len_source(&self) -> String {
        let mut body = String::new();
        for part in &self.parts {
            match part {
                Part::Text { text } => body.push_str(text),
                Part::ToolCall { name, arguments, .. } => {
                    body.push_str(name);
                    body.push(' ');
                    body.push_str(arguments);
                }
                Part::ToolResponse { content, .. } => body.push_str(content),
            }
        }
        format!("{}: {body}", self.role.as_str())
    }
}
