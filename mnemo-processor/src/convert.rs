//! Conversion between the core-memory [`mnemo_core::Message`] model
//! and the provider wire types. Tool-response parts travel to the
//! provider as `user`-role tool-result blocks, following the
//! convention most message-oriented providers use for turn ordering.

use mnemo_core::{Message, Part, Role as CoreRole};
use mnemo_provider::{ContentPart, ProviderMessage, Role as WireRole};

/// Convert one core message to its provider-facing form.
pub fn to_provider_message(msg: &Message) -> ProviderMessage {
    let role = match msg.role {
        CoreRole::System => WireRole::System,
        CoreRole::Human => WireRole::User,
        CoreRole::Ai => WireRole::Assistant,
        CoreRole::Tool => WireRole::User,
    };

    let content = msg
        .parts
        .iter()
        .map(|part| match part {
            Part::Text { text } => ContentPart::Text { text: text.clone() },
            Part::ToolCall {
                call_id,
                name,
                arguments,
            } => ContentPart::ToolUse {
                id: call_id.clone(),
                name: name.clone(),
                arguments: arguments.clone(),
            },
            Part::ToolResponse { call_id, content, .. } => ContentPart::ToolResult {
                tool_use_id: call_id.clone(),
                content: content.clone(),
            },
        })
        .collect();

    ProviderMessage { role, content }
}

/// Build an `ai` core message from a provider response's content
/// parts. `ToolResult` parts should never appear in a response and
/// are dropped if a provider misbehaves.
pub fn ai_message_from_parts(parts: &[ContentPart]) -> Message {
    let parts = parts
        .iter()
        .filter_map(|p| match p {
            ContentPart::Text { text } => Some(Part::Text { text: text.clone() }),
            ContentPart::ToolUse { id, name, arguments } => Some(Part::ToolCall {
                call_id: id.clone(),
                name: name.clone(),
                arguments: arguments.clone(),
            }),
            ContentPart::ToolResult { .. } => None,
        })
        .collect();

    Message {
        role: CoreRole::Ai,
        parts,
        created_at: chrono::Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_message_maps_to_user_role_tool_result() {
        let msg = Message {
            role: CoreRole::Tool,
            parts: vec![Part::ToolResponse {
                call_id: "c1".into(),
                name: "Reflect".into(),
                content: "Memory context reflected".into(),
            }],
            created_at: chrono::Utc::now(),
        };
        let provider_msg = to_provider_message(&msg);
        assert_eq!(provider_msg.role, WireRole::User);
        assert!(matches!(provider_msg.content[0], ContentPart::ToolResult { .. }));
    }

    #[test]
    fn ai_message_from_parts_skips_tool_result() {
        let msg = ai_message_from_parts(&[
            ContentPart::Text { text: "hi".into() },
            ContentPart::ToolResult {
                tool_use_id: "c1".into(),
                content: "ignored".into(),
            },
        ]);
        assert_eq!(msg.parts.len(), 1);
    }
}
