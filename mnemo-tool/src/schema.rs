//! The fixed tool schema published to the model. Names and argument
//! shapes are contract — callers should not add or rename tools
//! without updating the system prompt that references them.

use mnemo_provider::ToolSchema;
use serde_json::json;

/// Build the eight-tool schema exposed to the model.
pub fn tool_schema() -> Vec<ToolSchema> {
    vec![
        ToolSchema {
            name: "Load".into(),
            description: "Reload the memory context from storage.".into(),
            input_schema: json!({"type": "object", "properties": {}}),
        },
        ToolSchema {
            name: "Save".into(),
            description: "Persist the current memory context to storage.".into(),
            input_schema: json!({"type": "object", "properties": {}}),
        },
        ToolSchema {
            name: "Memorize".into(),
            description: "Archive the current message history into the external archive, \
                summarizing it into the working context."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {"summary": {"type": "string"}},
                "required": ["summary"],
            }),
        },
        ToolSchema {
            name: "Reflect".into(),
            description: "Rewrite the working context from the current conversation, without \
                archiving anything."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {"summary": {"type": "string"}},
                "required": ["summary"],
            }),
        },
        ToolSchema {
            name: "Recall".into(),
            description: "Search the archive for messages matching a substring and pull them \
                back into the conversation."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "limit": {"type": "integer"},
                    "page": {"type": "integer"},
                },
                "required": ["query", "limit", "page"],
            }),
        },
        ToolSchema {
            name: "Think".into(),
            description: "Record a private reasoning step. Has no effect on memory state.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {"thought": {"type": "string"}},
                "required": ["thought"],
            }),
        },
        ToolSchema {
            name: "InternalOutput".into(),
            description: "End this turn's tool loop without producing caller-visible output."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {"finalOutput": {"type": "string"}},
                "required": ["finalOutput"],
            }),
        },
        ToolSchema {
            name: "ExternalOutput".into(),
            description: "End this turn's tool loop and deliver the final output to the caller."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {"finalOutput": {"type": "string"}},
                "required": ["finalOutput"],
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_eight_tools() {
        assert_eq!(tool_schema().len(), 8);
    }

    #[test]
    fn names_are_unique() {
        let names: std::collections::HashSet<_> =
            tool_schema().into_iter().map(|t| t.name).collect();
        assert_eq!(names.len(), 8);
    }
}
