//! End-to-end coverage of the full agent loop: human input in,
//! through however many tool round-trips the model asks for, to a
//! delivered output — with no live model or filesystem involved.

use std::sync::Arc;

use mnemo_context::WhitespaceTokenizer;
use mnemo_processor::{Agent, AgentConfig};
use mnemo_provider::test_utils::MockProvider;
use mnemo_provider::{ContentPart, ProviderResponse, StopReason};
use mnemo_storage::{MemoryStorage, Storage};

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        content: vec![ContentPart::Text { text: text.into() }],
        stop_reason: StopReason::EndTurn,
    }
}

fn tool_call_response(call_id: &str, name: &str, arguments: serde_json::Value) -> ProviderResponse {
    ProviderResponse {
        content: vec![ContentPart::ToolUse {
            id: call_id.into(),
            name: name.into(),
            arguments: arguments.to_string(),
        }],
        stop_reason: StopReason::ToolUse,
    }
}

#[tokio::test]
async fn fresh_turn_delivers_plain_text_response() {
    let provider = MockProvider::new(vec![text_response("hi")]);
    let config = AgentConfig::new(Arc::new(MemoryStorage::new()), Arc::new(WhitespaceTokenizer), provider);
    let (agent, _handle) = Agent::new(config).await;

    let output = agent.call("hello").await.unwrap();
    assert_eq!(output, "hi");
}

#[tokio::test]
async fn tool_round_trip_reflects_then_delivers_external_output() {
    let provider = MockProvider::new(vec![
        tool_call_response("c1", "Reflect", serde_json::json!({"summary": "user greets"})),
        tool_call_response("c2", "ExternalOutput", serde_json::json!({"finalOutput": "hello back"})),
    ]);
    let storage = Arc::new(MemoryStorage::new());
    let config = AgentConfig::new(storage.clone(), Arc::new(WhitespaceTokenizer), provider);
    let (agent, _handle) = Agent::new(config).await;

    let output = agent.call("hi there").await.unwrap();
    assert_eq!(output, "hello back");
    assert_eq!(storage.load_working_context().await.unwrap(), "user greets");
}

#[tokio::test]
async fn malformed_tool_arguments_are_reported_back_to_the_model() {
    // The first call emits an unparsable Memorize call; the executor
    // reports an ArgumentError as a tool response and the loop asks
    // the model again, which this time finishes cleanly.
    let provider = MockProvider::new(vec![
        ProviderResponse {
            content: vec![ContentPart::ToolUse {
                id: "c1".into(),
                name: "Memorize".into(),
                arguments: "{bad json".into(),
            }],
            stop_reason: StopReason::ToolUse,
        },
        text_response("done"),
    ]);
    let config = AgentConfig::new(Arc::new(MemoryStorage::new()), Arc::new(WhitespaceTokenizer), provider);
    let (agent, _handle) = Agent::new(config).await;

    let output = agent.call("memorize that").await.unwrap();
    assert_eq!(output, "done");
}
