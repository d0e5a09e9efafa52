use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolchat_model::{
    ErrorKind, MAX_TOOL_CALLS, Message as ModelMessage, ModelFinishReason,
    ModelRequest, ModelResponseEvent, ModelTool, Role,
    ToolCall as ModelToolCall, ToolCallDelta,
};

use crate::Error;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct FunctionChunk {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ToolCallChunk {
    pub index: usize,
    pub id: Option<String>,
    pub function: Option<FunctionChunk>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatCompletionChunk {
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCallChunk>>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct Tool {
    r#type: &'static str,
    function: FunctionTool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct ToolCall {
    id: String,
    r#type: &'static str,
    function: FunctionCall,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Message {
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ChatCompletionRequest {
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    stream: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(req: &ModelRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
        messages: req.messages.iter().map(create_message).collect(),
        tools: req.tools.iter().map(create_tool).collect(),
        stream: true,
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    Message {
        role: msg.role,
        content: msg.content.clone(),
        tool_calls: msg
            .tool_calls
            .as_ref()
            .map(|calls| calls.iter().map(create_tool_call).collect()),
        tool_call_id: msg.tool_call_id.clone(),
        name: msg.name.clone(),
    }
}

#[inline]
fn create_tool_call(call: &ModelToolCall) -> ToolCall {
    ToolCall {
        id: call.id.clone(),
        r#type: "function",
        function: FunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        },
    }
}

#[inline]
fn create_tool(tool: &ModelTool) -> Tool {
    Tool {
        r#type: "function",
        function: FunctionTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

/// Splits a chunk into model events.
///
/// The order of events is important: content first, then tool call
/// fragments, and finally the finish reason if any. Only the first choice
/// is considered, and chunks without choices yield nothing.
///
/// A tool call index at or above [`MAX_TOOL_CALLS`] fails the chunk.
pub fn chunk_events(
    mut chunk: ChatCompletionChunk,
) -> Result<Vec<ModelResponseEvent>, Error> {
    let mut events = vec![];
    if chunk.choices.is_empty() {
        return Ok(events);
    }
    let choice = chunk.choices.swap_remove(0);

    if let Some(content) = choice.delta.content {
        if !content.is_empty() {
            events.push(ModelResponseEvent::ContentDelta(content));
        }
    }
    for tool_call in choice.delta.tool_calls.into_iter().flatten() {
        if tool_call.index >= MAX_TOOL_CALLS {
            return Err(Error::new(
                format!("tool call index {} is out of range", tool_call.index),
                ErrorKind::Decode,
            ));
        }
        let function = tool_call.function.unwrap_or_default();
        events.push(ModelResponseEvent::ToolCallDelta(ToolCallDelta {
            index: tool_call.index,
            id: tool_call.id,
            name: function.name,
            arguments: function.arguments,
        }));
    }
    if let Some(finish_reason) = choice.finish_reason {
        events.push(ModelResponseEvent::Finished(
            ModelFinishReason::from_wire(&finish_reason),
        ));
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use toolchat_model::ModelProviderError;

    use super::*;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::system("You are a User Management Agent."),
                ModelMessage::user("list users named Ann"),
                ModelMessage::assistant(
                    None,
                    vec![ModelToolCall {
                        id: "call_1".to_owned(),
                        name: "search_users".to_owned(),
                        arguments: r#"{"name":"Ann"}"#.to_owned(),
                    }],
                ),
                ModelMessage::tool_result("call_1", "search_users", "[]"),
            ],
            tools: vec![ModelTool {
                name: "search_users".to_owned(),
                description: "Search users".to_owned(),
                parameters: json!({ "type": "object" }),
            }],
        };
        let value = serde_json::to_value(create_request(&request)).unwrap();
        assert_eq!(
            value,
            json!({
                "messages": [
                    { "role": "system", "content": "You are a User Management Agent." },
                    { "role": "user", "content": "list users named Ann" },
                    {
                        "role": "assistant",
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {
                                "name": "search_users",
                                "arguments": "{\"name\":\"Ann\"}"
                            }
                        }]
                    },
                    {
                        "role": "tool",
                        "content": "[]",
                        "tool_call_id": "call_1",
                        "name": "search_users"
                    }
                ],
                "tools": [{
                    "type": "function",
                    "function": {
                        "name": "search_users",
                        "description": "Search users",
                        "parameters": { "type": "object" }
                    }
                }],
                "stream": true
            })
        );
    }

    #[test]
    fn test_create_request_without_tools() {
        let request = ModelRequest {
            messages: vec![ModelMessage::user("Hi")],
            tools: vec![],
        };
        let value = serde_json::to_value(create_request(&request)).unwrap();
        assert!(value.get("tools").is_none());
        assert_eq!(value["stream"], json!(true));
    }

    #[test]
    fn test_chunk_events_order() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "choices": [{
                "delta": {
                    "content": "Let me check.",
                    "tool_calls": [
                        { "index": 1, "function": { "arguments": "{\"na" } },
                        { "index": 0, "id": "call_0", "function": { "name": "search_users" } }
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();
        assert_eq!(
            chunk_events(chunk).unwrap(),
            vec![
                ModelResponseEvent::ContentDelta("Let me check.".to_owned()),
                ModelResponseEvent::ToolCallDelta(ToolCallDelta {
                    index: 1,
                    id: None,
                    name: None,
                    arguments: Some("{\"na".to_owned()),
                }),
                ModelResponseEvent::ToolCallDelta(ToolCallDelta {
                    index: 0,
                    id: Some("call_0".to_owned()),
                    name: Some("search_users".to_owned()),
                    arguments: None,
                }),
                ModelResponseEvent::Finished(ModelFinishReason::ToolCalls),
            ]
        );
    }

    #[test]
    fn test_chunk_without_choices() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "choices": [],
            "prompt_filter_results": []
        }))
        .unwrap();
        assert!(chunk_events(chunk).unwrap().is_empty());

        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "choices": [{ "finish_reason": "stop" }]
        }))
        .unwrap();
        assert_eq!(
            chunk_events(chunk).unwrap(),
            vec![ModelResponseEvent::Finished(ModelFinishReason::Stop)]
        );
    }

    #[test]
    fn test_tool_call_index_out_of_range() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "choices": [{
                "delta": {
                    "tool_calls": [{ "index": 100_000_000_000u64, "id": "x" }]
                }
            }]
        }))
        .unwrap();
        let err = chunk_events(chunk).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "choices": [{
                "delta": {
                    "tool_calls": [{ "index": MAX_TOOL_CALLS - 1, "id": "x" }]
                }
            }]
        }))
        .unwrap();
        assert_eq!(chunk_events(chunk).unwrap().len(), 1);
    }
}
