use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// The author of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The system instructions.
    System,
    /// A user input.
    User,
    /// A response from the model.
    Assistant,
    /// The result of a tool call.
    Tool,
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        f.write_str(role)
    }
}

/// One turn in a conversation.
///
/// Only the fields relevant to the role are set: `tool_calls` appears on
/// assistant turns that request tools, while `tool_call_id` and `name`
/// appear on tool-result turns. Use the constructors to keep these
/// invariants, e.g. [`Message::tool_result`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// The author of this turn.
    pub role: Role,
    /// The text content. Absent when the turn is purely a tool invocation,
    /// or when the model produced nothing.
    pub content: Option<String>,
    /// Tool calls requested by the model, in the order the model emitted
    /// them.
    pub tool_calls: Option<Vec<ToolCall>>,
    /// The id of the tool call this result answers.
    pub tool_call_id: Option<String>,
    /// The name of the tool that produced this result.
    pub name: Option<String>,
}

impl Message {
    /// Creates a system message.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::with_content(Role::System, content.into())
    }

    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::with_content(Role::User, content.into())
    }

    /// Creates an assistant message.
    ///
    /// An empty `tool_calls` vector is normalized to `None`.
    pub fn assistant(
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
            tool_call_id: None,
            name: None,
        }
    }

    /// Creates a tool-result message that answers the tool call `id`.
    pub fn tool_result<S1, S2, S3>(id: S1, name: S2, content: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(id.into()),
            name: Some(name.into()),
        }
    }

    #[inline]
    fn with_content(role: Role, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    /// Returns the tool calls of this message, or an empty slice.
    #[inline]
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }
}

/// A tool call requested by the model.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCall {
    /// The unique identifier for the tool call request within a round.
    pub id: String,
    /// The name of the tool to call.
    pub name: String,
    /// The raw serialized arguments, usually a JSON object.
    pub arguments: String,
}
