use serde::{Deserialize, Serialize};

use crate::{
    Content, ToolCall,
    error::{Error, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub content: Content,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn with_role(role: Role, content: Content) -> Self {
        Self {
            role,
            name: None,
            content,
            tool_calls: vec![],
            tool_call_id: None,
        }
    }

    #[must_use]
    pub fn system(content: impl Into<Content>) -> Self {
        Self::with_role(Role::System, content.into())
    }

    #[must_use]
    pub fn user(content: impl Into<Content>) -> Self {
        Self::with_role(Role::User, content.into())
    }

    /// An empty assistant message, to be filled while a response streams in.
    #[must_use]
    pub fn assistant() -> Self {
        Self::with_role(Role::Assistant, Content::new())
    }

    /// A tool result answering the call identified by `tool_call_id`.
    ///
    /// Providers reject images in tool messages, so content holding any is
    /// refused. Send those in a separate user message instead.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<Content>) -> Result<Self> {
        let tool_call_id = tool_call_id.into();
        let content = content.into();

        if tool_call_id.is_empty() {
            return Err(Error::MissingToolCallId);
        }

        if content.has_images() {
            return Err(Error::ToolMessageWithImages(tool_call_id));
        }

        Ok(Self {
            tool_call_id: Some(tool_call_id),
            ..Self::with_role(Role::Tool, content)
        })
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_tool_call(mut self, call: ToolCall) -> Self {
        self.tool_calls.push(call);
        self
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
