use serde::{Deserialize, Serialize};

/// A function call requested by the assistant.
///
/// Created empty when the provider announces the call, filled as argument
/// fragments stream in, and left untouched once the call is ready.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call ID. Empty for providers that do not assign one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    pub name: String,

    /// Raw JSON arguments, exactly as streamed.
    pub arguments: String,
}

impl ToolCall {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: String::new(),
        }
    }

    #[must_use]
    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = arguments.into();
        self
    }

    /// The key tying a tool result back to this call.
    ///
    /// Falls back to the function name when the provider assigns no ID.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        if self.id.is_empty() {
            &self.name
        } else {
            &self.id
        }
    }
}
