use aid_conversation::ToolCall;
use serde::{Deserialize, Serialize};

/// A provider-agnostic event in a streaming response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A fragment of assistant text.
    Text(String),

    /// A new tool call was announced. Its arguments are still empty.
    ToolCallBegin(ToolCall),

    /// A fragment of the current tool call's JSON arguments.
    ToolCallData(String),

    /// The call's arguments are complete. Emitted exactly once per call.
    ToolCallReady(ToolCall),
}

/// Token counts reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    #[must_use]
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }
}

impl std::ops::AddAssign for Usage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens += rhs.input_tokens;
        self.output_tokens += rhs.output_tokens;
    }
}
