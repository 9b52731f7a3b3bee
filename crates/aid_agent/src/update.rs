use aid_tool::ToolResult;

use crate::Error;

/// Progress of a turn, in the order it happened.
#[derive(Debug)]
pub enum Update {
    /// A fragment of assistant text.
    TextDelta(String),

    /// The model announced a tool call. `label` is the registered tool's
    /// label, or the function name if no such tool exists.
    ToolStarted {
        call_id: String,
        name: String,
        label: String,
    },

    /// A running tool reported progress.
    ToolStatus { name: String, status: String },

    /// A tool call ran. `duplicate` is set when the call ID had been seen
    /// before in this conversation.
    ToolFinished {
        call_id: String,
        name: String,
        result: ToolResult,
        duplicate: bool,
    },

    /// The turn failed. This is always the last update of a turn.
    Error(Error),
}
