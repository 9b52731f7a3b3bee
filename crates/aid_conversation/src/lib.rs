//! Message payloads exchanged with a language model.
//!
//! A [`Message`] carries [`Content`], an ordered list of text, image and
//! structured-result [`Item`]s, plus the [`ToolCall`]s an assistant requested.

mod content;
mod error;
mod message;
mod tool_call;

pub use content::{Content, Item};
pub use error::Error;
pub use message::{Message, Role};
pub use tool_call::ToolCall;
