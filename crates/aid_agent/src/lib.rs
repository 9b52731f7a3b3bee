//! The conversation engine.
//!
//! A [`Conversation`] owns the message history of one dialogue. Each
//! [`Conversation::submit`] runs the step loop on a background task: ask the
//! provider for the next assistant message, run the tool calls it contains,
//! and repeat until a step runs no tools. Progress is reported as a stream of
//! [`Update`]s.

mod conversation;
mod error;
mod snapshot;
mod update;

pub use conversation::{Conversation, Updates};
pub use error::Error;
pub use snapshot::{Snapshot, StepRecord, YamlSnapshot};
pub use update::Update;
