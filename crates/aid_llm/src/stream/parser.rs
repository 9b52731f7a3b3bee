use std::collections::VecDeque;

use aid_conversation::{Message, ToolCall};

use crate::{
    Delta, StreamEvent, Usage,
    error::{Error, Result},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    /// Nothing received yet.
    #[default]
    Idle,

    /// Receiving text, no tool call open.
    Streaming,

    /// The last tool call has not been marked ready yet.
    ToolAccumulating,

    /// The stream ended normally.
    Done,

    /// The stream ended with an error.
    Failed,
}

/// Folds [`Delta`]s into [`StreamEvent`]s and the assistant message.
///
/// Tool call fragments are correlated by index. An index equal to the number
/// of calls seen so far opens a new call, which readies the previous one. An
/// index equal to the last call's appends to it. Anything else is a protocol
/// violation. Every call is readied exactly once, at the latest when the
/// stream ends.
#[derive(Debug)]
pub struct Parser {
    state: State,
    message: Message,
    usage: Usage,
    pending: VecDeque<StreamEvent>,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            state: State::Idle,
            message: Message::assistant(),
            usage: Usage::default(),
            pending: VecDeque::new(),
        }
    }
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Whether the stream is over and every event has been taken.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Done | State::Failed) && self.pending.is_empty()
    }

    /// The assistant message assembled so far.
    #[must_use]
    pub fn message(&self) -> &Message {
        &self.message
    }

    #[must_use]
    pub fn usage(&self) -> Usage {
        self.usage
    }

    /// Take the next event, if any is pending.
    pub fn next_event(&mut self) -> Option<StreamEvent> {
        self.pending.pop_front()
    }

    pub fn push(&mut self, delta: Delta) -> Result<()> {
        match self.state {
            State::Done | State::Failed => {
                return Err(Error::Decode("received data after end of stream".to_owned()));
            }
            State::Idle => self.state = State::Streaming,
            State::Streaming | State::ToolAccumulating => {}
        }

        if let Some(input) = delta.input_tokens {
            self.usage.input_tokens = input;
        }

        if let Some(output) = delta.output_tokens {
            self.usage.output_tokens = output;
        }

        if let Some(text) = delta.content.filter(|text| !text.is_empty()) {
            self.message.content.append(&text);
            self.pending.push_back(StreamEvent::Text(text));
        }

        let Some(index) = delta.tool_call_index else {
            return Ok(());
        };

        let count = self.message.tool_calls.len();
        if index == count {
            self.ready();

            let name = delta.tool_call_name.unwrap_or_default();
            let id = match delta.tool_call_id {
                Some(id) => id,
                // The result must be answerable by some key.
                None if name.is_empty() => format!("call_{index}"),
                None => String::new(),
            };

            let call = ToolCall::new(id, name);
            self.message.tool_calls.push(call.clone());
            self.pending.push_back(StreamEvent::ToolCallBegin(call));
            self.state = State::ToolAccumulating;
        } else if index + 1 == count {
            if self.state != State::ToolAccumulating {
                return self.fail(format!("tool call {index} received data after it was ready"));
            }
        } else {
            return self.fail(format!(
                "tool call index {index} out of sequence, expected {count} or {}",
                count.saturating_sub(1)
            ));
        }

        if let Some(arguments) = delta.tool_call_arguments.filter(|v| !v.is_empty()) {
            if let Some(call) = self.message.tool_calls.last_mut() {
                call.arguments.push_str(&arguments);
            }

            self.pending.push_back(StreamEvent::ToolCallData(arguments));
        }

        if delta.tool_call_complete {
            self.ready();
        }

        Ok(())
    }

    /// The stream ended normally. Readies the open tool call, if any.
    pub fn finish(&mut self) {
        if matches!(self.state, State::Done | State::Failed) {
            return;
        }

        self.ready();
        self.state = State::Done;
    }

    /// The stream ended with an error. Pending events are discarded.
    pub fn abort(&mut self) {
        self.pending.clear();
        self.state = State::Failed;
    }

    fn fail(&mut self, message: String) -> Result<()> {
        self.abort();
        Err(Error::Decode(message))
    }

    fn ready(&mut self) {
        if self.state != State::ToolAccumulating {
            return;
        }

        if let Some(call) = self.message.tool_calls.last() {
            self.pending.push_back(StreamEvent::ToolCallReady(call.clone()));
        }

        self.state = State::Streaming;
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
