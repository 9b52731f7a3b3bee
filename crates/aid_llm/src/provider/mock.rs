//! Mock provider for testing conversations without real API calls.
//!
//! Each call to [`Provider::generate`] consumes the next scripted step. Steps
//! are OpenAI-style event stream bodies, so responses go through the same
//! decoder and parser as real ones.
//!
//! ```ignore
//! let provider = MockProvider::with_tool_call("get_time", "{}")
//!     .then_message("It is noon.");
//! ```

use std::{collections::VecDeque, sync::Arc};

use aid_conversation::{Content, Message, ToolCall};
use aid_tool::FunctionSchema;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::{Pricing, Provider, openai::OpenaiDecoder};
use crate::{
    error::{Error, Result},
    stream::{EventStream, sse},
};

#[derive(Debug, Clone)]
enum Step {
    Body(String),
    Fail { code: u16, message: String },
}

/// A request as the mock provider received it.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub system_prompt: Option<Content>,
    pub messages: Vec<Message>,
    pub tools: Vec<String>,
}

/// A scripted LLM provider.
///
/// Clones share their script and request log.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    steps: Arc<Mutex<VecDeque<Step>>>,
    requests: Arc<Mutex<Vec<Request>>>,
    usage: Option<(u64, u64)>,
    pricing: Pricing,
    calls: usize,
}

impl MockProvider {
    /// Create a provider that replays the given event stream bodies.
    #[must_use]
    pub fn new(bodies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let steps = bodies.into_iter().map(|body| Step::Body(body.into())).collect();

        Self {
            steps: Arc::new(Mutex::new(steps)),
            ..Default::default()
        }
    }

    /// Create a provider that answers with a single text message.
    #[must_use]
    pub fn with_message(text: &str) -> Self {
        Self::default().then_message(text)
    }

    /// Create a provider that requests a single tool call.
    #[must_use]
    pub fn with_tool_call(name: &str, arguments: &str) -> Self {
        Self::default().then_tool_call(name, arguments)
    }

    #[must_use]
    pub fn then_message(self, text: &str) -> Self {
        let chunk = json!({ "choices": [{ "index": 0, "delta": { "content": text } }] });

        self.then_chunks(&[chunk])
    }

    /// Request one tool call, with a generated call ID.
    #[must_use]
    pub fn then_tool_call(mut self, name: &str, arguments: &str) -> Self {
        self.calls += 1;
        let call = ToolCall::new(format!("call_{}", self.calls), name).with_arguments(arguments);

        self.then_tool_calls(vec![call])
    }

    /// Request several tool calls in one response, streaming each one's
    /// arguments in two fragments.
    #[must_use]
    pub fn then_tool_calls(self, calls: Vec<ToolCall>) -> Self {
        let mut chunks = vec![];
        for (index, call) in calls.iter().enumerate() {
            let mid = call
                .arguments
                .char_indices()
                .nth(call.arguments.chars().count() / 2)
                .map_or(0, |(i, _)| i);
            let (head, tail) = call.arguments.split_at(mid);

            chunks.push(json!({ "choices": [{ "index": 0, "delta": { "tool_calls": [{
                "index": index,
                "id": call.id,
                "type": "function",
                "function": { "name": call.name, "arguments": head },
            }] } }] }));

            if !tail.is_empty() {
                chunks.push(json!({ "choices": [{ "index": 0, "delta": { "tool_calls": [{
                    "index": index,
                    "function": { "arguments": tail },
                }] } }] }));
            }
        }

        self.then_chunks(&chunks)
    }

    /// Fail the next request with an API error.
    #[must_use]
    pub fn then_error(self, code: u16, message: impl Into<String>) -> Self {
        self.push(Step::Fail {
            code,
            message: message.into(),
        })
    }

    /// Report this usage at the end of every scripted response.
    #[must_use]
    pub fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.usage = Some((input_tokens, output_tokens));
        self
    }

    #[must_use]
    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    /// The requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    fn then_chunks(self, chunks: &[serde_json::Value]) -> Self {
        let body = chunks
            .iter()
            .map(|chunk| format!("data: {chunk}\n\n"))
            .collect::<String>();

        self.push(Step::Body(body))
    }

    fn push(self, step: Step) -> Self {
        self.steps.lock().push_back(step);

        self
    }

    fn usage_chunk(&self) -> String {
        match self.usage {
            Some((input, output)) => {
                let chunk = json!({
                    "choices": [],
                    "usage": { "prompt_tokens": input, "completion_tokens": output },
                });

                format!("data: {chunk}\n\n")
            }
            None => String::new(),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Stream = EventStream<OpenaiDecoder>;

    fn company(&self) -> &str {
        "Mock"
    }

    fn model(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        system_prompt: Option<&Content>,
        messages: &[Message],
        tools: &[&FunctionSchema],
        cancel: CancellationToken,
    ) -> Result<Self::Stream> {
        self.requests.lock().push(Request {
            system_prompt: system_prompt.cloned(),
            messages: messages.to_vec(),
            tools: tools.iter().map(|schema| schema.name.clone()).collect(),
        });

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let step = self
            .steps
            .lock()
            .pop_front()
            .ok_or_else(|| Error::Config("mock provider ran out of scripted responses".to_owned()))?;

        let mut body = match step {
            Step::Body(body) => body,
            Step::Fail { code, message } => return Err(Error::Api { code, message }),
        };

        if !body.ends_with('\n') {
            body.push('\n');
        }

        let body = format!("{body}{}data: [DONE]\n", self.usage_chunk());
        trace!(body = %body, "Replaying scripted response.");

        Ok(EventStream::new(sse::from_body(&body), OpenaiDecoder, cancel, self.pricing))
    }
}

#[cfg(test)]
#[path = "mock_tests.rs"]
mod tests;
