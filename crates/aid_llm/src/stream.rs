mod delta;
mod parser;
pub(crate) mod sse;

use std::fmt;

use aid_conversation::{Message, ToolCall};
use async_trait::async_trait;
use futures::StreamExt as _;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

pub use self::{
    delta::Delta,
    parser::{Parser, State},
    sse::DataStream,
};
use crate::{
    Pricing, ProviderStream, StreamEvent, Usage,
    error::{Error, Result},
};

/// The result of decoding one `data:` payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Deltas(Vec<Delta>),

    /// The provider's end-of-stream marker.
    Done,
}

impl From<Vec<Delta>> for Decoded {
    fn from(deltas: Vec<Delta>) -> Self {
        Self::Deltas(deltas)
    }
}

impl From<Delta> for Decoded {
    fn from(delta: Delta) -> Self {
        Self::Deltas(vec![delta])
    }
}

/// Turns one provider's wire chunks into [`Delta`]s.
pub trait Decoder: Send {
    fn decode(&mut self, data: &str) -> Result<Decoded>;
}

/// The event stream of one generation request.
///
/// Drive it with [`ProviderStream::next_event`] until it returns `None`.
/// The stream cannot be restarted; once it ends or fails, it stays ended.
pub struct EventStream<D> {
    data: DataStream,
    decoder: D,
    parser: Parser,
    cancel: CancellationToken,
    pricing: Pricing,
    text: String,
    tool_call: Option<ToolCall>,
}

impl<D: Decoder> EventStream<D> {
    pub fn new(data: DataStream, decoder: D, cancel: CancellationToken, pricing: Pricing) -> Self {
        Self {
            data,
            decoder,
            parser: Parser::new(),
            cancel,
            pricing,
            text: String::new(),
            tool_call: None,
        }
    }

    fn observe(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Text(text) => text.clone_into(&mut self.text),
            StreamEvent::ToolCallBegin(call) | StreamEvent::ToolCallReady(call) => {
                self.tool_call = Some(call.clone());
            }
            StreamEvent::ToolCallData(data) => {
                if let Some(call) = &mut self.tool_call {
                    call.arguments.push_str(data);
                }
            }
        }
    }

    fn fail(&mut self, error: Error) -> Option<Result<StreamEvent>> {
        debug!(%error, "Stream failed.");
        self.parser.abort();
        Some(Err(error))
    }
}

impl<D> fmt::Debug for EventStream<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("parser", &self.parser)
            .field("pricing", &self.pricing)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<D: Decoder> ProviderStream for EventStream<D> {
    async fn next_event(&mut self) -> Option<Result<StreamEvent>> {
        loop {
            if let Some(event) = self.parser.next_event() {
                self.observe(&event);
                return Some(Ok(event));
            }

            if self.parser.is_finished() {
                return None;
            }

            let next = tokio::select! {
                biased;

                () = self.cancel.cancelled() => None,
                data = self.data.next() => Some(data),
            };

            let Some(data) = next else {
                return self.fail(Error::Cancelled);
            };

            let data = match data {
                Some(Ok(data)) => data,
                Some(Err(error)) => return self.fail(error),
                None => {
                    trace!("Stream ended.");
                    self.parser.finish();
                    continue;
                }
            };

            match self.decoder.decode(&data) {
                Ok(Decoded::Done) => self.parser.finish(),
                Ok(Decoded::Deltas(deltas)) => {
                    for delta in deltas {
                        if let Err(error) = self.parser.push(delta) {
                            return self.fail(error);
                        }
                    }
                }
                Err(error) => return self.fail(error),
            }
        }
    }

    fn stop(&mut self) {
        if !self.parser.is_finished() {
            debug!("Stream stopped early.");
        }

        self.parser.abort();
        self.data = Box::pin(futures::stream::empty());
    }

    fn message(&self) -> &Message {
        self.parser.message()
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn tool_call(&self) -> Option<&ToolCall> {
        self.tool_call.as_ref()
    }

    fn usage(&self) -> Usage {
        self.parser.usage()
    }

    fn cost(&self) -> f64 {
        self.pricing.cost(self.parser.usage())
    }
}
