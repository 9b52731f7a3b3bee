use std::collections::HashMap;

use aid_conversation::{Content, Item, Message, Role, ToolCall};
use aid_tool::{FunctionSchema, Parameters};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::{Pricing, Provider, Sampling, endpoint, parse_data_uri, send};
use crate::{
    Delta,
    error::{Error, Result},
    stream::{Decoded, Decoder, EventStream},
};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

const API_VERSION: &str = "2023-06-01";

/// The API rejects requests without a token limit.
const DEFAULT_MAX_TOKENS: u32 = 8192;

const PRICING: &[(&str, Pricing)] = &[
    ("claude-3-5-sonnet", Pricing::new(3.0, 15.0)),
    ("claude-3-7-sonnet", Pricing::new(3.0, 15.0)),
    ("claude-sonnet-4", Pricing::new(3.0, 15.0)),
    ("claude-3-5-haiku", Pricing::new(0.80, 4.0)),
];

/// The Anthropic messages API.
#[derive(Debug, Clone)]
pub struct Anthropic {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    sampling: Sampling,
}

impl Anthropic {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            sampling: Sampling::default(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }
}

#[async_trait]
impl Provider for Anthropic {
    type Stream = EventStream<AnthropicDecoder>;

    fn company(&self) -> &str {
        "Anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        system_prompt: Option<&Content>,
        messages: &[Message],
        tools: &[&FunctionSchema],
        cancel: CancellationToken,
    ) -> Result<Self::Stream> {
        let url = endpoint(&self.base_url, "/v1/messages")?;
        let body = request_body(&self.model, system_prompt, messages, tools, self.sampling);

        let request = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);

        let data = send(&self.client, request, &cancel).await?;
        let pricing = Pricing::lookup(PRICING, &self.model);

        Ok(EventStream::new(data, AnthropicDecoder::default(), cancel, pricing))
    }
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Turn>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<RequestTool<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

#[derive(Debug, Serialize)]
struct Turn {
    role: &'static str,
    content: Vec<Block>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Block {
    Text {
        text: String,
    },
    Image {
        source: ImageSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ImageSource {
    Base64 { media_type: String, data: String },
    Url { url: String },
}

#[derive(Debug, Serialize)]
struct RequestTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Parameters,
}

fn request_body<'a>(
    model: &'a str,
    system_prompt: Option<&Content>,
    messages: &[Message],
    tools: &[&'a FunctionSchema],
    sampling: Sampling,
) -> Request<'a> {
    let mut turns: Vec<Turn> = vec![];
    for message in messages {
        let (role, blocks) = match message.role {
            Role::User => ("user", content_blocks(&message.content)),
            Role::Assistant => {
                let mut blocks = content_blocks(&message.content);
                blocks.extend(message.tool_calls.iter().map(tool_use));
                ("assistant", blocks)
            }
            Role::Tool => ("user", vec![Block::ToolResult {
                tool_use_id: message.tool_call_id.clone().unwrap_or_default(),
                content: to_text(&message.content),
            }]),
            Role::System => {
                warn!("Sending a system message in the history as a user turn.");
                ("user", content_blocks(&message.content))
            }
        };

        if blocks.is_empty() {
            continue;
        }

        // Consecutive turns of the same role are rejected, so merge them.
        match turns.last_mut() {
            Some(turn) if turn.role == role => turn.content.extend(blocks),
            _ => turns.push(Turn {
                role,
                content: blocks,
            }),
        }
    }

    Request {
        model,
        max_tokens: sampling.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        system: system_prompt.map(to_text),
        messages: turns,
        tools: tools
            .iter()
            .map(|&schema| RequestTool {
                name: &schema.name,
                description: &schema.description,
                input_schema: &schema.parameters,
            })
            .collect(),
        stream: true,
        temperature: sampling.temperature,
        top_p: sampling.top_p,
    }
}

fn to_text(content: &Content) -> String {
    content
        .items()
        .iter()
        .map(|item| match item {
            Item::Text(text) | Item::ImageUrl(text) => text.clone(),
            Item::Json(json) => json.to_string(),
        })
        .collect()
}

fn content_blocks(content: &Content) -> Vec<Block> {
    content
        .items()
        .iter()
        .filter_map(|item| match item {
            Item::Text(text) if text.is_empty() => None,
            Item::Text(text) => Some(Block::Text { text: text.clone() }),
            Item::Json(json) => Some(Block::Text {
                text: json.to_string(),
            }),
            Item::ImageUrl(url) => Some(Block::Image {
                source: match parse_data_uri(url) {
                    Some((media_type, data)) => ImageSource::Base64 {
                        media_type: media_type.to_owned(),
                        data: data.to_owned(),
                    },
                    None => ImageSource::Url { url: url.clone() },
                },
            }),
        })
        .collect()
}

fn tool_use(call: &ToolCall) -> Block {
    let input = if call.arguments.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(&call.arguments).unwrap_or_else(|error| {
            warn!(%error, name = %call.name, "Sending unparseable tool call arguments as empty.");
            json!({})
        })
    };

    Block::ToolUse {
        id: call.correlation_id().to_owned(),
        name: call.name.clone(),
        input,
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Event {
    MessageStart {
        message: StartMessage,
    },
    ContentBlockStart {
        index: usize,
        content_block: ContentBlock,
    },
    ContentBlockDelta {
        index: usize,
        delta: BlockDelta,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        usage: Option<EventUsage>,
    },
    MessageStop,
    Ping,
    Error {
        error: super::ErrorDetails,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct StartMessage {
    usage: Option<EventUsage>,
}

#[derive(Debug, Deserialize)]
struct EventUsage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta {
        text: String,
    },
    InputJsonDelta {
        partial_json: String,
    },
    #[serde(other)]
    Other,
}

/// Decodes Anthropic message stream events.
///
/// Content block indices count text and tool blocks alike, tool call indices
/// only count tool blocks.
#[derive(Debug, Default)]
pub struct AnthropicDecoder {
    tool_calls: HashMap<usize, usize>,
}

impl Decoder for AnthropicDecoder {
    fn decode(&mut self, data: &str) -> Result<Decoded> {
        let event: Event = serde_json::from_str(data).map_err(|error| Error::decode(error, data))?;

        let delta = match event {
            Event::MessageStart { message } => {
                let usage = message.usage.unwrap_or(EventUsage {
                    input_tokens: None,
                    output_tokens: None,
                });

                Delta::usage(usage.input_tokens, usage.output_tokens)
            }
            Event::ContentBlockStart {
                content_block: ContentBlock::Text { text },
                ..
            } => Delta::content(text),
            Event::ContentBlockStart {
                index,
                content_block: ContentBlock::ToolUse { id, name },
            } => {
                let call = self.tool_calls.len();
                self.tool_calls.insert(index, call);

                Delta::tool_call(call, id, name, "")
            }
            Event::ContentBlockDelta {
                delta: BlockDelta::TextDelta { text },
                ..
            } => Delta::content(text),
            Event::ContentBlockDelta {
                index,
                delta: BlockDelta::InputJsonDelta { partial_json },
            } => {
                let Some(&call) = self.tool_calls.get(&index) else {
                    return Err(Error::Decode(format!(
                        "received arguments for unknown content block {index}"
                    )));
                };

                Delta::arguments(call, partial_json)
            }
            Event::ContentBlockStop { index } => match self.tool_calls.get(&index) {
                Some(&call) => Delta::arguments(call, "").complete(),
                None => return Ok(Decoded::Deltas(vec![])),
            },
            Event::MessageDelta { usage } => match usage {
                Some(usage) => Delta::usage(usage.input_tokens, usage.output_tokens),
                None => return Ok(Decoded::Deltas(vec![])),
            },
            Event::MessageStop => return Ok(Decoded::Done),
            Event::Ping
            | Event::Unknown
            | Event::ContentBlockStart {
                content_block: ContentBlock::Other,
                ..
            }
            | Event::ContentBlockDelta {
                delta: BlockDelta::Other,
                ..
            } => {
                trace!(data, "Ignoring event.");
                return Ok(Decoded::Deltas(vec![]));
            }
            Event::Error { error } => {
                debug!(message = %error.message, "Received error event.");
                return Err(Error::Decode(error.message));
            }
        };

        Ok(delta.into())
    }
}

#[cfg(test)]
#[path = "anthropic_tests.rs"]
mod tests;
