use aid_conversation::{Content, Item, Message, Role};
use aid_tool::FunctionSchema;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{Pricing, Provider, Sampling, endpoint, send};
use crate::{
    Delta,
    error::{Error, Result},
    stream::{Decoded, Decoder, EventStream},
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

const PRICING: &[(&str, Pricing)] = &[
    ("gpt-4o-mini", Pricing::new(0.15, 0.60)),
    ("gpt-4o", Pricing::new(5.0, 15.0)),
];

/// The OpenAI chat completions API.
#[derive(Debug, Clone)]
pub struct Openai {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    sampling: Sampling,
}

impl Openai {
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
impl Provider for Openai {
    type Stream = EventStream<OpenaiDecoder>;

    fn company(&self) -> &str {
        "OpenAI"
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
        let url = endpoint(&self.base_url, "/v1/chat/completions")?;
        let body = request_body(&self.model, system_prompt, messages, tools, self.sampling);

        let request = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body);

        let data = send(&self.client, request, &cancel).await?;
        let pricing = Pricing::lookup(PRICING, &self.model);

        Ok(EventStream::new(data, OpenaiDecoder, cancel, pricing))
    }
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    stream: bool,
    stream_options: StreamOptions,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<RequestTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

#[derive(Debug, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    content: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<RequestToolCall<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RequestToolCall<'a> {
    id: &'a str,
    r#type: &'static str,
    function: FunctionCall<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionCall<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Debug, Serialize)]
struct RequestTool<'a> {
    r#type: &'static str,
    function: &'a FunctionSchema,
}

fn request_body<'a>(
    model: &'a str,
    system_prompt: Option<&Content>,
    messages: &'a [Message],
    tools: &[&'a FunctionSchema],
    sampling: Sampling,
) -> Request<'a> {
    let system = system_prompt.map(|content| RequestMessage {
        role: Role::System,
        name: None,
        content: Some(wire_content(content)),
        tool_calls: vec![],
        tool_call_id: None,
    });

    let messages = system
        .into_iter()
        .chain(messages.iter().map(|message| RequestMessage {
            role: message.role,
            name: message.name.as_deref(),
            content: (!message.content.is_empty()).then(|| wire_content(&message.content)),
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| RequestToolCall {
                    id: call.correlation_id(),
                    r#type: "function",
                    function: FunctionCall {
                        name: &call.name,
                        arguments: &call.arguments,
                    },
                })
                .collect(),
            tool_call_id: message.tool_call_id.as_deref(),
        }))
        .collect();

    Request {
        model,
        messages,
        stream: true,
        stream_options: StreamOptions {
            include_usage: true,
        },
        tools: tools
            .iter()
            .map(|&function| RequestTool {
                r#type: "function",
                function,
            })
            .collect(),
        max_tokens: sampling.max_output_tokens,
        temperature: sampling.temperature,
        top_p: sampling.top_p,
    }
}

/// Structured results are sent as JSON text, the API has no such part type.
fn wire_content(content: &Content) -> Content {
    content
        .items()
        .iter()
        .map(|item| match item {
            Item::Json(json) => Item::Text(json.to_string()),
            item => item.clone(),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct Chunk {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ChunkUsage>,
    error: Option<super::ErrorDetails>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    delta: ChoiceDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChoiceDelta {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallChunk>,
}

#[derive(Debug, Deserialize)]
struct ToolCallChunk {
    index: usize,
    id: Option<String>,
    function: Option<FunctionChunk>,
}

#[derive(Debug, Deserialize)]
struct FunctionChunk {
    name: Option<String>,
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// Decodes OpenAI-style chat completion chunks.
#[derive(Debug, Default)]
pub struct OpenaiDecoder;

impl Decoder for OpenaiDecoder {
    fn decode(&mut self, data: &str) -> Result<Decoded> {
        // Marks the end of the stream.
        if data == "[DONE]" {
            return Ok(Decoded::Done);
        }

        let chunk: Chunk = serde_json::from_str(data).map_err(|error| Error::decode(error, data))?;
        if let Some(error) = chunk.error {
            return Err(Error::Decode(error.message));
        }

        let mut deltas = vec![];
        let delta = chunk
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.delta)
            .unwrap_or_default();

        if let Some(content) = delta.content {
            deltas.push(Delta::content(content));
        }

        for call in delta.tool_calls {
            let (name, arguments) = call
                .function
                .map(|f| (f.name, f.arguments))
                .unwrap_or_default();

            deltas.push(Delta::tool_call(
                call.index,
                call.id.unwrap_or_default(),
                name.unwrap_or_default(),
                arguments.unwrap_or_default(),
            ));
        }

        if let Some(usage) = chunk.usage {
            debug!(?usage, "Received usage.");
            deltas.push(Delta::usage(
                Some(usage.prompt_tokens),
                Some(usage.completion_tokens),
            ));
        }

        Ok(deltas.into())
    }
}

#[cfg(test)]
#[path = "openai_tests.rs"]
mod tests;
