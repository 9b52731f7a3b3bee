use std::collections::HashMap;

use aid_conversation::{Content, Item, Message, Role, ToolCall};
use aid_tool::{FunctionSchema, Parameters};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{Pricing, Provider, Sampling, endpoint, image_media_type, parse_data_uri, send};
use crate::{
    Delta,
    error::{Error, Result},
    stream::{Decoded, Decoder, EventStream},
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
const DEFAULT_TEMPERATURE: f64 = 1.0;
const DEFAULT_TOP_P: f64 = 0.95;

const HARM_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

const PRICING: &[(&str, Pricing)] = &[
    ("gemini-2.5-pro", Pricing::new(1.25, 10.0)),
    ("gemini-2.5-flash", Pricing::new(0.30, 2.50)),
    ("gemini-2.0-flash", Pricing::new(0.10, 0.40)),
    ("gemini-1.5-pro", Pricing::new(1.25, 5.0)),
    ("gemini-1.5-flash", Pricing::new(0.075, 0.30)),
];

/// How requests authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// A Gemini API key, sent as the `key` query parameter.
    ApiKey(String),

    /// An OAuth access token, as used by Vertex AI endpoints.
    Bearer(String),
}

/// The Google Gemini `streamGenerateContent` API.
#[derive(Debug, Clone)]
pub struct Google {
    client: reqwest::Client,
    auth: Auth,
    model: String,
    base_url: String,
    sampling: Sampling,
}

impl Google {
    #[must_use]
    pub fn new(auth: Auth, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            auth,
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
impl Provider for Google {
    type Stream = EventStream<GoogleDecoder>;

    fn company(&self) -> &str {
        "Google"
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
        let path = format!("/v1beta/models/{}:streamGenerateContent", self.model);
        let url = endpoint(&self.base_url, &path)?;
        let body = request_body(system_prompt, messages, tools, self.sampling);

        let mut request = self.client.post(url).query(&[("alt", "sse")]).json(&body);
        request = match &self.auth {
            Auth::ApiKey(key) => request.query(&[("key", key)]),
            Auth::Bearer(token) => request.bearer_auth(token),
        };

        let data = send(&self.client, request, &cancel).await?;
        let pricing = Pricing::lookup(PRICING, &self.model);

        Ok(EventStream::new(data, GoogleDecoder::default(), cancel, pricing))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Request<'a> {
    contents: Vec<Turn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Turn>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tools<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Turn {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(InlineData),
    FileData(FileData),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize)]
struct FunctionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tools<'a> {
    function_declarations: Vec<FunctionDeclaration<'a>>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration<'a> {
    name: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<&'a Parameters>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

fn request_body<'a>(
    system_prompt: Option<&Content>,
    messages: &[Message],
    tools: &[&'a FunctionSchema],
    sampling: Sampling,
) -> Request<'a> {
    let calls = messages
        .iter()
        .flat_map(|message| &message.tool_calls)
        .map(|call| (call.correlation_id(), call))
        .collect::<HashMap<_, _>>();

    let mut contents: Vec<Turn> = vec![];
    for message in messages {
        let (role, parts) = match message.role {
            Role::User => ("user", content_parts(&message.content)),
            Role::Assistant => {
                let mut parts = content_parts(&message.content);
                parts.extend(message.tool_calls.iter().map(function_call));
                ("model", parts)
            }
            Role::Tool => {
                let id = message.tool_call_id.as_deref().unwrap_or_default();
                ("user", vec![function_response(id, calls.get(id), &message.content)])
            }
            Role::System => {
                warn!("Sending a system message in the history as a user turn.");
                ("user", content_parts(&message.content))
            }
        };

        if parts.is_empty() {
            continue;
        }

        match contents.last_mut() {
            Some(turn) if turn.role == Some(role) => turn.parts.extend(parts),
            _ => contents.push(Turn {
                role: Some(role),
                parts,
            }),
        }
    }

    let declarations = tools
        .iter()
        .map(|&schema| FunctionDeclaration {
            name: &schema.name,
            description: &schema.description,
            parameters: (!schema.parameters.is_empty()).then_some(&schema.parameters),
        })
        .collect::<Vec<_>>();

    Request {
        contents,
        system_instruction: system_prompt.map(|content| Turn {
            role: None,
            parts: content_parts(content),
        }),
        tools: if declarations.is_empty() {
            vec![]
        } else {
            vec![Tools {
                function_declarations: declarations,
            }]
        },
        generation_config: GenerationConfig {
            max_output_tokens: sampling
                .max_output_tokens
                .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            temperature: sampling.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            top_p: sampling.top_p.unwrap_or(DEFAULT_TOP_P),
        },
        safety_settings: HARM_CATEGORIES
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold: "BLOCK_ONLY_HIGH",
            })
            .collect(),
    }
}

fn content_parts(content: &Content) -> Vec<Part> {
    content
        .items()
        .iter()
        .filter_map(|item| match item {
            Item::Text(text) if text.is_empty() => None,
            Item::Text(text) => Some(Part::Text(text.clone())),
            Item::Json(json) => Some(Part::Text(json.to_string())),
            Item::ImageUrl(url) => Some(match parse_data_uri(url) {
                Some((mime_type, data)) => Part::InlineData(InlineData {
                    mime_type: mime_type.to_owned(),
                    data: data.to_owned(),
                }),
                None => Part::FileData(FileData {
                    mime_type: image_media_type(url).to_owned(),
                    file_uri: url.clone(),
                }),
            }),
        })
        .collect()
}

fn function_call(call: &ToolCall) -> Part {
    let args = if call.arguments.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(&call.arguments).unwrap_or_else(|error| {
            warn!(%error, name = %call.name, "Sending unparseable tool call arguments as empty.");
            json!({})
        })
    };

    Part::FunctionCall(FunctionCall {
        id: (!call.id.is_empty()).then(|| call.id.clone()),
        name: call.name.clone(),
        args,
    })
}

/// Responses are named after the call they answer. The API requires an
/// object, so anything else is wrapped.
fn function_response(id: &str, call: Option<&&ToolCall>, content: &Content) -> Part {
    let response = match content.items() {
        [Item::Json(json @ Value::Object(_))] => json.clone(),
        items => {
            let text = items
                .iter()
                .map(|item| match item {
                    Item::Text(text) => text.clone(),
                    Item::Json(json) => json.to_string(),
                    Item::ImageUrl(url) => url.clone(),
                })
                .collect::<String>();

            json!({ "content": text })
        }
    };

    Part::FunctionResponse(FunctionResponse {
        id: call.filter(|call| !call.id.is_empty()).map(|call| call.id.clone()),
        name: call.map_or_else(|| id.to_owned(), |call| call.name.clone()),
        response,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Response {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    error: Option<super::ErrorDetails>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    function_call: Option<FunctionCall>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}

/// Decodes Gemini `GenerateContentResponse` chunks.
///
/// Function calls arrive whole, so each one becomes a complete call.
#[derive(Debug, Default)]
pub struct GoogleDecoder {
    calls: usize,
}

impl Decoder for GoogleDecoder {
    fn decode(&mut self, data: &str) -> Result<Decoded> {
        let response: Response =
            serde_json::from_str(data).map_err(|error| Error::decode(error, data))?;

        if let Some(error) = response.error {
            return Err(Error::Decode(error.message));
        }

        let mut deltas = vec![];
        let parts = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default();

        for part in parts {
            if part.thought {
                continue;
            }

            if let Some(text) = part.text {
                deltas.push(Delta::content(text));
            }

            if let Some(call) = part.function_call {
                let arguments = if call.args.is_null() {
                    "{}".to_owned()
                } else {
                    call.args.to_string()
                };

                deltas.push(
                    Delta::tool_call(
                        self.calls,
                        call.id.unwrap_or_default(),
                        call.name,
                        arguments,
                    )
                    .complete(),
                );

                self.calls += 1;
            }
        }

        if let Some(usage) = response.usage_metadata {
            debug!(?usage, "Received usage.");
            deltas.push(Delta::usage(
                usage.prompt_token_count,
                usage.candidates_token_count,
            ));
        }

        Ok(deltas.into())
    }
}

#[cfg(test)]
#[path = "google_tests.rs"]
mod tests;
