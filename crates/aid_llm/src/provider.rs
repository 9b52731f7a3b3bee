pub mod anthropic;
pub mod google;
pub mod mock;
pub mod openai;

use std::collections::HashMap;

use aid_conversation::{Content, Message, ToolCall};
use aid_tool::FunctionSchema;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, trace, warn};
use url::Url;

use crate::{
    StreamEvent, Usage,
    error::{Error, Result},
    stream::{DataStream, sse},
};

/// A language model API.
#[async_trait]
pub trait Provider: Send + Sync {
    type Stream: ProviderStream + 'static;

    /// The company behind the model, e.g. "OpenAI".
    fn company(&self) -> &str;

    fn model(&self) -> &str;

    /// Start generating the next assistant message.
    ///
    /// Returns once the response headers arrived. The body is consumed
    /// through the returned stream. Cancelling `cancel` aborts both the
    /// request and the stream.
    async fn generate(
        &self,
        system_prompt: Option<&Content>,
        messages: &[Message],
        tools: &[&FunctionSchema],
        cancel: CancellationToken,
    ) -> Result<Self::Stream>;
}

/// The response to a [`Provider::generate`] call.
#[async_trait]
pub trait ProviderStream: Send {
    /// The next event, or `None` once the stream is over.
    ///
    /// After an error, the stream is over.
    async fn next_event(&mut self) -> Option<Result<StreamEvent>>;

    /// End the stream early. Subsequent calls to `next_event` return `None`.
    fn stop(&mut self);

    /// The assistant message assembled so far.
    fn message(&self) -> &Message;

    /// The last text fragment.
    fn text(&self) -> &str;

    /// The tool call most recently begun or readied.
    fn tool_call(&self) -> Option<&ToolCall>;

    fn usage(&self) -> Usage;

    /// The cost of this request in US dollars, so far.
    fn cost(&self) -> f64;
}

/// Sampling parameters shared by the providers that accept them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sampling {
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
}

/// Model prices in US dollars per million tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pricing {
    pub input: f64,
    pub output: f64,
}

impl Pricing {
    pub const FREE: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }

    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn cost(&self, usage: Usage) -> f64 {
        (usage.input_tokens as f64 * self.input + usage.output_tokens as f64 * self.output)
            / 1_000_000.0
    }

    /// Look up the price of `model` in a table of model name prefixes.
    ///
    /// The first matching prefix wins, so more specific names go first.
    /// Unknown models are free.
    pub(crate) fn lookup(table: &[(&str, Pricing)], model: &str) -> Self {
        table
            .iter()
            .find(|(prefix, _)| model.starts_with(prefix))
            .map_or_else(
                || {
                    warn!(model, "Unknown model price, costs will be reported as zero.");
                    Self::FREE
                },
                |(_, pricing)| *pricing,
            )
    }
}

/// Headers whose values never appear in logs.
const SECRET_HEADERS: &[&str] = &["authorization", "x-api-key", "x-goog-api-key"];

/// Query parameters whose values never appear in logs.
const SECRET_PARAMS: &[&str] = &["key"];

/// Send a streaming request and return its `data:` payloads.
///
/// Non-success statuses become [`Error::Api`].
pub(crate) async fn send(
    client: &reqwest::Client,
    request: reqwest::RequestBuilder,
    cancel: &CancellationToken,
) -> Result<DataStream> {
    let request = request.build()?;

    let headers = request
        .headers()
        .iter()
        .map(|(k, v)| {
            if is_secret(k) {
                return (k.to_string(), "[REDACTED]".to_owned());
            }

            (k.to_string(), v.to_str().unwrap_or_default().to_owned())
        })
        .collect::<HashMap<_, _>>();

    trace!(url = %redact_url(request.url()), ?headers, "Triggering request.");

    let response = tokio::select! {
        biased;

        () = cancel.cancelled() => return Err(Error::Cancelled),
        response = client.execute(request) => response?,
    };

    trace!(
        status = response.status().as_u16(),
        content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| v.to_str().unwrap_or_default()),
        "Received response."
    );

    let status = response.status();
    if !status.is_success() {
        let code = status.as_u16();
        let body = response.text().await?;

        error!(status = code, body = %body, "Unexpected response.");

        return Err(Error::Api {
            code,
            message: error_message(&body),
        });
    }

    Ok(sse::from_response(response))
}

fn is_secret(name: &HeaderName) -> bool {
    *name == AUTHORIZATION || SECRET_HEADERS.contains(&name.as_str())
}

fn redact_url(url: &Url) -> Url {
    let mut url = url.clone();
    let pairs = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if SECRET_PARAMS.contains(&k.as_ref()) {
                "[REDACTED]".to_owned()
            } else {
                v.into_owned()
            };

            (k.into_owned(), v)
        })
        .collect::<Vec<_>>();

    if !pairs.is_empty() {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }

    url
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    message: String,
}

/// The `error.message` of a JSON error body, or the body itself.
///
/// All supported providers wrap their error message this way.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map_or_else(|_| body.trim().to_owned(), |body| body.error.message)
}

/// Join `path` onto a configured base URL.
pub(crate) fn endpoint(base_url: &str, path: &str) -> Result<Url> {
    let base = Url::parse(base_url)
        .map_err(|error| Error::Config(format!("invalid base URL {base_url}: {error}")))?;

    let mut url = base.clone();
    url.set_path(&format!("{}{path}", base.path().trim_end_matches('/')));

    Ok(url)
}

/// Split a `data:` URI into its media type and base64 payload.
pub(crate) fn parse_data_uri(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (media_type, data) = rest.split_once(";base64,")?;

    Some((media_type, data))
}

/// Guess an image media type from a URL's file extension.
pub(crate) fn image_media_type(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or_default().to_ascii_lowercase();

    match path.rsplit('.').next() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
