//! Provider configuration.

use std::env::{self, VarError};

use schematic::{Config, ConfigEnum};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The LLM vendor to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ConfigEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Openai,
    Google,
    #[default]
    Anthropic,
}

impl ProviderKind {
    /// The model used when none is configured.
    #[must_use]
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Openai => "gpt-4o",
            Self::Google => "gemini-1.5-pro-001",
            Self::Anthropic => "claude-3-5-sonnet-latest",
        }
    }
}

/// `OpenAI` API configuration.
#[derive(Debug, Clone, Config)]
#[config(rename_all = "snake_case")]
pub struct OpenaiConfig {
    /// Environment variable that contains the API key.
    #[setting(default = "OPENAI_API_KEY")]
    pub api_key_env: String,

    #[setting(default = "https://api.openai.com")]
    pub base_url: String,
}

/// Google Gemini API configuration.
#[derive(Debug, Clone, Config)]
#[config(rename_all = "snake_case")]
pub struct GoogleConfig {
    /// Environment variable that contains the API key.
    #[setting(default = "GOOGLE_API_KEY")]
    pub api_key_env: String,

    #[setting(default = "https://generativelanguage.googleapis.com")]
    pub base_url: String,

    /// Send the key as a bearer token instead of the `key` query parameter,
    /// as Vertex AI endpoints expect.
    pub bearer: bool,

    #[setting(nested)]
    pub sampling: SamplingConfig,
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Config)]
#[config(rename_all = "snake_case")]
pub struct AnthropicConfig {
    /// Environment variable that contains the API key.
    #[setting(default = "ANTHROPIC_API_KEY")]
    pub api_key_env: String,

    #[setting(default = "https://api.anthropic.com")]
    pub base_url: String,

    #[setting(nested)]
    pub sampling: SamplingConfig,
}

/// Generation parameters. Unset values use the provider's defaults.
#[derive(Debug, Clone, Config)]
#[config(rename_all = "snake_case")]
pub struct SamplingConfig {
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
}

/// Read the API key from the environment variable named `name`.
///
/// An empty variable counts as unset.
pub fn api_key(name: &str) -> Result<String> {
    let source = match env::var(name) {
        Ok(key) if !key.trim().is_empty() => return Ok(key),
        Ok(_) => VarError::NotPresent,
        Err(error) => error,
    };

    Err(Error::MissingApiKey {
        name: name.to_owned(),
        source,
    })
}
