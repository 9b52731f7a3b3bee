//! Configuration for the `aid` command.
//!
//! Settings come from an optional TOML file, then from environment
//! variables. The default file lives in the platform configuration directory,
//! e.g. `$XDG_CONFIG_HOME/aid/config.toml`.

mod error;
pub mod provider;

use camino::{Utf8Path, Utf8PathBuf};
use directories::ProjectDirs;
use schematic::{Config, ConfigLoader};
use tracing::{debug, trace};

pub use self::{
    error::Error,
    provider::{
        AnthropicConfig, GoogleConfig, OpenaiConfig, PartialAnthropicConfig, PartialGoogleConfig,
        PartialOpenaiConfig, PartialSamplingConfig, ProviderKind, SamplingConfig, api_key,
    },
};
use crate::error::Result;

/// Application name for configuration file storage paths.
const APPLICATION: &str = "aid";

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Config)]
#[config(rename_all = "snake_case")]
pub struct AppConfig {
    #[setting(env = "AID_PROVIDER")]
    pub provider: ProviderKind,

    /// Defaults to the provider's default model.
    #[setting(env = "AID_MODEL")]
    pub model: Option<String>,

    #[setting(nested)]
    pub openai: OpenaiConfig,

    #[setting(nested)]
    pub google: GoogleConfig,

    #[setting(nested)]
    pub anthropic: AnthropicConfig,

    /// How many updates a turn may run ahead of the terminal.
    #[setting(default = 1)]
    pub update_capacity: usize,

    /// Write a YAML snapshot of every step to this file.
    pub debug_snapshot: Option<String>,

    /// Wall-clock limit for shell commands run by the model.
    #[setting(default = 30)]
    pub shell_deadline_secs: u64,
}

impl AppConfig {
    #[must_use]
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// The environment variable holding the selected provider's API key.
    #[must_use]
    pub fn api_key_env(&self) -> &str {
        match self.provider {
            ProviderKind::Openai => &self.openai.api_key_env,
            ProviderKind::Google => &self.google.api_key_env,
            ProviderKind::Anthropic => &self.anthropic.api_key_env,
        }
    }

    /// The selected provider's API key.
    pub fn api_key(&self) -> Result<String> {
        api_key(self.api_key_env())
    }
}

/// The default configuration file path, if the platform has one.
#[must_use]
pub fn default_path() -> Option<Utf8PathBuf> {
    ProjectDirs::from("", "", APPLICATION)
        .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.config_dir().join(CONFIG_FILE)).ok())
}

/// Load the configuration.
///
/// An explicit `path` must exist. Without one, the default file is used if
/// present.
pub fn load(path: Option<&Utf8Path>) -> Result<AppConfig> {
    let mut loader = ConfigLoader::<AppConfig>::new();

    match path {
        Some(path) => {
            debug!(%path, "Loading configuration file.");
            loader.file(path.as_std_path().to_path_buf())?;
        }
        None => {
            if let Some(path) = default_path() {
                trace!(%path, "Trying default configuration file.");
                loader.file_optional(path.into_std_path_buf())?;
            }
        }
    }

    let config = loader.load()?.config;
    debug!(provider = ?config.provider, model = config.model(), "Loaded configuration.");

    Ok(config)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
