pub(crate) type Result<T> = std::result::Result<T, Error>;

/// Failures that end a generation step.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("failed to decode stream: {0}")]
    Decode(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("request cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn decode(error: impl std::fmt::Display, data: &str) -> Self {
        Self::Decode(format!("{error}. Chunk was: '{data}'"))
    }
}

#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return false;
        }

        // Good enough for testing purposes
        format!("{self:?}") == format!("{other:?}")
    }
}
