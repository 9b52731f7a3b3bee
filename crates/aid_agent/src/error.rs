pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Llm(#[from] aid_llm::Error),

    #[error(transparent)]
    Conversation(#[from] aid_conversation::Error),

    #[error("failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize snapshot: {0}")]
    Yaml(#[from] serde_yaml::Error),
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
