/// Arguments that do not match a tool's declared parameters.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("{field}: type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),

    #[error("tool already registered: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to decode arguments: {0}")]
    Arguments(#[source] serde_json::Error),

    #[error("invalid image {name}: {reason}")]
    Image { name: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
impl PartialEq for ValidationError {
    fn eq(&self, other: &Self) -> bool {
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return false;
        }

        // Good enough for testing purposes
        format!("{self:?}") == format!("{other:?}")
    }
}

#[cfg(test)]
impl PartialEq for ToolError {
    fn eq(&self, other: &Self) -> bool {
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return false;
        }

        format!("{self:?}") == format!("{other:?}")
    }
}
