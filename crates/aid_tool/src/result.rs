use std::{fmt, path::Path};

use aid_conversation::{Content, Item};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::{Value, json};

use crate::ToolError;

/// Sent to the model in place of a result without payload.
pub const EMPTY_RESULT_TEXT: &str = "(The tool did not return anything.)";

/// A named image attached to a tool result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub name: String,

    /// A remote URL or a `data:` URI.
    pub url: String,
}

/// The outcome of running a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    label: String,
    json: Value,
    error: Option<String>,
    images: Vec<Image>,
}

impl ToolResult {
    #[must_use]
    pub fn success(label: impl Into<String>, json: Value) -> Self {
        Self {
            label: label.into(),
            json,
            error: None,
            images: vec![],
        }
    }

    /// A successful result from a raw JSON document.
    ///
    /// Malformed JSON turns the result into an error.
    #[must_use]
    pub fn success_json(label: impl Into<String>, raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(json) => Self::success(label, json),
            Err(error) => Self::error(label, format!("tool produced invalid JSON: {error}")),
        }
    }

    /// A failed result. The payload becomes `{"error": "<message>"}`.
    #[must_use]
    pub fn error(label: impl Into<String>, error: impl fmt::Display) -> Self {
        let message = error.to_string();

        Self {
            label: label.into(),
            json: json!({ "error": message }),
            error: Some(message),
            images: vec![],
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn json(&self) -> &Value {
        &self.json
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    #[must_use]
    pub fn images(&self) -> &[Image] {
        &self.images
    }

    /// The content of the `tool` message answering the call.
    ///
    /// Never contains images, see [`ToolResult::image_content`].
    #[must_use]
    pub fn tool_content(&self) -> Content {
        match &self.json {
            Value::Null => Content::text(EMPTY_RESULT_TEXT),
            Value::String(text) if text.is_empty() => Content::text(EMPTY_RESULT_TEXT),
            Value::String(text) => Content::text(text.clone()),
            json => Content::new().with_item(Item::Json(json.clone())),
        }
    }

    /// The content of the auxiliary user message carrying this result's
    /// images, if it has any.
    #[must_use]
    pub fn image_content(&self) -> Option<Content> {
        if self.images.is_empty() {
            return None;
        }

        let names = self
            .images
            .iter()
            .map(|image| image.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let mut content = Content::text(format!(
            "Here is {names}. This is an automated message, not actually from the user."
        ));

        for image in &self.images {
            content.push(Item::ImageUrl(image.url.clone()));
        }

        Some(content)
    }
}

/// Builds a [`ToolResult`] carrying images.
#[derive(Debug, Clone)]
pub struct ResultBuilder {
    label: String,
    images: Vec<Image>,
}

impl ResultBuilder {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            images: vec![],
        }
    }

    #[must_use]
    pub fn image_url(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.images.push(Image {
            name: name.into(),
            url: url.into(),
        });

        self
    }

    /// Attach raw image bytes, encoded as a `data:` URI.
    pub fn image_bytes(self, name: impl Into<String>, bytes: &[u8]) -> Result<Self, ToolError> {
        let name = name.into();
        let Some(kind) = infer::get(bytes).filter(|k| k.matcher_type() == infer::MatcherType::Image)
        else {
            return Err(ToolError::Image {
                name,
                reason: "not a recognized image format".to_owned(),
            });
        };

        let url = format!("data:{};base64,{}", kind.mime_type(), STANDARD.encode(bytes));
        Ok(self.image_url(name, url))
    }

    pub fn image_file(self, name: impl Into<String>, path: &Path) -> Result<Self, ToolError> {
        let bytes = std::fs::read(path)?;
        self.image_bytes(name, &bytes)
    }

    #[must_use]
    pub fn success(self, json: Value) -> ToolResult {
        ToolResult {
            images: self.images,
            ..ToolResult::success(self.label, json)
        }
    }

    #[must_use]
    pub fn error(self, error: impl fmt::Display) -> ToolResult {
        ToolResult {
            images: self.images,
            ..ToolResult::error(self.label, error)
        }
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
