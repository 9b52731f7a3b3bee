use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A single piece of message content.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// Plain text.
    Text(String),

    /// An image reference, either a remote URL or a `data:` URI.
    ImageUrl(String),

    /// A structured tool result.
    Json(Value),
}

/// The ordered payload of a message.
///
/// Appending text never produces two adjacent [`Item::Text`] entries, the
/// trailing text item is extended instead.
///
/// On the wire, content holding exactly one text item is a bare JSON string.
/// Anything else is an array of typed objects:
///
/// ```json
/// [
///   { "type": "text", "text": "Look at this:" },
///   { "type": "image_url", "image_url": { "url": "data:image/png;base64,..." } }
/// ]
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Content(Vec<Item>);

impl Content {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Content consisting of a single text item.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self(vec![Item::Text(text.into())])
    }

    /// Append text, extending the trailing text item if there is one.
    pub fn append(&mut self, text: &str) {
        if let Some(Item::Text(last)) = self.0.last_mut() {
            last.push_str(text);
            return;
        }

        self.0.push(Item::Text(text.to_owned()));
    }

    /// Push an item. Text items are merged the same way [`Content::append`]
    /// merges them.
    pub fn push(&mut self, item: Item) {
        match item {
            Item::Text(text) => self.append(&text),
            item => self.0.push(item),
        }
    }

    #[must_use]
    pub fn with_item(mut self, item: Item) -> Self {
        self.push(item);
        self
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All text items joined together.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.0
            .iter()
            .filter_map(|item| match item {
                Item::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The single text item, if that is all this content holds.
    #[must_use]
    pub fn as_single_text(&self) -> Option<&str> {
        match self.0.as_slice() {
            [Item::Text(text)] => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn has_images(&self) -> bool {
        self.0.iter().any(|item| matches!(item, Item::ImageUrl(_)))
    }

    pub fn image_urls(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|item| match item {
            Item::ImageUrl(url) => Some(url.as_str()),
            _ => None,
        })
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl FromIterator<Item> for Content {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        let mut content = Self::new();
        for item in iter {
            content.push(item);
        }

        content
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[derive(Serialize, Deserialize)]
struct ImageUrl<S> {
    url: S,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ItemRef<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<&'a str> },
    Json { json: &'a Value },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OwnedItem {
    Text { text: String },
    ImageUrl { image_url: ImageUrl<String> },
    Json { json: Value },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Helper {
    Text(String),
    Items(Vec<OwnedItem>),
}

impl Serialize for Content {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if let Some(text) = self.as_single_text() {
            return serializer.serialize_str(text);
        }

        serializer.collect_seq(self.0.iter().map(|item| match item {
            Item::Text(text) => ItemRef::Text { text },
            Item::ImageUrl(url) => ItemRef::ImageUrl {
                image_url: ImageUrl { url },
            },
            Item::Json(json) => ItemRef::Json { json },
        }))
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items = match Helper::deserialize(deserializer)? {
            Helper::Text(text) => return Ok(Self::text(text)),
            Helper::Items(items) => items,
        };

        // Items are taken verbatim so that whatever was serialized comes back
        // unchanged.
        Ok(Self(
            items
                .into_iter()
                .map(|item| match item {
                    OwnedItem::Text { text } => Item::Text(text),
                    OwnedItem::ImageUrl { image_url } => Item::ImageUrl(image_url.url),
                    OwnedItem::Json { json } => Item::Json(json),
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
#[path = "content_tests.rs"]
mod tests;
