use pretty_assertions::assert_eq;
use serde_json::json;
use test_log::test;

use super::*;

#[test]
fn test_append_extends_trailing_text() {
    let mut content = Content::new();
    content.append("Hello");
    content.append(", ");
    content.append("world");

    assert_eq!(content.items(), &[Item::Text("Hello, world".to_owned())]);
}

#[test]
fn test_append_after_image_starts_new_text() {
    let mut content = Content::text("before");
    content.push(Item::ImageUrl("https://example.com/a.png".to_owned()));
    content.append("after");
    content.append("!");

    assert_eq!(content.items(), &[
        Item::Text("before".to_owned()),
        Item::ImageUrl("https://example.com/a.png".to_owned()),
        Item::Text("after!".to_owned()),
    ]);
}

#[test]
fn test_push_text_merges() {
    let content: Content = [Item::Text("a".into()), Item::Text("b".into())]
        .into_iter()
        .collect();

    assert_eq!(content, Content::text("ab"));
}

#[test]
fn test_single_text_is_bare_string() {
    let content = Content::text("just words");

    let wire = serde_json::to_value(&content).unwrap();
    assert_eq!(wire, json!("just words"));

    let back: Content = serde_json::from_value(wire).unwrap();
    assert_eq!(back, content);
}

#[test]
fn test_bare_string_deserializes_to_single_text() {
    let content: Content = serde_json::from_str(r#""hi""#).unwrap();

    assert_eq!(content.items(), &[Item::Text("hi".to_owned())]);
}

#[test]
fn test_mixed_content_is_array() {
    let content = Content::text("See:")
        .with_item(Item::ImageUrl("data:image/png;base64,AAAA".to_owned()))
        .with_item(Item::Json(json!({ "ok": true, "n": 3 })));

    let wire = serde_json::to_value(&content).unwrap();
    assert_eq!(
        wire,
        json!([
            { "type": "text", "text": "See:" },
            { "type": "image_url", "image_url": { "url": "data:image/png;base64,AAAA" } },
            { "type": "json", "json": { "ok": true, "n": 3 } },
        ])
    );

    let back: Content = serde_json::from_value(wire).unwrap();
    assert_eq!(back, content);
}

#[test]
fn test_lone_image_is_array() {
    let content = Content::new().with_item(Item::ImageUrl("https://x/y.jpg".into()));

    let wire = serde_json::to_string(&content).unwrap();
    assert_eq!(
        wire,
        r#"[{"type":"image_url","image_url":{"url":"https://x/y.jpg"}}]"#
    );
    assert_eq!(serde_json::from_str::<Content>(&wire).unwrap(), content);
}

#[test]
fn test_empty_content_is_empty_array() {
    let wire = serde_json::to_string(&Content::new()).unwrap();
    assert_eq!(wire, "[]");

    let back: Content = serde_json::from_str(&wire).unwrap();
    assert!(back.is_empty());
}

#[test]
fn test_unknown_item_type_is_rejected() {
    let result = serde_json::from_str::<Content>(r#"[{"type":"audio","audio":"x"}]"#);

    assert!(result.is_err());
}

#[test]
fn test_to_text_skips_non_text() {
    let content = Content::text("a")
        .with_item(Item::ImageUrl("u".into()))
        .with_item(Item::Text("b".into()));

    assert_eq!(content.to_text(), "ab");
    assert!(content.has_images());
    assert_eq!(content.image_urls().collect::<Vec<_>>(), vec!["u"]);
    assert_eq!(content.as_single_text(), None);
}
