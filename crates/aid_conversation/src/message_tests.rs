use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_log::test;

use super::*;
use crate::Item;

#[test]
fn test_tool_message_requires_id() {
    assert_eq!(Message::tool("", "done"), Err(Error::MissingToolCallId));
}

#[test]
fn test_tool_message_rejects_images() {
    let content = Content::text("shot").with_item(Item::ImageUrl("data:image/png;base64,".into()));

    assert_matches!(
        Message::tool("call_1", content),
        Err(Error::ToolMessageWithImages(id)) if id == "call_1"
    );
}

#[test]
fn test_wire_format() {
    let assistant = Message::assistant()
        .with_tool_call(ToolCall::new("call_1", "get_time").with_arguments("{}"));
    let tool = Message::tool("call_1", "12:00").unwrap();

    assert_eq!(
        serde_json::to_value([Message::user("hi"), assistant, tool]).unwrap(),
        json!([
            { "role": "user", "content": "hi" },
            {
                "role": "assistant",
                "content": [],
                "tool_calls": [{ "id": "call_1", "name": "get_time", "arguments": "{}" }],
            },
            { "role": "tool", "content": "12:00", "tool_call_id": "call_1" },
        ])
    );
}

#[test]
fn test_round_trip_with_name() {
    let message = Message::user("hello").with_name("operator");

    let wire = serde_json::to_string(&message).unwrap();
    let back: Message = serde_json::from_str(&wire).unwrap();

    assert_eq!(back, message);
}
