use pretty_assertions::assert_eq;
use test_log::test;

use super::*;

#[test]
fn test_error_message_from_json_body() {
    let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
    assert_eq!(error_message(body), "Incorrect API key provided");

    let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
    assert_eq!(error_message(body), "Overloaded");

    assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
}

#[test]
fn test_redact_url_hides_api_key() {
    let url = Url::parse("https://example.com/v1beta/models/m:streamGenerateContent?alt=sse&key=secret")
        .unwrap();

    let redacted = redact_url(&url).to_string();

    assert!(!redacted.contains("secret"));
    assert!(redacted.contains("alt=sse"));
}

#[test]
fn test_endpoint_joins_paths() {
    assert_eq!(
        endpoint("https://api.openai.com", "/v1/chat/completions").unwrap().as_str(),
        "https://api.openai.com/v1/chat/completions"
    );
    assert_eq!(
        endpoint("http://localhost:8080/proxy/", "/v1/messages").unwrap().as_str(),
        "http://localhost:8080/proxy/v1/messages"
    );
    assert!(endpoint("not a url", "/x").is_err());
}

#[test]
fn test_parse_data_uri() {
    assert_eq!(
        parse_data_uri("data:image/png;base64,iVBOR"),
        Some(("image/png", "iVBOR"))
    );
    assert_eq!(parse_data_uri("https://example.com/a.png"), None);
}

#[test]
fn test_image_media_type() {
    assert_eq!(image_media_type("https://x/a.PNG?size=2"), "image/png");
    assert_eq!(image_media_type("https://x/a.webp"), "image/webp");
    assert_eq!(image_media_type("https://x/photo"), "image/jpeg");
}

#[test]
fn test_pricing() {
    let table = [
        ("gpt-4o-mini", Pricing::new(0.15, 0.60)),
        ("gpt-4o", Pricing::new(5.0, 15.0)),
    ];

    assert_eq!(Pricing::lookup(&table, "gpt-4o-mini-2024-07-18"), table[0].1);
    assert_eq!(Pricing::lookup(&table, "gpt-4o"), table[1].1);
    assert_eq!(Pricing::lookup(&table, "o9-preview"), Pricing::FREE);

    let cost = Pricing::new(5.0, 15.0).cost(Usage::new(1_000_000, 100_000));
    assert!((cost - 6.5).abs() < 1e-9);
}
