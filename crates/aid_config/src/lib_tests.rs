use std::fs;

use assert_matches::assert_matches;
use camino_tempfile::tempdir;
use indoc::indoc;
use pretty_assertions::assert_eq;
use test_log::test;

use super::*;

#[test]
fn test_load_file() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(&path, indoc! {r#"
        provider = "openai"
        model = "gpt-4o-mini"
        update_capacity = 8
        debug_snapshot = "/tmp/aid.yaml"

        [openai]
        api_key_env = "MY_OPENAI_KEY"
        base_url = "http://localhost:8080"

        [anthropic.sampling]
        temperature = 0.2
    "#})
    .unwrap();

    let config = load(Some(path.as_path())).unwrap();

    assert_eq!(config.provider, ProviderKind::Openai);
    assert_eq!(config.model(), "gpt-4o-mini");
    assert_eq!(config.update_capacity, 8);
    assert_eq!(config.debug_snapshot.as_deref(), Some("/tmp/aid.yaml"));
    assert_eq!(config.api_key_env(), "MY_OPENAI_KEY");
    assert_eq!(config.openai.base_url, "http://localhost:8080");
    assert_eq!(config.anthropic.sampling.temperature, Some(0.2));
    assert_eq!(config.anthropic.sampling.max_output_tokens, None);
    assert_eq!(config.shell_deadline_secs, 30);
}

#[test]
fn test_defaults() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(&path, "provider = \"google\"\n").unwrap();

    let config = load(Some(path.as_path())).unwrap();

    assert_eq!(config.model(), "gemini-1.5-pro-001");
    assert_eq!(config.api_key_env(), "GOOGLE_API_KEY");
    assert_eq!(config.google.base_url, "https://generativelanguage.googleapis.com");
    assert!(!config.google.bearer);
    assert_eq!(config.update_capacity, 1);
    assert_eq!(config.debug_snapshot, None);
}

#[test]
fn test_explicit_path_must_exist() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("missing.toml");

    assert_matches!(load(Some(path.as_path())), Err(Error::Schematic(_)));
}

#[test]
fn test_unknown_provider_is_rejected() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(&path, "provider = \"skynet\"\n").unwrap();

    assert_matches!(load(Some(path.as_path())), Err(Error::Schematic(_)));
}

#[test]
fn test_missing_api_key() {
    let result = api_key("AID_TEST_KEY_THAT_IS_NEVER_SET");

    assert_matches!(result, Err(Error::MissingApiKey { name, .. }) if name == "AID_TEST_KEY_THAT_IS_NEVER_SET");
}

#[test]
fn test_load_nested_provider_tables() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("config.toml");
    fs::write(&path, indoc! {r#"
        provider = "google"

        [google]
        base_url = "https://europe-west4-aiplatform.googleapis.com"
        bearer = true

        [google.sampling]
        max_output_tokens = 1024
        top_p = 0.5

        [anthropic]
        api_key_env = "CLAUDE_KEY"
    "#})
    .unwrap();

    let config = load(Some(path.as_path())).unwrap();

    assert_eq!(config.google.base_url, "https://europe-west4-aiplatform.googleapis.com");
    assert!(config.google.bearer);
    assert_eq!(config.google.api_key_env, "GOOGLE_API_KEY");
    assert_eq!(config.google.sampling.max_output_tokens, Some(1024));
    assert_eq!(config.google.sampling.temperature, None);
    assert_eq!(config.google.sampling.top_p, Some(0.5));
    assert_eq!(config.anthropic.api_key_env, "CLAUDE_KEY");
    assert_eq!(config.anthropic.base_url, "https://api.anthropic.com");
    assert_eq!(config.openai.api_key_env, "OPENAI_API_KEY");
}
