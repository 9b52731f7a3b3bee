use std::fs;

use camino_tempfile::{Utf8TempDir, tempdir};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_log::test;

use super::*;

fn dir_with(content: &str) -> (Utf8TempDir, Utf8PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, content).unwrap();

    (dir, path)
}

async fn run(arguments: serde_json::Value) -> ToolResult {
    splice_file()
        .run(&Runner::detached(), &arguments.to_string())
        .await
}

fn backups(dir: &Utf8TempDir) -> Vec<String> {
    let mut names = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".bak"))
        .collect::<Vec<_>>();
    names.sort();
    names
}

#[test(tokio::test)]
async fn test_replace_lines() {
    let (dir, path) = dir_with("a\nb\nc\nd\n");

    let result = run(json!({
        "path": path.as_str(),
        "start": 1,
        "deleteCount": 2,
        "insertLines": ["x", "y"],
    }))
    .await;

    assert_eq!(result.error_message(), None);
    assert_eq!(result.label(), format!("Replaced 2 lines in \"{path}\""));
    assert_eq!(result.json(), &json!("File updated."));
    assert_eq!(fs::read_to_string(&path).unwrap(), "a\nx\ny\nd\n");

    let backups = backups(&dir);
    assert_eq!(backups.len(), 1);
    assert!(backups[0].starts_with("notes.txt."), "{backups:?}");
    assert_eq!(
        fs::read_to_string(dir.path().join(&backups[0])).unwrap(),
        "a\nb\nc\nd\n"
    );
}

#[test(tokio::test)]
async fn test_replace_with_more_lines() {
    let (_dir, path) = dir_with("a\nb\nc");

    let result = run(json!({
        "path": path.as_str(),
        "start": 2,
        "deleteCount": 1,
        "insertLines": ["c1", "c2"],
    }))
    .await;

    assert_eq!(result.label(), format!("Replaced 1 line with 2 lines in \"{path}\""));
    assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\nc1\nc2\n");
}

#[test(tokio::test)]
async fn test_delete_only() {
    let (_dir, path) = dir_with("keep\ndrop\nkeep too\n");

    let result = run(json!({ "path": path.as_str(), "start": 1, "deleteCount": 1 })).await;

    assert_eq!(result.label(), format!("Deleted 1 line from \"{path}\""));
    assert_eq!(fs::read_to_string(&path).unwrap(), "keep\nkeep too\n");
}

#[test(tokio::test)]
async fn test_append_after_last_line() {
    let (_dir, path) = dir_with("a\nb");

    let result = run(json!({ "path": path.as_str(), "start": 2, "insertLines": ["c"] })).await;

    assert_eq!(result.label(), format!("Added 1 line to \"{path}\""));
    assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\nc\n");
}

#[test(tokio::test)]
async fn test_missing_file_is_created() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("new.txt");

    let result = run(json!({
        "path": path.as_str(),
        "start": 0,
        "insertLines": ["hello", "world"],
    }))
    .await;

    assert_eq!(result.error_message(), None);
    assert_eq!(result.label(), format!("Added 2 lines to \"{path}\""));
    assert_eq!(fs::read_to_string(&path).unwrap(), "hello\nworld\n");
    assert_eq!(backups(&dir), Vec::<String>::new());
}

#[test(tokio::test)]
async fn test_start_past_end() {
    let (dir, path) = dir_with("only\n");

    let result = run(json!({ "path": path.as_str(), "start": 3, "insertLines": ["x"] })).await;

    assert_eq!(result.label(), path.as_str());
    assert_eq!(result.error_message(), Some("file has less than 4 lines"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "only\n");
    assert_eq!(backups(&dir), Vec::<String>::new());
}

#[test(tokio::test)]
async fn test_negative_start() {
    let (_dir, path) = dir_with("a\n");

    let result = run(json!({ "path": path.as_str(), "start": -1, "deleteCount": 1 })).await;

    assert_eq!(result.error_message(), Some("invalid start index -1"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "a\n");
}

#[test]
fn test_describe() {
    assert_eq!(describe("f", 0, 0), r#"Updated "f""#);
    assert_eq!(describe("f", 3, 3), r#"Replaced 3 lines in "f""#);
    assert_eq!(describe("f", 2, 0), r#"Deleted 2 lines from "f""#);
}
