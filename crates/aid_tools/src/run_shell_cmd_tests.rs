use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use pretty_assertions::assert_eq;
use test_log::test;
use tokio_util::sync::CancellationToken;

use super::*;

async fn run(runner: &Runner, arguments: serde_json::Value) -> ToolResult {
    run_shell_cmd(DEFAULT_DEADLINE)
        .run(runner, &arguments.to_string())
        .await
}

#[test(tokio::test)]
async fn test_short_output_is_inline() {
    let reports = Arc::new(Mutex::new(vec![]));
    let sink = Arc::clone(&reports);
    let runner = Runner::new(CancellationToken::new(), move |status: &str| {
        sink.lock().unwrap().push(status.to_owned());
    });

    let result = run(&runner, json!({ "command": "echo out; echo err >&2" })).await;

    assert_eq!(result.label(), "echo out; echo err >&2");
    assert_eq!(result.json(), &json!({ "outputType": "text", "output": "out\nerr\n" }));
    assert_eq!(*reports.lock().unwrap(), vec![
        "Running shell command `echo out; echo err >&2`".to_owned()
    ]);
}

#[test(tokio::test)]
async fn test_failure_includes_status_and_output() {
    let result = run(&Runner::detached(), json!({ "command": "echo nope; exit 3" })).await;

    assert_eq!(result.error_message(), Some("exit status: 3: nope\n"));
}

#[test(tokio::test)]
async fn test_long_output_goes_to_file() {
    let result = run(&Runner::detached(), json!({ "command": "seq 1 1000" })).await;
    let json = result.json();

    assert_eq!(json["outputType"], "file");
    assert_eq!(json["firstLine"], "`1` (+999 lines)");

    let path = json["filePath"].as_str().unwrap();
    let saved = std::fs::read_to_string(path).unwrap();
    std::fs::remove_file(path).unwrap();

    assert_eq!(json["fileSize"], saved.len());
    assert!(saved.ends_with("999\n1000\n"));
}

#[test(tokio::test)]
async fn test_deadline_kills_command() {
    let start = Instant::now();
    let result = run(&Runner::detached(), json!({ "command": "sleep 10", "deadlineSeconds": 1 })).await;

    assert_eq!(result.error_message(), Some("killed after the 1s deadline"));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test(tokio::test)]
async fn test_configured_default_deadline() {
    let tool = run_shell_cmd(Duration::from_secs(1));
    let result = tool
        .run(&Runner::detached(), r#"{"command":"sleep 10"}"#)
        .await;

    assert_eq!(result.error_message(), Some("killed after the 1s deadline"));
}

#[test(tokio::test)]
async fn test_non_positive_deadline_uses_default() {
    let tool = run_shell_cmd(Duration::from_secs(1));

    for deadline in [0, -5] {
        let arguments = json!({ "command": "sleep 10", "deadlineSeconds": deadline });
        let result = tool.run(&Runner::detached(), &arguments.to_string()).await;

        assert_eq!(result.error_message(), Some("killed after the 1s deadline"));
    }
}

#[test(tokio::test)]
async fn test_cancellation_kills_command() {
    let cancel = CancellationToken::new();
    let runner = Runner::new(cancel.clone(), |_| {});

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let start = Instant::now();
    let result = run(&runner, json!({ "command": "sleep 10" })).await;
    canceller.await.unwrap();

    assert_eq!(result.error_message(), Some("cancelled"));
    assert!(start.elapsed() < Duration::from_secs(5));
}
