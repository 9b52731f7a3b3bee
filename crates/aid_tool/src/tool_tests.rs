use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;
use test_log::test;

use super::*;
use crate::{ParamType, Parameters};

#[derive(Debug, Deserialize)]
struct Echo {
    msg: String,
}

impl ToolParams for Echo {
    fn parameters() -> Parameters {
        Parameters::new().required("msg", ParamType::String, "What to echo.")
    }
}

fn echo() -> impl Tool {
    func("Echoing", "Echo a message back.", "echo", |runner: Runner, params: Echo| async move {
        runner.report("echoing");
        ToolResult::success("Echoing", json!({ "msg": params.msg }))
    })
}

#[test(tokio::test)]
async fn test_run_decodes_and_calls_handler() {
    let result = echo().run(&Runner::detached(), r#"{"msg":"hi"}"#).await;

    assert_eq!(result.error_message(), None);
    assert_eq!(result.json(), &json!({ "msg": "hi" }));
}

#[test(tokio::test)]
async fn test_run_reports_status() {
    let reports = Arc::new(Mutex::new(vec![]));
    let sink = reports.clone();
    let runner = Runner::new(Default::default(), move |status| {
        sink.lock().unwrap().push(status.to_owned());
    });

    echo().run(&runner, r#"{"msg":"hi"}"#).await;

    assert_eq!(*reports.lock().unwrap(), vec!["echoing".to_owned()]);
}

#[test(tokio::test)]
async fn test_invalid_arguments_become_error_result() {
    let tool = echo();

    let result = tool.run(&Runner::detached(), "{}").await;
    assert_eq!(result.label(), MISBEHAVED_LABEL);
    assert_eq!(result.error_message(), Some("missing required field: msg"));

    let result = tool.run(&Runner::detached(), "not json").await;
    assert_eq!(result.label(), MISBEHAVED_LABEL);
    assert!(result.error_message().unwrap().starts_with("invalid JSON"));
}

#[test]
fn test_schema_is_memoized() {
    let tool = echo();

    let first = tool.schema();
    assert!(std::ptr::eq(first, tool.schema()));
    assert_eq!(first.name, "echo");
    assert_eq!(first.parameters.to_json_schema()["required"], json!(["msg"]));
}
