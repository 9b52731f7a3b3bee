use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_log::test;

use super::*;
use crate::{NoParams, func};

fn clock() -> impl Tool {
    func("Checking the time", "Current time.", "get_time", |_: Runner, _: NoParams| async {
        ToolResult::success("Checking the time", json!("12:00"))
    })
}

fn calendar() -> impl Tool {
    func("Checking the date", "Current date.", "get_date", |_: Runner, _: NoParams| async {
        ToolResult::success("Checking the date", json!("2024-01-01"))
    })
}

#[test]
fn test_duplicate_names_are_rejected() {
    let mut toolbox = Toolbox::new();
    toolbox.add(clock()).unwrap();

    assert_matches!(toolbox.add(clock()), Err(ToolError::Duplicate(name)) if name == "get_time");
    assert_eq!(toolbox.len(), 1);
}

#[test]
fn test_schemas_in_registration_order() {
    let toolbox = Toolbox::new().with(clock()).with(calendar());

    let names = toolbox
        .schemas()
        .into_iter()
        .map(|schema| schema.name.as_str())
        .collect::<Vec<_>>();

    assert_eq!(names, vec!["get_time", "get_date"]);
}

#[test(tokio::test)]
async fn test_run_dispatches_by_name() {
    let toolbox = Toolbox::new().with(clock()).with(calendar());

    let result = toolbox.run("get_date", &Runner::detached(), "{}").await;

    assert_eq!(result.json(), &json!("2024-01-01"));
}

#[test(tokio::test)]
async fn test_unknown_tool_is_an_error_result() {
    let toolbox = Toolbox::new().with(clock());

    let result = toolbox.run("launch_rockets", &Runner::detached(), "{}").await;

    assert_eq!(result.label(), "launch_rockets");
    assert_eq!(result.error_message(), Some("tool not found: launch_rockets"));
}

#[test(tokio::test)]
async fn test_empty_arguments_for_parameterless_tool() {
    let toolbox = Toolbox::new().with(clock());

    let result = toolbox.run("get_time", &Runner::detached(), "").await;

    assert!(!result.is_error());
}
