use pretty_assertions::assert_eq;
use serde_json::json;
use test_log::test;

use super::*;

#[test]
fn test_flat_schema() {
    let params = Parameters::new()
        .required("command", ParamType::String, "Shell command to run.")
        .optional("deadlineSeconds", ParamType::Integer, "");

    assert_eq!(
        params.to_json_schema(),
        json!({
            "type": "object",
            "properties": {
                "command": { "type": "string", "description": "Shell command to run." },
                "deadlineSeconds": { "type": "integer" },
            },
            "required": ["command"],
        })
    );
}

#[test]
fn test_nested_schema() {
    let point = Parameters::new()
        .required("x", ParamType::Number, "")
        .required("y", ParamType::Number, "");

    let params = Parameters::new()
        .required("points", ParamType::array_of(ParamType::Object(point)), "Polyline.")
        .optional("tags", ParamType::array_of(ParamType::String), "")
        .optional("closed", ParamType::Boolean, "");

    assert_eq!(
        params.to_json_schema(),
        json!({
            "type": "object",
            "properties": {
                "points": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "x": { "type": "number" },
                            "y": { "type": "number" },
                        },
                        "required": ["x", "y"],
                    },
                    "description": "Polyline.",
                },
                "tags": { "type": "array", "items": { "type": "string" } },
                "closed": { "type": "boolean" },
            },
            "required": ["points"],
        })
    );
}

#[test]
fn test_function_schema_serializes_parameters_as_schema() {
    let schema = FunctionSchema::new("get_time", "Current time.", NoParams::parameters());

    assert_eq!(
        serde_json::to_value(&schema).unwrap(),
        json!({
            "name": "get_time",
            "description": "Current time.",
            "parameters": { "type": "object", "properties": {}, "required": [] },
        })
    );
}
