use serde_json::{Map, Value};

use crate::{ParamType, Parameters, ValidationError};

/// Check raw JSON arguments against declared parameters.
///
/// Fields not declared in `parameters` are ignored. A `null` value counts as
/// absent.
pub fn validate(parameters: &Parameters, arguments: &str) -> Result<(), ValidationError> {
    let value: Value = if arguments.trim().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str(arguments)?
    };

    check_object(parameters, &value, "")
}

fn check_object(parameters: &Parameters, value: &Value, path: &str) -> Result<(), ValidationError> {
    let Value::Object(map) = value else {
        return Err(mismatch(path, "object", value));
    };

    for (name, param) in parameters.iter() {
        let field = join(path, name);

        match map.get(name) {
            None | Some(Value::Null) if param.required => {
                return Err(ValidationError::MissingField(field));
            }
            None | Some(Value::Null) => {}
            Some(value) => check(&param.ty, value, &field)?,
        }
    }

    Ok(())
}

fn check(ty: &ParamType, value: &Value, path: &str) -> Result<(), ValidationError> {
    let ok = match (ty, value) {
        (ParamType::String, Value::String(_))
        | (ParamType::Number, Value::Number(_))
        | (ParamType::Boolean, Value::Bool(_)) => true,
        (ParamType::Integer, Value::Number(n)) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|v| v.fract() == 0.0)
        }
        (ParamType::Array(items), Value::Array(values)) => {
            for (i, value) in values.iter().enumerate() {
                check(items, value, &format!("{path}[{i}]"))?;
            }

            true
        }
        (ParamType::Object(parameters), value) => return check_object(parameters, value, path),
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(mismatch(path, ty.name(), value))
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_owned()
    } else {
        format!("{path}.{name}")
    }
}

fn mismatch(path: &str, expected: &'static str, value: &Value) -> ValidationError {
    let actual = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };

    ValidationError::TypeMismatch {
        field: if path.is_empty() { "arguments".to_owned() } else { path.to_owned() },
        expected,
        actual,
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
