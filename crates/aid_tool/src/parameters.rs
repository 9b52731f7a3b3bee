use indexmap::IndexMap;
use serde::{Serialize, Serializer, de::DeserializeOwned};
use serde_json::{Map, Value, json};

/// The type of a single tool parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array(Box<ParamType>),
    Object(Parameters),
}

impl ParamType {
    #[must_use]
    pub fn array_of(items: ParamType) -> Self {
        Self::Array(Box::new(items))
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    fn to_json_schema(&self, description: Option<&str>) -> Value {
        let mut schema = match self {
            Self::Array(items) => json!({
                "type": "array",
                "items": items.to_json_schema(None),
            }),
            Self::Object(parameters) => parameters.to_json_schema(),
            ty => json!({ "type": ty.name() }),
        };

        if let Some(description) = description.filter(|v| !v.is_empty()) {
            schema["description"] = description.into();
        }

        schema
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub ty: ParamType,
    pub required: bool,
    pub description: String,
}

/// The declared parameters of a tool, or of a nested object parameter.
///
/// Fields keep their declaration order. A field is required unless declared
/// with [`Parameters::optional`].
///
/// ```
/// use aid_tool::{ParamType, Parameters};
///
/// let params = Parameters::new()
///     .required("path", ParamType::String, "The directory to list.")
///     .optional("depth", ParamType::Integer, "How deep to recurse.");
///
/// assert_eq!(params.to_json_schema()["required"][0], "path");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters(IndexMap<String, Parameter>);

impl Parameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn required(self, name: &str, ty: ParamType, description: &str) -> Self {
        self.with(name, ty, true, description)
    }

    #[must_use]
    pub fn optional(self, name: &str, ty: ParamType, description: &str) -> Self {
        self.with(name, ty, false, description)
    }

    fn with(mut self, name: &str, ty: ParamType, required: bool, description: &str) -> Self {
        self.0.insert(name.to_owned(), Parameter {
            ty,
            required,
            description: description.to_owned(),
        });

        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.0.iter().map(|(name, param)| (name.as_str(), param))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.0.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The JSON schema object describing these parameters.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = vec![];

        for (name, param) in &self.0 {
            properties.insert(
                name.clone(),
                param.ty.to_json_schema(Some(&param.description)),
            );

            if param.required {
                required.push(Value::String(name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

impl Serialize for Parameters {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json_schema().serialize(serializer)
    }
}

/// The description of a tool as sent to the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: Parameters,
}

impl FunctionSchema {
    #[must_use]
    pub fn new(name: &str, description: &str, parameters: Parameters) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            parameters,
        }
    }
}

/// A type that tool arguments decode into.
///
/// The declared [`Parameters`] must describe the same shape as the
/// [`DeserializeOwned`] implementation, since arguments are validated against
/// the former and then decoded with the latter.
pub trait ToolParams: DeserializeOwned {
    fn parameters() -> Parameters;
}

/// Parameters of a tool that takes none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
pub struct NoParams {}

impl ToolParams for NoParams {
    fn parameters() -> Parameters {
        Parameters::new()
    }
}

#[cfg(test)]
#[path = "parameters_tests.rs"]
mod tests;
