use std::{fmt, marker::PhantomData, sync::OnceLock};

use async_trait::async_trait;
use tracing::debug;

use crate::{FunctionSchema, Runner, ToolError, ToolParams, ToolResult, validate};

/// Label of results produced when the model sent arguments that do not fit
/// the tool.
pub const MISBEHAVED_LABEL: &str = "LLM misbehaved";

#[async_trait]
pub trait Tool: Send + Sync {
    /// Human-readable description of what the tool is doing, e.g. "Listing
    /// files".
    fn label(&self) -> &str;

    fn description(&self) -> &str;

    /// The unique name the model calls this tool by.
    fn func_name(&self) -> &str;

    fn schema(&self) -> &FunctionSchema;

    /// Run the tool with raw JSON arguments.
    ///
    /// Failures are reported through the returned [`ToolResult`].
    async fn run(&self, runner: &Runner, arguments: &str) -> ToolResult;
}

/// A [`Tool`] backed by an async function taking decoded parameters.
pub struct FuncTool<P, F> {
    label: String,
    description: String,
    name: String,
    schema: OnceLock<FunctionSchema>,
    handler: F,
    params: PhantomData<fn() -> P>,
}

/// Create a tool from an async handler.
///
/// The parameter schema is derived from `P` the first time it is needed and
/// reused afterwards.
pub fn func<P, F, Fut>(label: &str, description: &str, name: &str, handler: F) -> FuncTool<P, F>
where
    P: ToolParams + Send + 'static,
    F: Fn(Runner, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolResult> + Send + 'static,
{
    FuncTool {
        label: label.to_owned(),
        description: description.to_owned(),
        name: name.to_owned(),
        schema: OnceLock::new(),
        handler,
        params: PhantomData,
    }
}

#[async_trait]
impl<P, F, Fut> Tool for FuncTool<P, F>
where
    P: ToolParams + Send + 'static,
    F: Fn(Runner, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolResult> + Send + 'static,
{
    fn label(&self) -> &str {
        &self.label
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn func_name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &FunctionSchema {
        self.schema
            .get_or_init(|| FunctionSchema::new(&self.name, &self.description, P::parameters()))
    }

    async fn run(&self, runner: &Runner, arguments: &str) -> ToolResult {
        let arguments = if arguments.trim().is_empty() { "{}" } else { arguments };

        if let Err(error) = validate(&self.schema().parameters, arguments) {
            debug!(tool = %self.name, %error, "Arguments failed validation.");
            return ToolResult::error(MISBEHAVED_LABEL, ToolError::Validation(error));
        }

        let params = match serde_json::from_str::<P>(arguments) {
            Ok(params) => params,
            Err(error) => {
                debug!(tool = %self.name, %error, "Arguments failed to decode.");
                return ToolResult::error(MISBEHAVED_LABEL, ToolError::Arguments(error));
            }
        };

        (self.handler)(runner.clone(), params).await
    }
}

impl<P, F> fmt::Debug for FuncTool<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncTool")
            .field("name", &self.name)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "tool_tests.rs"]
mod tests;
