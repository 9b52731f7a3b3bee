use std::fmt;

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::{FunctionSchema, Runner, Tool, ToolError, ToolResult};

/// The tools available to one conversation, keyed by function name.
#[derive(Default)]
pub struct Toolbox {
    tools: IndexMap<String, Box<dyn Tool>>,
}

impl Toolbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Function names must be unique.
    pub fn add(&mut self, tool: impl Tool + 'static) -> Result<(), ToolError> {
        let name = tool.func_name().to_owned();
        if self.tools.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }

        // Derive the schema now rather than in the middle of a request.
        let _schema = tool.schema();

        self.tools.insert(name, Box::new(tool));
        Ok(())
    }

    #[must_use]
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        if let Err(error) = self.add(tool) {
            warn!(%error, "Ignoring tool.");
        }

        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// The schemas of all tools, in registration order.
    #[must_use]
    pub fn schemas(&self) -> Vec<&FunctionSchema> {
        self.tools.values().map(|tool| tool.schema()).collect()
    }

    /// Run the tool called `name`.
    ///
    /// An unknown name yields an error result.
    pub async fn run(&self, name: &str, runner: &Runner, arguments: &str) -> ToolResult {
        let Some(tool) = self.get(name) else {
            warn!(name, "Model requested an unknown tool.");
            return ToolResult::error(name, ToolError::NotFound(name.to_owned()));
        };

        info!(name, arguments, "Running tool.");
        let result = tool.run(runner, arguments).await;
        if let Some(error) = result.error_message() {
            info!(name, error, "Tool failed.");
        }

        result
    }
}

impl fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tools.keys()).finish()
    }
}

#[cfg(test)]
#[path = "toolbox_tests.rs"]
mod tests;
